//! Batched, checkpointed loader

use tracing::{error, info, info_span, warn};

use super::batch::{BatchRange, BatchResult, DdlOutcome, LoadReport};
use super::ddl::{ColumnTypeMapper, create_table_sql, insert_sql};
use super::error::LoadError;
use super::progress::ProgressNotes;
use super::{DdlPolicy, LoadOptions};
use crate::checkpoint::CheckpointLog;
use crate::database::{DatabaseResult, Dialect, TargetDatabase};
use crate::models::{Schema, Table, Value};

static MISSING: Value = Value::Null;

/// Checkpoint step for a committed batch
pub const STEP_LOAD: &str = "load";
/// Checkpoint step written when a batch fails
pub const STEP_LOAD_FAILED: &str = "load-failed";

type BatchCallback<'a> = Box<dyn FnMut(&BatchRange, usize) + 'a>;

/// Loads a cleansed table into a target database
pub struct Loader<'a> {
    db: &'a mut dyn TargetDatabase,
    options: LoadOptions,
    on_batch: Option<BatchCallback<'a>>,
}

impl<'a> Loader<'a> {
    pub fn new(db: &'a mut dyn TargetDatabase, options: LoadOptions) -> Self {
        Self {
            db,
            options,
            on_batch: None,
        }
    }

    /// Call `f` with the batch range and running row total after each commit
    pub fn with_progress(mut self, f: impl FnMut(&BatchRange, usize) + 'a) -> Self {
        self.on_batch = Some(Box::new(f));
        self
    }

    fn dialect(&self) -> Dialect {
        self.options.dialect.unwrap_or_else(|| self.db.dialect())
    }

    /// Create the target table if it does not exist, per the DDL policy
    pub fn materialize_schema(&mut self, schema: &Schema) -> Result<DdlOutcome, LoadError> {
        let dialect = self.dialect();
        let mapper = self
            .options
            .column_types
            .iter()
            .fold(ColumnTypeMapper::new(dialect), |mapper, (data_type, sql_type)| {
                mapper.with_override(data_type.clone(), sql_type)
            });
        let sql = create_table_sql(schema, dialect, &mapper);

        match self.db.execute(&sql) {
            Ok(()) => {
                info!(table = %schema.target_table_name, "Target table ready");
                Ok(DdlOutcome::Applied)
            }
            Err(e) => match self.options.ddl_policy {
                DdlPolicy::Tolerate => {
                    warn!(
                        table = %schema.target_table_name,
                        error = %e,
                        "Create table failed, continuing"
                    );
                    Ok(DdlOutcome::Ignored(e.to_string()))
                }
                DdlPolicy::Strict => {
                    error!(table = %schema.target_table_name, error = %e, "Create table failed");
                    Err(LoadError::Ddl {
                        table: schema.target_table_name.clone(),
                        source: e,
                    })
                }
            },
        }
    }

    /// Load every row of `table` in batches
    ///
    /// Returns a report whose last batch is `Failed` when an insert failed;
    /// in that case the checkpoint log and progress notes stay on disk. On
    /// full success both are removed.
    pub fn run(
        &mut self,
        table: &Table,
        schema: &Schema,
        mut checkpoints: CheckpointLog,
    ) -> Result<LoadReport, LoadError> {
        let _span = info_span!("load", table = %schema.target_table_name).entered();

        let ddl = self.materialize_schema(schema)?;
        let sql = insert_sql(schema, self.dialect());
        let columns: Vec<Option<usize>> = schema
            .fields
            .iter()
            .map(|f| table.column_index(&f.source_field_name))
            .collect();

        let mut notes = ProgressNotes::open(&self.options.work_dir)?;
        let mut report = LoadReport::new(&schema.target_table_name, ddl);
        let batch_size = self.options.batch_size.max(1);

        for (i, chunk) in table.rows().chunks(batch_size).enumerate() {
            let (Some(first), Some(last)) = (chunk.first(), chunk.last()) else {
                continue;
            };
            let range = BatchRange {
                number: i + 1,
                start_index: first.index,
                end_index: last.index,
                rows: chunk.len(),
            };

            let tuples: Vec<Vec<&Value>> = chunk
                .iter()
                .map(|row| {
                    columns
                        .iter()
                        .map(|c| c.and_then(|col| row.values.get(col)).unwrap_or(&MISSING))
                        .collect()
                })
                .collect();

            if let Err(e) = self.flush(&sql, &tuples) {
                if let Err(rollback_err) = self.db.rollback() {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                error!(
                    batch = range.number,
                    anchor = range.start_index,
                    error = %e,
                    "Batch insert failed"
                );
                if let Err(ckpt_err) = checkpoints.record(
                    STEP_LOAD_FAILED,
                    &schema.target_table_name,
                    range.start_index as i64,
                    range.end_index as i64,
                ) {
                    error!(
                        anchor = range.start_index,
                        error = %ckpt_err,
                        "Failed to record failed batch in checkpoint log"
                    );
                }
                report.batches.push(BatchResult::Failed {
                    range,
                    cause: e.to_string(),
                });
                return Ok(report);
            }

            report.rows_inserted += range.rows;
            notes.note(range.rows)?;
            checkpoints.record(
                STEP_LOAD,
                &schema.target_table_name,
                range.start_index as i64,
                range.end_index as i64,
            )?;
            info!(
                batch = range.number,
                start = range.start_index,
                end = range.end_index,
                total = report.rows_inserted,
                "Batch committed"
            );

            if let Some(callback) = self.on_batch.as_mut() {
                callback(&range, report.rows_inserted);
            }
            report.batches.push(BatchResult::Committed(range));
        }

        notes.finish()?;
        checkpoints.clear()?;
        info!(
            rows = report.rows_inserted,
            batches = report.batches.len(),
            "Load complete"
        );
        Ok(report)
    }

    fn flush(&mut self, sql: &str, tuples: &[Vec<&Value>]) -> DatabaseResult<()> {
        self.db.begin()?;
        self.db.execute_many(sql, tuples)?;
        self.db.commit()
    }
}

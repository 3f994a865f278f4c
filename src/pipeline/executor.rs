//! Pipeline executor for running extract, validate, cleanse and load

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use super::config::PipelineConfig;
use super::error::{PipelineError, PipelineResult};
use crate::checkpoint::CheckpointLog;
use crate::cleanse::cleanse;
use crate::config::{load_connection, load_schema};
use crate::database::{self, TargetDatabase};
use crate::extract::extract_csv;
use crate::load::{BatchRange, LoadReport, Loader};
use crate::models::{Schema, Table};
use crate::validation::{RowErrorReport, ValidationSummary, validate_rows};

type ProgressCallback = Box<dyn FnMut(&BatchRange, usize, usize)>;

/// Runs one load from descriptors and source file
pub struct PipelineExecutor {
    config: PipelineConfig,
    run_id: Uuid,
    on_batch: Option<ProgressCallback>,
}

/// Table ready to load plus what validation found
struct Prepared {
    schema: Schema,
    table: Table,
    rows_extracted: usize,
    summary: ValidationSummary,
    rejected: Vec<RowErrorReport>,
    checkpoints: CheckpointLog,
}

impl PipelineExecutor {
    /// Create a new pipeline executor
    pub fn new(config: PipelineConfig) -> PipelineResult<Self> {
        config.validate().map_err(PipelineError::Options)?;
        Ok(Self {
            config,
            run_id: Uuid::new_v4(),
            on_batch: None,
        })
    }

    /// Report each committed batch as `(range, rows inserted, rows to load)`
    pub fn with_progress(mut self, f: impl FnMut(&BatchRange, usize, usize) + 'static) -> Self {
        self.on_batch = Some(Box::new(f));
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Run the pipeline, connecting with the connection descriptor
    pub fn run(&mut self) -> PipelineResult<PipelineReport> {
        let _span = info_span!("pipeline_run", run_id = %self.run_id).entered();
        let start = Instant::now();

        let schema = load_schema(&self.config.schema_path)?;
        let params = load_connection(&self.config.connection_path)?;
        let prepared = self.prepare(schema)?;

        let mut db = database::connect(&params)?;
        info!(dialect = %db.dialect(), "Connected to target database");
        self.load(prepared, db.as_mut(), start)
    }

    /// Run the pipeline against an already open database
    ///
    /// The connection descriptor is not read.
    pub fn run_with_database(
        &mut self,
        db: &mut dyn TargetDatabase,
    ) -> PipelineResult<PipelineReport> {
        let _span = info_span!("pipeline_run", run_id = %self.run_id).entered();
        let start = Instant::now();

        let schema = load_schema(&self.config.schema_path)?;
        let prepared = self.prepare(schema)?;
        self.load(prepared, db, start)
    }

    fn prepare(&self, schema: Schema) -> PipelineResult<Prepared> {
        info!(
            run_id = %self.run_id,
            data = %self.config.data_path.display(),
            table = %schema.target_table_name,
            "Starting pipeline"
        );
        let checkpoints = self.open_checkpoints()?;

        let table = extract_csv(&self.config.data_path, &schema)?;
        let rows_extracted = table.len();

        let rejected: Vec<RowErrorReport> = validate_rows(&table, &schema).collect();
        for report in &rejected {
            let errors: Vec<String> = report.errors.iter().map(|e| e.to_string()).collect();
            warn!(
                index = report.index,
                row = %report.row,
                errors = %errors.join("; "),
                "Row rejected"
            );
        }
        let summary = ValidationSummary::from_reports(rows_extracted, &rejected);
        info!(
            rows = summary.rows_checked,
            invalid = summary.rows_invalid,
            "Validation complete"
        );

        let table = cleanse(table, rejected.iter().cloned(), &schema)?;

        Ok(Prepared {
            schema,
            table,
            rows_extracted,
            summary,
            rejected,
            checkpoints,
        })
    }

    fn load(
        &mut self,
        prepared: Prepared,
        db: &mut dyn TargetDatabase,
        start: Instant,
    ) -> PipelineResult<PipelineReport> {
        let total = prepared.table.len();
        let on_batch = &mut self.on_batch;
        let mut loader = Loader::new(db, self.config.load.clone()).with_progress(
            move |range: &BatchRange, inserted: usize| {
                if let Some(f) = on_batch.as_mut() {
                    f(range, inserted, total);
                }
            },
        );

        let load = loader
            .run(&prepared.table, &prepared.schema, prepared.checkpoints)?
            .into_result()?;

        let duration = start.elapsed();
        info!(
            run_id = %self.run_id,
            rows = load.rows_inserted,
            duration_ms = duration.as_millis() as u64,
            "Pipeline completed"
        );

        Ok(PipelineReport {
            run_id: self.run_id.to_string(),
            table: prepared.schema.target_table_name,
            rows_extracted: prepared.rows_extracted,
            validation: prepared.summary,
            rejected: prepared.rejected,
            load,
            duration_ms: duration.as_millis() as u64,
        })
    }

    /// Open (or reopen) the checkpoint log, reporting what a previous run left
    fn open_checkpoints(&self) -> PipelineResult<CheckpointLog> {
        let mut log = CheckpointLog::open(self.config.work_dir(), &self.config.process)?;
        match log.last_record() {
            Ok(Some(record)) => warn!(
                process = %record.process,
                step = %record.step,
                payload = %record.payload,
                startpoint = record.startpoint,
                endpoint = record.endpoint,
                "Previous run left a checkpoint; loading from the start"
            ),
            Ok(None) => debug!(path = %log.path().display(), "Checkpoint log opened"),
            Err(e) => warn!(error = %e, "Could not read previous checkpoint"),
        }
        Ok(log)
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub run_id: String,
    pub table: String,
    pub rows_extracted: usize,
    pub validation: ValidationSummary,
    pub rejected: Vec<RowErrorReport>,
    pub load: LoadReport,
    pub duration_ms: u64,
}

impl PipelineReport {
    /// Check if every batch committed
    pub fn is_success(&self) -> bool {
        self.load.is_success()
    }

    /// Get formatted duration
    pub fn duration_formatted(&self) -> String {
        let secs = self.duration_ms / 1000;
        let mins = secs / 60;
        let remaining_secs = secs % 60;

        if mins > 0 {
            format!("{}m {}s", mins, remaining_secs)
        } else if secs > 0 {
            format!("{}s", secs)
        } else {
            format!("{}ms", self.duration_ms)
        }
    }

    /// Print summary to stderr
    pub fn print_summary(&self) {
        eprintln!();
        eprintln!("Run {} - {}", self.run_id, self.table);
        eprintln!("Duration: {}", self.duration_formatted());
        eprintln!("Rows read: {}", self.rows_extracted);
        eprintln!("Rows rejected: {}", self.validation.rows_invalid);
        eprintln!(
            "Rows inserted: {} in {} batch(es)",
            self.load.rows_inserted,
            self.load.committed_batches()
        );
    }
}

//! Integration tests for batched loading against a recording database
//!
//! Exercises batch boundaries, checkpoint/progress artifacts and failure
//! handling without a real database.

use std::collections::HashSet;

use tempfile::TempDir;

use tabload::checkpoint::{CHECKPOINT_FILE_NAME, CheckpointLog};
use tabload::database::{DatabaseError, DatabaseResult, Dialect, TargetDatabase};
use tabload::load::{
    BatchResult, DdlOutcome, DdlPolicy, LoadError, LoadOptions, Loader, PROGRESS_FILE_NAME,
};
use tabload::models::{DataType, FieldSpec, Schema, Table, Value};

/// Records every call; fails `execute_many` on a chosen call
#[derive(Default)]
struct RecordingDatabase {
    statements: Vec<String>,
    committed: Vec<Vec<i64>>,
    pending: Vec<i64>,
    insert_calls: usize,
    fail_on_insert: Option<usize>,
    fail_ddl: bool,
    rollbacks: usize,
}

impl RecordingDatabase {
    fn failing_on(insert_call: usize) -> Self {
        Self {
            fail_on_insert: Some(insert_call),
            ..Default::default()
        }
    }
}

impl TargetDatabase for RecordingDatabase {
    fn dialect(&self) -> Dialect {
        Dialect::Standard
    }

    fn execute(&mut self, sql: &str) -> DatabaseResult<()> {
        self.statements.push(sql.to_string());
        if self.fail_ddl {
            return Err(DatabaseError::Statement("table already exists".to_string()));
        }
        Ok(())
    }

    fn begin(&mut self) -> DatabaseResult<()> {
        self.pending.clear();
        Ok(())
    }

    fn execute_many(&mut self, sql: &str, rows: &[Vec<&Value>]) -> DatabaseResult<()> {
        self.insert_calls += 1;
        self.statements.push(sql.to_string());
        if self.fail_on_insert == Some(self.insert_calls) {
            return Err(DatabaseError::Statement("value too long".to_string()));
        }
        for row in rows {
            match row[0] {
                Value::Integer(n) => self.pending.push(*n),
                other => panic!("unexpected value {other:?}"),
            }
        }
        Ok(())
    }

    fn commit(&mut self) -> DatabaseResult<()> {
        self.committed.push(std::mem::take(&mut self.pending));
        Ok(())
    }

    fn rollback(&mut self) -> DatabaseResult<()> {
        self.rollbacks += 1;
        self.pending.clear();
        Ok(())
    }
}

fn id_schema() -> Schema {
    Schema {
        skip_rows: 0,
        start_column: 0,
        end_column: 1,
        target_table_name: "ids".to_string(),
        fields: vec![FieldSpec::new("id", DataType::Integer).required()],
    }
}

fn id_table(rows: usize) -> Table {
    let mut table = Table::new(vec!["id".to_string()]);
    for i in 0..rows {
        table.push_row(vec![Value::Integer(i as i64)]);
    }
    table
}

#[test]
fn test_batches_split_at_batch_size_in_order() {
    let work = TempDir::new().expect("Failed to create temp dir");
    let mut db = RecordingDatabase::default();
    let table = id_table(25_000);
    let schema = id_schema();

    let checkpoints = CheckpointLog::open(work.path(), "test").expect("Failed to open log");
    let mut seen = Vec::new();
    let report = Loader::new(&mut db, LoadOptions::new().with_work_dir(work.path()))
        .with_progress(|range, inserted| seen.push((range.number, inserted)))
        .run(&table, &schema, checkpoints)
        .expect("Load failed");

    let sizes: Vec<usize> = db.committed.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![10_000, 10_000, 5_000]);
    assert_eq!(db.committed[0][0], 0);
    assert_eq!(db.committed[1][0], 10_000);
    assert_eq!(db.committed[2][0], 20_000);
    assert_eq!(db.committed[2][4_999], 24_999);

    assert!(report.is_success());
    assert_eq!(report.rows_inserted, 25_000);
    assert_eq!(report.batches.len(), 3);
    assert_eq!(seen, vec![(1, 10_000), (2, 20_000), (3, 25_000)]);

    assert!(!work.path().join(CHECKPOINT_FILE_NAME).exists());
    assert!(!work.path().join(PROGRESS_FILE_NAME).exists());
}

#[test]
fn test_generated_statements() {
    let work = TempDir::new().expect("Failed to create temp dir");
    let mut db = RecordingDatabase::default();
    let checkpoints = CheckpointLog::open(work.path(), "test").expect("Failed to open log");

    Loader::new(&mut db, LoadOptions::new().with_work_dir(work.path()))
        .run(&id_table(1), &id_schema(), checkpoints)
        .expect("Load failed");

    assert_eq!(
        db.statements[0],
        "CREATE TABLE IF NOT EXISTS \"ids\" (\"id\" integer)"
    );
    assert_eq!(db.statements[1], "INSERT INTO \"ids\" (\"id\") VALUES (?)");
}

#[test]
fn test_failed_batch_keeps_artifacts_and_reports_anchor() {
    let work = TempDir::new().expect("Failed to create temp dir");
    let mut db = RecordingDatabase::failing_on(2);
    let checkpoints = CheckpointLog::open(work.path(), "test").expect("Failed to open log");

    let report = Loader::new(&mut db, LoadOptions::new().with_work_dir(work.path()))
        .run(&id_table(25_000), &id_schema(), checkpoints)
        .expect("Load returned a hard error");

    // Only the first batch committed; the third was never attempted
    assert_eq!(db.committed.len(), 1);
    assert_eq!(db.insert_calls, 2);
    assert_eq!(db.rollbacks, 1);

    match report.batches.last() {
        Some(BatchResult::Failed { range, cause }) => {
            assert_eq!(range.start_index, 10_000);
            assert_eq!(range.end_index, 19_999);
            assert!(cause.contains("value too long"));
        }
        other => panic!("expected a failed batch, got {other:?}"),
    }

    let notes = std::fs::read_to_string(work.path().join(PROGRESS_FILE_NAME))
        .expect("Progress notes should remain");
    assert_eq!(notes, "10000 records inserted\n");

    let mut log = CheckpointLog::open(work.path(), "inspect").expect("Failed to reopen log");
    let records = log.records().expect("Failed to read records");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].step, "load");
    assert_eq!((records[0].startpoint, records[0].endpoint), (0, 9_999));
    assert_eq!(records[1].step, "load-failed");
    assert_eq!(records[1].startpoint, 10_000);

    match report.into_result() {
        Err(LoadError::BatchInsert { anchor, batch, .. }) => {
            assert_eq!(anchor, 10_000);
            assert_eq!(batch, 2);
        }
        other => panic!("expected BatchInsert, got {other:?}"),
    }
}

#[test]
fn test_progress_notes_count_each_batch() {
    let work = TempDir::new().expect("Failed to create temp dir");
    let mut db = RecordingDatabase::failing_on(3);
    let checkpoints = CheckpointLog::open(work.path(), "test").expect("Failed to open log");

    let report = Loader::new(&mut db, LoadOptions::new().with_work_dir(work.path()))
        .run(&id_table(25_000), &id_schema(), checkpoints)
        .expect("Load returned a hard error");
    assert_eq!(report.rows_inserted, 20_000);

    let notes = std::fs::read_to_string(work.path().join(PROGRESS_FILE_NAME))
        .expect("Progress notes should remain");
    assert_eq!(notes, "10000 records inserted\n10000 records inserted\n");
}

#[cfg(target_os = "linux")]
#[test]
fn test_unwritable_failure_marker_keeps_batch_error() {
    let work = TempDir::new().expect("Failed to create temp dir");
    std::os::unix::fs::symlink("/dev/full", work.path().join(CHECKPOINT_FILE_NAME))
        .expect("Failed to link checkpoint file");
    let mut db = RecordingDatabase::failing_on(1);
    let checkpoints = CheckpointLog::open(work.path(), "test").expect("Failed to open log");

    let report = Loader::new(&mut db, LoadOptions::new().with_work_dir(work.path()))
        .run(&id_table(3), &id_schema(), checkpoints)
        .expect("Checkpoint failure must not replace the batch failure");

    match report.into_result() {
        Err(LoadError::BatchInsert { anchor, batch, .. }) => {
            assert_eq!(anchor, 0);
            assert_eq!(batch, 1);
        }
        other => panic!("expected BatchInsert, got {other:?}"),
    }
}

#[test]
fn test_column_type_overrides_reach_ddl() {
    let work = TempDir::new().expect("Failed to create temp dir");
    let mut db = RecordingDatabase::default();
    let checkpoints = CheckpointLog::open(work.path(), "test").expect("Failed to open log");

    Loader::new(
        &mut db,
        LoadOptions::new()
            .with_work_dir(work.path())
            .with_column_type(DataType::Integer, "BIGINT"),
    )
    .run(&id_table(1), &id_schema(), checkpoints)
    .expect("Load failed");

    assert_eq!(
        db.statements[0],
        "CREATE TABLE IF NOT EXISTS \"ids\" (\"id\" BIGINT)"
    );
}

#[test]
fn test_anchor_is_original_row_index() {
    let work = TempDir::new().expect("Failed to create temp dir");
    let mut table = id_table(6);
    table.drop_rows(&HashSet::from([1, 4]));

    let mut db = RecordingDatabase::failing_on(2);
    let checkpoints = CheckpointLog::open(work.path(), "test").expect("Failed to open log");
    let report = Loader::new(
        &mut db,
        LoadOptions::new()
            .with_work_dir(work.path())
            .with_batch_size(2),
    )
    .run(&table, &id_schema(), checkpoints)
    .expect("Load returned a hard error");

    // Remaining indices are 0, 2, 3, 5; the second batch starts at 3
    let (range, _) = report.failure().expect("Expected a failure");
    assert_eq!(range.start_index, 3);
    assert_eq!(range.end_index, 5);
}

#[test]
fn test_ddl_failure_tolerated_by_default() {
    let work = TempDir::new().expect("Failed to create temp dir");
    let mut db = RecordingDatabase {
        fail_ddl: true,
        ..Default::default()
    };
    let checkpoints = CheckpointLog::open(work.path(), "test").expect("Failed to open log");

    let report = Loader::new(&mut db, LoadOptions::new().with_work_dir(work.path()))
        .run(&id_table(3), &id_schema(), checkpoints)
        .expect("Tolerated DDL failure should not abort");

    assert!(matches!(report.ddl, DdlOutcome::Ignored(_)));
    assert_eq!(report.rows_inserted, 3);
}

#[test]
fn test_ddl_failure_aborts_when_strict() {
    let work = TempDir::new().expect("Failed to create temp dir");
    let mut db = RecordingDatabase {
        fail_ddl: true,
        ..Default::default()
    };
    let checkpoints = CheckpointLog::open(work.path(), "test").expect("Failed to open log");

    let err = Loader::new(
        &mut db,
        LoadOptions::new()
            .with_work_dir(work.path())
            .with_ddl_policy(DdlPolicy::Strict),
    )
    .run(&id_table(3), &id_schema(), checkpoints)
    .expect_err("Strict DDL failure should abort");

    assert!(matches!(err, LoadError::Ddl { .. }));
    assert_eq!(db.insert_calls, 0);
}

#[test]
fn test_empty_table_cleans_up() {
    let work = TempDir::new().expect("Failed to create temp dir");
    let mut db = RecordingDatabase::default();
    let checkpoints = CheckpointLog::open(work.path(), "test").expect("Failed to open log");

    let report = Loader::new(&mut db, LoadOptions::new().with_work_dir(work.path()))
        .run(&id_table(0), &id_schema(), checkpoints)
        .expect("Load failed");

    assert!(report.batches.is_empty());
    assert!(!work.path().join(CHECKPOINT_FILE_NAME).exists());
    assert!(!work.path().join(PROGRESS_FILE_NAME).exists());
}

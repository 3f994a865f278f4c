//! Integration tests for the full pipeline against DuckDB
//!
//! Tests the complete workflow: descriptors → extract → validate → cleanse → load

#![cfg(feature = "duckdb-backend")]

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use tabload::checkpoint::{CHECKPOINT_FILE_NAME, CheckpointLog};
use tabload::database::{DuckDbTarget, TargetDatabase};
use tabload::load::PROGRESS_FILE_NAME;
use tabload::pipeline::{PipelineConfig, PipelineError, PipelineExecutor, run_pipeline};
use tabload::validation::ErrorKind;

const PEOPLE_SCHEMA: &str = r#"{
    "skip_rows": 0,
    "start_column": 0,
    "end_column": 2,
    "target_table_name": "people",
    "fields": [
        {"source_field_name": "id", "target_field_name": "id", "data_type": "integer", "not_null": "y"},
        {"source_field_name": "joined", "target_field_name": "joined", "data_type": "date", "not_null": "Y", "format": "%Y-%m-%d"}
    ]
}"#;

const PEOPLE_CSV: &str = "id,joined\n1,2020-01-01\n,2020-02-02\n3,not-a-date\n";

struct Fixture {
    dir: TempDir,
    schema: PathBuf,
    connection: PathBuf,
    data: PathBuf,
}

impl Fixture {
    fn new(schema: &str, connection: &str, data: &str) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let schema_path = dir.path().join("schema.json");
        let connection_path = dir.path().join("connection.json");
        let data_path = dir.path().join("data.csv");
        std::fs::write(&schema_path, schema).expect("Failed to write schema");
        std::fs::write(&connection_path, connection).expect("Failed to write connection");
        std::fs::write(&data_path, data).expect("Failed to write data");
        Self {
            dir,
            schema: schema_path,
            connection: connection_path,
            data: data_path,
        }
    }

    fn work_dir(&self) -> &Path {
        self.dir.path()
    }

    fn config(&self) -> PipelineConfig {
        PipelineConfig::new(&self.schema, &self.connection, &self.data)
            .with_work_dir(self.work_dir())
    }
}

fn count_rows(db: &DuckDbTarget, table: &str) -> i64 {
    db.connection()
        .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .expect("Failed to count rows")
}

#[test]
fn test_invalid_rows_are_rejected_and_valid_rows_loaded() {
    let fixture = Fixture::new(PEOPLE_SCHEMA, "{}", PEOPLE_CSV);
    let mut db = DuckDbTarget::memory().expect("Failed to open DuckDB");

    let mut executor = PipelineExecutor::new(fixture.config()).expect("Invalid config");
    let report = executor
        .run_with_database(&mut db)
        .expect("Pipeline failed");

    assert_eq!(report.rows_extracted, 3);
    assert_eq!(report.rejected.len(), 2);
    assert_eq!(report.rejected[0].index, 1);
    assert!(report.rejected[0].has(ErrorKind::NullInNotNullField));
    assert_eq!(report.rejected[1].index, 2);
    assert!(report.rejected[1].has(ErrorKind::InvalidDate));
    assert_eq!(report.load.rows_inserted, 1);

    let (id, joined): (i64, String) = db
        .connection()
        .query_row(
            "SELECT id, CAST(joined AS VARCHAR) FROM people",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .expect("Failed to read loaded row");
    assert_eq!(id, 1);
    assert_eq!(joined, "2020-01-01");

    assert!(!fixture.work_dir().join(CHECKPOINT_FILE_NAME).exists());
    assert!(!fixture.work_dir().join(PROGRESS_FILE_NAME).exists());
}

#[test]
fn test_run_with_database_file() {
    let fixture = Fixture::new(PEOPLE_SCHEMA, "{}", PEOPLE_CSV);
    let db_path = fixture.work_dir().join("target.duckdb");
    std::fs::write(
        &fixture.connection,
        format!(r#"{{"backend": "duckdb", "path": "{}"}}"#, db_path.display()),
    )
    .expect("Failed to write connection");

    let report = run_pipeline(fixture.config().with_batch_size(1)).expect("Pipeline failed");
    assert!(report.is_success());

    let db = DuckDbTarget::open(&db_path.to_string_lossy()).expect("Failed to reopen DuckDB");
    assert_eq!(count_rows(&db, "people"), 1);
}

#[test]
fn test_reload_appends_into_existing_table() {
    let fixture = Fixture::new(PEOPLE_SCHEMA, "{}", PEOPLE_CSV);
    let mut db = DuckDbTarget::memory().expect("Failed to open DuckDB");

    for _ in 0..2 {
        PipelineExecutor::new(fixture.config())
            .expect("Invalid config")
            .run_with_database(&mut db)
            .expect("Pipeline failed");
    }
    assert_eq!(count_rows(&db, "people"), 2);
}

#[test]
fn test_failed_batch_leaves_recovery_artifacts() {
    let csv = "id,joined\n1,2020-01-01\n2,2020-01-02\n3,2020-01-03\n";
    let fixture = Fixture::new(PEOPLE_SCHEMA, "{}", csv);
    let mut db = DuckDbTarget::memory().expect("Failed to open DuckDB");
    db.execute("CREATE TABLE people (id INTEGER CHECK (id < 2), joined DATE)")
        .expect("Failed to create table");

    let err = PipelineExecutor::new(fixture.config().with_batch_size(1))
        .expect("Invalid config")
        .run_with_database(&mut db)
        .expect_err("Second batch should fail");

    assert_eq!(err.exit_code(), 7);
    assert_eq!(err.anchor(), Some(1));
    assert_eq!(count_rows(&db, "people"), 1);

    let notes = std::fs::read_to_string(fixture.work_dir().join(PROGRESS_FILE_NAME))
        .expect("Progress notes should remain");
    assert_eq!(notes, "1 records inserted\n");

    let mut log =
        CheckpointLog::open(fixture.work_dir(), "inspect").expect("Failed to reopen log");
    let last = log
        .last_record()
        .expect("Failed to read log")
        .expect("Log should not be empty");
    assert_eq!(last.step, "load-failed");
    assert_eq!(last.startpoint, 1);
}

#[test]
fn test_yaml_schema_with_skip_rows() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let schema = dir.path().join("schema.yaml");
    let connection = dir.path().join("connection.yml");
    let data = dir.path().join("data.csv");
    std::fs::write(
        &schema,
        r#"
skip_rows: 2
start_column: 1
end_column: 3
target_table_name: scores
fields:
  - source_field_name: name
    target_field_name: player
    data_type: string
    not_null: "y"
  - source_field_name: score
    target_field_name: score
    data_type: float
    not_null: "n"
    precision: 6
    scale: 2
"#,
    )
    .expect("Failed to write schema");
    std::fs::write(&connection, "backend: duckdb\n").expect("Failed to write connection");
    std::fs::write(
        &data,
        "exported 2024-01-01\n\nrank,name,score\n1,ada,99.5\n2,grace,\n",
    )
    .expect("Failed to write data");

    let mut db = DuckDbTarget::memory().expect("Failed to open DuckDB");
    let report = PipelineExecutor::new(
        PipelineConfig::new(&schema, &connection, &data).with_work_dir(dir.path()),
    )
    .expect("Invalid config")
    .run_with_database(&mut db)
    .expect("Pipeline failed");

    assert_eq!(report.load.rows_inserted, 2);
    let nulls: i64 = db
        .connection()
        .query_row("SELECT COUNT(*) FROM scores WHERE score IS NULL", [], |row| {
            row.get(0)
        })
        .expect("Failed to query");
    assert_eq!(nulls, 1);
}

#[test]
fn test_missing_inputs_map_to_exit_codes() {
    let fixture = Fixture::new(PEOPLE_SCHEMA, "{}", PEOPLE_CSV);

    let missing_schema = PipelineConfig::new(
        fixture.work_dir().join("nope.json"),
        &fixture.connection,
        &fixture.data,
    )
    .with_work_dir(fixture.work_dir());
    let err = run_pipeline(missing_schema).expect_err("Schema is missing");
    assert!(matches!(err, PipelineError::ConfigNotFound(_)));
    assert_eq!(err.exit_code(), 3);

    let missing_data = PipelineConfig::new(
        &fixture.schema,
        &fixture.connection,
        fixture.work_dir().join("nope.csv"),
    )
    .with_work_dir(fixture.work_dir());
    let err = run_pipeline(missing_data).expect_err("Data is missing");
    assert!(matches!(err, PipelineError::Extract(_)));
    assert_eq!(err.exit_code(), 4);
}

#[test]
fn test_extract_failure_leaves_checkpoint_log() {
    let fixture = Fixture::new(PEOPLE_SCHEMA, "{}", "id,name\n1,ada\n");
    let mut db = DuckDbTarget::memory().expect("Failed to open DuckDB");

    let err = PipelineExecutor::new(fixture.config())
        .expect("Invalid config")
        .run_with_database(&mut db)
        .expect_err("Schema field 'joined' is not in the header");

    assert!(matches!(err, PipelineError::Extract(_)));
    assert_eq!(err.exit_code(), 4);
    assert!(fixture.work_dir().join(CHECKPOINT_FILE_NAME).exists());
}

#[test]
fn test_unknown_backend_is_a_connection_error() {
    let fixture = Fixture::new(PEOPLE_SCHEMA, r#"{"backend": "oracle"}"#, PEOPLE_CSV);
    let err = run_pipeline(fixture.config()).expect_err("Backend is unsupported");
    assert!(matches!(err, PipelineError::Connection(_)));
    assert_eq!(err.exit_code(), 5);
}

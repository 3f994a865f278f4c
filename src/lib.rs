//! tabload - schema-validated, checkpointed bulk loading of delimited files
//!
//! Provides:
//! - Schema and connection descriptor loading (JSON or YAML)
//! - Bounded extraction of a delimited file into an in-memory table
//! - Per-row validation with aggregated error reports
//! - Cleansing of invalid rows and date normalization
//! - Batched, transactional loading with a checkpoint log and progress notes
//! - A pipeline executor tying the stages together

pub mod checkpoint;
pub mod cleanse;
pub mod config;
pub mod database;
pub mod extract;
pub mod load;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod validation;

// Re-export commonly used types
pub use checkpoint::{CHECKPOINT_FILE_NAME, CheckpointError, CheckpointLog, CheckpointRecord};
pub use cleanse::{CleanseError, cleanse};
pub use config::{ConfigError, load_connection, load_schema};
pub use database::{ConnectionParams, DatabaseError, Dialect, TargetDatabase};
#[cfg(feature = "duckdb-backend")]
pub use database::DuckDbTarget;
pub use extract::{ExtractError, extract_csv};
pub use load::{
    BatchRange, BatchResult, DdlPolicy, LoadError, LoadOptions, LoadReport, Loader,
};
pub use models::{DataType, FieldSpec, Row, Schema, Table, Value};
pub use pipeline::{PipelineConfig, PipelineError, PipelineExecutor, PipelineReport};
pub use validation::{ErrorKind, FieldError, RowErrorReport, ValidationSummary, validate_rows};

//! Error types for pipeline operations
//!
//! Every abort path of a run maps to one variant here, and every variant
//! maps to a process exit status.

use std::path::PathBuf;
use thiserror::Error;

use crate::checkpoint::CheckpointError;
use crate::cleanse::CleanseError;
use crate::config::ConfigError;
use crate::database::DatabaseError;
use crate::extract::ExtractError;
use crate::load::LoadError;

/// Errors that can occur during a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Run options are invalid
    #[error("Invalid options: {0}")]
    Options(String),

    /// Schema or connection descriptor missing
    #[error("Descriptor not found: {0}")]
    ConfigNotFound(PathBuf),

    /// Schema or connection descriptor unreadable or invalid
    #[error(transparent)]
    Config(ConfigError),

    /// Source file missing or malformed
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// Date normalization failed
    #[error(transparent)]
    Cleanse(#[from] CleanseError),

    /// Target database unreachable
    #[error(transparent)]
    Connection(DatabaseError),

    /// Table creation failed under the strict policy
    #[error("Failed to create table '{table}': {source}")]
    Ddl {
        table: String,
        #[source]
        source: DatabaseError,
    },

    /// A batch failed; rows from `anchor` on were not loaded
    #[error("Batch {batch} into '{table}' failed at row {anchor}: {cause}")]
    BatchInsert {
        table: String,
        anchor: usize,
        batch: usize,
        cause: String,
    },

    /// Checkpoint log unavailable
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    /// Progress note file unavailable
    #[error("Progress note {path} unavailable: {source}")]
    Progress {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::Options(_)
            | PipelineError::ConfigNotFound(_)
            | PipelineError::Config(_) => 3,
            PipelineError::Extract(_) | PipelineError::Cleanse(_) => 4,
            PipelineError::Connection(_) => 5,
            PipelineError::Ddl { .. } => 6,
            PipelineError::BatchInsert { .. } => 7,
            PipelineError::Checkpoint(_) | PipelineError::Progress { .. } => 8,
        }
    }

    /// Original index of the first row that was not loaded
    pub fn anchor(&self) -> Option<usize> {
        match self {
            PipelineError::BatchInsert { anchor, .. } => Some(*anchor),
            _ => None,
        }
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Options(msg) => {
                format!("Invalid options: {msg}\n\nHint: Run with --help to see the accepted flags.")
            }
            PipelineError::ConfigNotFound(path) => {
                format!(
                    "Descriptor not found: {}\n\nHint: Check that the file exists and the path is correct.",
                    path.display()
                )
            }
            PipelineError::Config(err) => err.user_message(),
            PipelineError::Extract(err) => err.user_message(),
            PipelineError::Connection(err) => err.user_message(),
            PipelineError::Ddl { table, source } => format!(
                "Could not create table '{table}': {source}\n\n\
                Hint: Check the data types in the schema, or drop --strict-ddl to continue when the table already exists."
            ),
            PipelineError::BatchInsert { anchor, .. } => format!(
                "{self}\n\n\
                Hint: Rows before index {anchor} were committed. The checkpoint log and load_progress.txt were kept for recovery."
            ),
            PipelineError::Checkpoint(err) => err.user_message(),
            _ => self.to_string(),
        }
    }
}

impl From<ConfigError> for PipelineError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotFound(path) => PipelineError::ConfigNotFound(path),
            other => PipelineError::Config(other),
        }
    }
}

impl From<DatabaseError> for PipelineError {
    fn from(err: DatabaseError) -> Self {
        PipelineError::Connection(err)
    }
}

impl From<LoadError> for PipelineError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::Ddl { table, source } => PipelineError::Ddl { table, source },
            LoadError::BatchInsert {
                table,
                anchor,
                batch,
                cause,
            } => PipelineError::BatchInsert {
                table,
                anchor,
                batch,
                cause,
            },
            LoadError::Checkpoint(err) => PipelineError::Checkpoint(err),
            LoadError::Progress { path, source } => PipelineError::Progress { path, source },
        }
    }
}

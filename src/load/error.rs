//! Error types for the load stage

use std::path::PathBuf;
use thiserror::Error;

use crate::checkpoint::CheckpointError;
use crate::database::DatabaseError;

/// Errors that abort a load
#[derive(Error, Debug)]
pub enum LoadError {
    /// Creating the target table failed under the strict policy
    #[error("Failed to create table '{table}': {source}")]
    Ddl {
        table: String,
        #[source]
        source: DatabaseError,
    },

    /// A batch could not be inserted; rows from `anchor` on were not loaded
    #[error("Batch {batch} into '{table}' failed at row {anchor}: {cause}")]
    BatchInsert {
        table: String,
        anchor: usize,
        batch: usize,
        cause: String,
    },

    /// Checkpoint log could not be written
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    /// Progress note file could not be written
    #[error("Progress note {path} unavailable: {source}")]
    Progress {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

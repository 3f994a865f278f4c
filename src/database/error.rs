//! Error types for target database access

use thiserror::Error;

/// Errors raised by a target database
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Could not connect with the given parameters
    #[error("Connection failed: {0}")]
    Connection(String),

    /// A statement failed to prepare or execute
    #[error("Statement failed: {0}")]
    Statement(String),

    /// The requested backend is not compiled in or not known
    #[error("Unsupported backend: {0}")]
    Unsupported(String),
}

impl DatabaseError {
    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            DatabaseError::Connection(msg) => format!(
                "Could not connect to the target database: {msg}\n\n\
                Hint: Check the connection descriptor and that the database is reachable."
            ),
            DatabaseError::Unsupported(backend) => format!(
                "Unsupported backend '{backend}'.\n\n\
                Hint: Set \"backend\": \"duckdb\" and build with the duckdb-backend feature."
            ),
            _ => self.to_string(),
        }
    }
}

#[cfg(feature = "duckdb-backend")]
impl From<duckdb::Error> for DatabaseError {
    fn from(err: duckdb::Error) -> Self {
        DatabaseError::Statement(err.to_string())
    }
}

/// Result type for database operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;

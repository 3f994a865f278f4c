//! Error types for descriptor loading

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading the schema or connection descriptor
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Descriptor file does not exist
    #[error("Descriptor not found: {0}")]
    NotFound(PathBuf),

    /// Descriptor exists but could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Descriptor is not valid JSON/YAML for the expected shape
    #[error("Failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// Descriptor parsed but violates a schema rule
    #[error("Invalid schema: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            ConfigError::NotFound(path) => {
                format!(
                    "Descriptor not found: {}\n\nHint: Check that the file exists and the path is correct.",
                    path.display()
                )
            }
            ConfigError::Parse { path, reason } => {
                format!(
                    "Could not parse {}\nReason: {reason}\n\n\
                    Hint: Files ending in .yaml or .yml are read as YAML, everything else as JSON.",
                    path.display()
                )
            }
            ConfigError::Invalid(msg) => {
                format!(
                    "Invalid schema: {msg}\n\nHint: Date fields need a format, float fields need precision and scale."
                )
            }
            _ => self.to_string(),
        }
    }
}

/// Result type for descriptor loading
pub type ConfigResult<T> = Result<T, ConfigError>;

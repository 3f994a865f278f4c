//! Load stage
//!
//! Creates the target table from the schema and inserts the cleansed rows in
//! fixed-size batches. Each committed batch appends a progress note and a
//! checkpoint record; a failed batch is rolled back and stops the load.

pub mod batch;
pub mod ddl;
pub mod error;
pub mod loader;
pub mod progress;

pub use batch::{BatchRange, BatchResult, DdlOutcome, LoadReport};
pub use ddl::{ColumnTypeMapper, create_table_sql, insert_sql};
pub use error::LoadError;
pub use loader::Loader;
pub use progress::{PROGRESS_FILE_NAME, ProgressNotes};

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::database::Dialect;
use crate::models::DataType;

/// Default number of rows per batch
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// What to do when `CREATE TABLE` fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DdlPolicy {
    /// Log the failure and continue (the table usually already exists)
    #[default]
    Tolerate,
    /// Abort the load
    Strict,
}

impl std::fmt::Display for DdlPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tolerate => write!(f, "tolerate"),
            Self::Strict => write!(f, "strict"),
        }
    }
}

impl FromStr for DdlPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tolerate" => Ok(Self::Tolerate),
            "strict" => Ok(Self::Strict),
            _ => Err(format!("Unknown DDL policy: {}", s)),
        }
    }
}

/// Load configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Rows per batch
    pub batch_size: usize,
    pub ddl_policy: DdlPolicy,
    /// Dialect override; the database's own dialect when unset
    pub dialect: Option<Dialect>,
    /// SQL column types replacing the dialect defaults
    #[serde(default)]
    pub column_types: HashMap<DataType, String>,
    /// Directory holding the checkpoint log and progress notes
    pub work_dir: PathBuf,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            ddl_policy: DdlPolicy::default(),
            dialect: None,
            column_types: HashMap::new(),
            work_dir: PathBuf::from("."),
        }
    }
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the DDL failure policy
    pub fn with_ddl_policy(mut self, policy: DdlPolicy) -> Self {
        self.ddl_policy = policy;
        self
    }

    /// Override the SQL dialect
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Use `sql_type` for every column declared as `data_type`
    pub fn with_column_type(mut self, data_type: DataType, sql_type: impl Into<String>) -> Self {
        self.column_types.insert(data_type, sql_type.into());
        self
    }

    /// Set the working directory
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    /// Validate the options
    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("batch_size must be at least 1".to_string());
        }
        if let Some((data_type, _)) = self.column_types.iter().find(|(_, t)| t.trim().is_empty()) {
            return Err(format!("column type for '{data_type}' must not be empty"));
        }
        if !self.work_dir.is_dir() {
            return Err(format!(
                "work directory does not exist: {}",
                self.work_dir.display()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = LoadOptions::default();
        assert_eq!(options.batch_size, 10_000);
        assert_eq!(options.ddl_policy, DdlPolicy::Tolerate);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        assert!(LoadOptions::new().with_batch_size(0).validate().is_err());
    }

    #[test]
    fn test_empty_column_type_rejected() {
        let options = LoadOptions::new().with_column_type(DataType::String, " ");
        assert!(options.validate().unwrap_err().contains("string"));
    }

    #[test]
    fn test_ddl_policy_from_str() {
        assert_eq!("STRICT".parse::<DdlPolicy>().unwrap(), DdlPolicy::Strict);
        assert!("lenient".parse::<DdlPolicy>().is_err());
    }
}

//! Pipeline configuration types

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::database::Dialect;
use crate::load::{DdlPolicy, LoadOptions};
use crate::models::DataType;

/// Default process name written into checkpoint records
pub const DEFAULT_PROCESS_NAME: &str = "tabload";

/// Inputs and options for one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Field schema descriptor
    pub schema_path: PathBuf,
    /// Connection descriptor
    pub connection_path: PathBuf,
    /// Delimited source file
    pub data_path: PathBuf,
    /// Load options, including the working directory
    pub load: LoadOptions,
    /// Process name recorded in checkpoints
    pub process: String,
}

impl PipelineConfig {
    /// Create a config for the three required inputs
    pub fn new(
        schema_path: impl Into<PathBuf>,
        connection_path: impl Into<PathBuf>,
        data_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            schema_path: schema_path.into(),
            connection_path: connection_path.into(),
            data_path: data_path.into(),
            load: LoadOptions::default(),
            process: DEFAULT_PROCESS_NAME.to_string(),
        }
    }

    /// Set the batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.load.batch_size = batch_size;
        self
    }

    /// Set the DDL failure policy
    pub fn with_ddl_policy(mut self, policy: DdlPolicy) -> Self {
        self.load.ddl_policy = policy;
        self
    }

    /// Override the SQL dialect
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.load.dialect = Some(dialect);
        self
    }

    /// Use `sql_type` for every column declared as `data_type`
    pub fn with_column_type(mut self, data_type: DataType, sql_type: impl Into<String>) -> Self {
        self.load = self.load.with_column_type(data_type, sql_type);
        self
    }

    /// Set the directory for the checkpoint log and progress notes
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.load.work_dir = dir.into();
        self
    }

    /// Set the process name
    pub fn with_process(mut self, process: impl Into<String>) -> Self {
        self.process = process.into();
        self
    }

    pub fn work_dir(&self) -> &Path {
        &self.load.work_dir
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.process.trim().is_empty() {
            return Err("process name must not be empty".to_string());
        }
        self.load.validate()
    }
}

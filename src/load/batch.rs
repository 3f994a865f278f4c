//! Per-batch results and the load report

use serde::{Deserialize, Serialize};

use super::error::LoadError;

/// Rows covered by one batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRange {
    /// 1-based batch number
    pub number: usize,
    /// Original index of the first row (the recovery anchor)
    pub start_index: usize,
    /// Original index of the last row
    pub end_index: usize,
    pub rows: usize,
}

/// Outcome of flushing one batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BatchResult {
    Committed(BatchRange),
    Failed { range: BatchRange, cause: String },
}

impl BatchResult {
    pub fn is_committed(&self) -> bool {
        matches!(self, BatchResult::Committed(_))
    }
}

/// Result of creating the target table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "error", rename_all = "lowercase")]
pub enum DdlOutcome {
    Applied,
    /// Failed and tolerated
    Ignored(String),
}

/// Summary of a load run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadReport {
    pub table: String,
    pub ddl: DdlOutcome,
    pub batches: Vec<BatchResult>,
    pub rows_inserted: usize,
}

impl LoadReport {
    pub fn new(table: impl Into<String>, ddl: DdlOutcome) -> Self {
        Self {
            table: table.into(),
            ddl,
            batches: Vec::new(),
            rows_inserted: 0,
        }
    }

    /// True when every attempted batch committed
    pub fn is_success(&self) -> bool {
        self.batches.iter().all(BatchResult::is_committed)
    }

    /// The failed batch and its cause, if any
    pub fn failure(&self) -> Option<(&BatchRange, &str)> {
        self.batches.iter().find_map(|b| match b {
            BatchResult::Failed { range, cause } => Some((range, cause.as_str())),
            BatchResult::Committed(_) => None,
        })
    }

    pub fn committed_batches(&self) -> usize {
        self.batches.iter().filter(|b| b.is_committed()).count()
    }

    /// Turn a failed batch into [`LoadError::BatchInsert`]
    pub fn into_result(self) -> Result<Self, LoadError> {
        match self.failure() {
            Some((range, cause)) => Err(LoadError::BatchInsert {
                table: self.table.clone(),
                anchor: range.start_index,
                batch: range.number,
                cause: cause.to_string(),
            }),
            None => Ok(self),
        }
    }
}

//! Row-level validation reports

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Kind of field-level rule violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NullInNotNullField,
    InvalidDate,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NullInNotNullField => write!(f, "null found in not null field"),
            Self::InvalidDate => write!(f, "invalid date found"),
        }
    }
}

/// A single violation on one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub kind: ErrorKind,
    /// Source field name
    pub field_name: String,
}

impl FieldError {
    pub fn new(kind: ErrorKind, field_name: impl Into<String>) -> Self {
        Self {
            kind,
            field_name: field_name.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field_name, self.kind)
    }
}

/// All violations found on one row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowErrorReport {
    /// Original row index
    pub index: usize,
    /// Row values rendered for logging
    pub row: String,
    /// Violations in schema field order
    pub errors: Vec<FieldError>,
}

impl RowErrorReport {
    /// Whether any violation is of `kind`
    pub fn has(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind == kind)
    }
}

/// Aggregate counts over a validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub rows_checked: usize,
    pub rows_invalid: usize,
    pub errors_by_kind: BTreeMap<ErrorKind, usize>,
}

impl ValidationSummary {
    /// Summarize a set of reports over a table of `rows_checked` rows
    pub fn from_reports(rows_checked: usize, reports: &[RowErrorReport]) -> Self {
        let mut errors_by_kind = BTreeMap::new();
        for error in reports.iter().flat_map(|r| &r.errors) {
            *errors_by_kind.entry(error.kind).or_insert(0) += 1;
        }
        Self {
            rows_checked,
            rows_invalid: reports.len(),
            errors_by_kind,
        }
    }

    pub fn rows_valid(&self) -> usize {
        self.rows_checked - self.rows_invalid
    }

    pub fn count(&self, kind: ErrorKind) -> usize {
        self.errors_by_kind.get(&kind).copied().unwrap_or(0)
    }
}

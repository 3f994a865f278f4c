//! Delimited file extraction
//!
//! Reads a comma-separated file into a [`Table`], honoring the schema's
//! `skip_rows` and `[start_column, end_column)` bounds.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, error, info};

use crate::models::{Schema, Table, Value};

/// Errors that can occur during extraction
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Source file not found
    #[error("Source file not found: {0}")]
    NotFound(PathBuf),

    /// Source file could not be parsed
    #[error("Malformed source {path} at line {line}: {reason}")]
    Malformed {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    /// Header is narrower than the requested column range
    #[error("Column range {start}..{end} exceeds the {available} columns in {path}")]
    ColumnRange {
        path: PathBuf,
        start: usize,
        end: usize,
        available: usize,
    },

    /// A schema field has no column in the extracted header window
    #[error("Field '{field}' is not among the extracted columns of {path}")]
    MissingField { field: String, path: PathBuf },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            ExtractError::NotFound(path) => format!(
                "Source file not found: {}\n\nHint: Check that the file exists and the path is correct.",
                path.display()
            ),
            ExtractError::Malformed { line, .. } => format!(
                "{self}\n\nHint: Check the quoting and field count around line {line}."
            ),
            ExtractError::ColumnRange { .. } => format!(
                "{self}\n\nHint: Adjust start_column/end_column or skip_rows in the schema."
            ),
            ExtractError::MissingField { .. } => format!(
                "{self}\n\nHint: Check source_field_name against the header and the start_column/end_column window."
            ),
            _ => self.to_string(),
        }
    }
}

/// Read `path` into a table bounded by the schema
///
/// The first `skip_rows` physical lines are discarded and the next line is
/// the header. Cells are typed by the matching field's declared type.
pub fn extract_csv(path: &Path, schema: &Schema) -> Result<Table, ExtractError> {
    let _span = tracing::info_span!("extract", path = %path.display()).entered();

    if !path.exists() {
        error!(path = %path.display(), "Source file not found");
        return Err(ExtractError::NotFound(path.to_path_buf()));
    }

    let mut reader = BufReader::new(File::open(path)?);
    let mut skipped = 0u64;
    let mut discard = String::new();
    while skipped < schema.skip_rows as u64 {
        discard.clear();
        if reader.read_line(&mut discard)? == 0 {
            break;
        }
        skipped += 1;
    }
    debug!(skipped, "Skipped leading lines");

    let malformed = |line: u64, reason: String| {
        let err = ExtractError::Malformed {
            path: path.to_path_buf(),
            line,
            reason,
        };
        error!(error = %err, "Failed to parse source file");
        err
    };

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| malformed(skipped + 1, e.to_string()))?
        .clone();

    let (start, end) = (schema.start_column, schema.end_column);
    if headers.len() < end {
        let err = ExtractError::ColumnRange {
            path: path.to_path_buf(),
            start,
            end,
            available: headers.len(),
        };
        error!(error = %err, "Column range out of bounds");
        return Err(err);
    }

    let columns: Vec<String> = headers
        .iter()
        .skip(start)
        .take(end - start)
        .map(|h| h.trim().to_string())
        .collect();
    if let Some(field) = schema
        .fields
        .iter()
        .find(|f| !columns.contains(&f.source_field_name))
    {
        let err = ExtractError::MissingField {
            field: field.source_field_name.clone(),
            path: path.to_path_buf(),
        };
        error!(error = %err, columns = ?columns, "Schema field missing from source");
        return Err(err);
    }
    let types: Vec<_> = columns
        .iter()
        .map(|c| schema.field(c).map(|f| &f.data_type))
        .collect();

    let mut table = Table::new(columns);
    for result in csv_reader.records() {
        let record = result.map_err(|e| {
            let line = e
                .position()
                .map(|p| p.line() + skipped)
                .unwrap_or(skipped);
            malformed(line, e.to_string())
        })?;

        if record.len() > headers.len() {
            let line = record.position().map(|p| p.line() + skipped).unwrap_or(0);
            return Err(malformed(
                line,
                format!(
                    "expected {} fields, saw {}",
                    headers.len(),
                    record.len()
                ),
            ));
        }

        let values = (start..end)
            .zip(&types)
            .map(|(i, ty)| match record.get(i) {
                Some(raw) => Value::from_cell(raw, *ty),
                None => Value::Null,
            })
            .collect();
        table.push_row(values);
    }

    info!(rows = table.len(), columns = table.columns().len(), "Extracted source file");
    Ok(table)
}

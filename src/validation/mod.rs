//! Row validation
//!
//! Applies the schema's per-field rules to every row:
//! - not-null fields must carry a value
//! - date fields must parse with the field's format
//!
//! Violations are aggregated into one [`RowErrorReport`] per offending row.
//! Nothing here aborts; callers decide what to do with the reports.

pub mod report;

pub use report::{ErrorKind, FieldError, RowErrorReport, ValidationSummary};

use crate::models::{FieldSpec, Row, Schema, Table, Value};

/// Lazily validate every row of `table` against `schema`
///
/// Valid rows yield nothing. The iterator borrows the table, so it cannot
/// be mutated until the reports are consumed or collected.
pub fn validate_rows<'a>(
    table: &'a Table,
    schema: &'a Schema,
) -> impl Iterator<Item = RowErrorReport> + 'a {
    table
        .rows()
        .iter()
        .filter_map(move |row| validate_row(table, schema, row))
}

/// Validate a single row; `None` when it passes every rule
pub fn validate_row(table: &Table, schema: &Schema, row: &Row) -> Option<RowErrorReport> {
    let errors: Vec<FieldError> = schema
        .fields
        .iter()
        .flat_map(|field| check_field(field, table.value(row, &field.source_field_name)))
        .collect();

    if errors.is_empty() {
        return None;
    }

    tracing::debug!(index = row.index, errors = errors.len(), "Row failed validation");
    Some(RowErrorReport {
        index: row.index,
        row: table.render_row(row),
        errors,
    })
}

fn check_field(field: &FieldSpec, value: &Value) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if field.not_null && value.is_null() {
        errors.push(FieldError::new(
            ErrorKind::NullInNotNullField,
            &field.source_field_name,
        ));
    }

    if field.is_date() {
        let valid = match value {
            Value::Null | Value::Date(_) => true,
            other => field.parse_date(&other.to_string()).is_some(),
        };
        if !valid {
            errors.push(FieldError::new(ErrorKind::InvalidDate, &field.source_field_name));
        }
    }

    errors
}

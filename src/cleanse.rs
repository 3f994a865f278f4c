//! Cleansing: drop invalid rows and normalize date columns

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, info};

use crate::models::{Schema, Table, Value};
use crate::validation::RowErrorReport;

/// Errors raised while cleansing
#[derive(Error, Debug)]
pub enum CleanseError {
    /// A surviving date value could not be parsed with its field's format
    #[error("Row {index}: field '{field}' holds an unparseable date '{value}'")]
    UnparseableDate {
        index: usize,
        field: String,
        value: String,
    },
}

/// Remove every reported row and convert date fields to calendar dates
///
/// The reports are collected into an index set before the table is touched,
/// so a lazy validator over this same table must be materialized first.
/// Values already holding a date are left alone, which makes repeated runs
/// a no-op.
pub fn cleanse<I>(mut table: Table, reports: I, schema: &Schema) -> Result<Table, CleanseError>
where
    I: IntoIterator<Item = RowErrorReport>,
{
    let invalid: HashSet<usize> = reports.into_iter().map(|r| r.index).collect();
    let dropped = table.drop_rows(&invalid);
    debug!(dropped, "Dropped invalid rows");

    for field in schema.date_fields() {
        let Some(column) = table.column_mut(&field.source_field_name) else {
            continue;
        };
        for (index, value) in column {
            let parsed = match &*value {
                Value::Null | Value::Date(_) => continue,
                other => field.parse_date(&other.to_string()),
            };
            match parsed {
                Some(date) => *value = Value::Date(date),
                None => {
                    return Err(CleanseError::UnparseableDate {
                        index,
                        field: field.source_field_name.clone(),
                        value: value.to_string(),
                    });
                }
            }
        }
    }

    info!(dropped, remaining = table.len(), "Cleansed table");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DataType, FieldSpec};
    use crate::validation::validate_rows;
    use chrono::NaiveDate;

    fn schema() -> Schema {
        Schema {
            skip_rows: 0,
            start_column: 0,
            end_column: 2,
            target_table_name: "t".to_string(),
            fields: vec![
                FieldSpec::new("id", DataType::Integer).required(),
                FieldSpec::new("joined", DataType::Date).with_format("%Y-%m-%d %H:%M"),
            ],
        }
    }

    fn table() -> Table {
        let mut table = Table::new(vec!["id".to_string(), "joined".to_string()]);
        table.push_row(vec![Value::Integer(1), Value::Text("2020-01-01 08:30".into())]);
        table.push_row(vec![Value::Null, Value::Text("2020-02-02 09:00".into())]);
        table.push_row(vec![Value::Integer(3), Value::Text("garbage".into())]);
        table.push_row(vec![Value::Integer(4), Value::Null]);
        table
    }

    #[test]
    fn test_cleanse_drops_reported_rows() {
        let schema = schema();
        let table = table();
        let reports: Vec<_> = validate_rows(&table, &schema).collect();
        let cleaned = cleanse(table, reports, &schema).unwrap();

        let indices: Vec<_> = cleaned.rows().iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 3]);
        assert_eq!(
            cleaned.rows()[0].values[1],
            Value::Date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap())
        );
        assert!(cleaned.rows()[1].values[1].is_null());
    }

    #[test]
    fn test_cleanse_is_idempotent() {
        let schema = schema();
        let table = table();
        let reports: Vec<_> = validate_rows(&table, &schema).collect();
        let once = cleanse(table, reports.clone(), &schema).unwrap();
        let twice = cleanse(once.clone(), reports, &schema).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_duplicate_reports_are_harmless() {
        let schema = schema();
        let table = table();
        let mut reports: Vec<_> = validate_rows(&table, &schema).collect();
        reports.extend(reports.clone());
        let cleaned = cleanse(table, reports, &schema).unwrap();
        assert_eq!(cleaned.len(), 2);
    }

    #[test]
    fn test_unreported_bad_date_is_an_error() {
        let schema = schema();
        let err = cleanse(table(), Vec::new(), &schema).unwrap_err();
        assert!(matches!(err, CleanseError::UnparseableDate { index: 2, .. }));
    }
}

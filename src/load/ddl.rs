//! DDL and DML generation from the schema

use std::collections::HashMap;

use crate::database::Dialect;
use crate::models::{DataType, FieldSpec, Schema};

/// Width used for string columns
pub const DEFAULT_VARCHAR_LENGTH: u32 = 40;

/// Maps abstract field types to SQL column types
///
/// Strings become `VARCHAR(40)` and floats become `FLOAT(p,s)` on MySQL or
/// `DECIMAL(p,s)` elsewhere. Any other type name passes through unchanged.
/// Per-type overrides take precedence.
#[derive(Debug, Clone)]
pub struct ColumnTypeMapper {
    dialect: Dialect,
    overrides: HashMap<DataType, String>,
}

impl ColumnTypeMapper {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            overrides: HashMap::new(),
        }
    }

    /// Force a specific SQL type for `data_type`
    pub fn with_override(mut self, data_type: DataType, sql_type: impl Into<String>) -> Self {
        self.overrides.insert(data_type, sql_type.into());
        self
    }

    /// SQL column type for a field
    pub fn sql_type(&self, field: &FieldSpec) -> String {
        if let Some(sql_type) = self.overrides.get(&field.data_type) {
            return sql_type.clone();
        }

        match &field.data_type {
            DataType::String => format!("VARCHAR({DEFAULT_VARCHAR_LENGTH})"),
            DataType::Float => {
                let (p, s) = (field.precision.unwrap_or(18), field.scale.unwrap_or(2));
                match self.dialect {
                    Dialect::MySql => format!("FLOAT({p},{s})"),
                    _ => format!("DECIMAL({p},{s})"),
                }
            }
            other => other.name().to_string(),
        }
    }
}

/// `CREATE TABLE IF NOT EXISTS` for the schema's target table
pub fn create_table_sql(schema: &Schema, dialect: Dialect, mapper: &ColumnTypeMapper) -> String {
    let columns: Vec<String> = schema
        .fields
        .iter()
        .map(|f| {
            format!(
                "{} {}",
                dialect.quote_identifier(&f.target_field_name),
                mapper.sql_type(f)
            )
        })
        .collect();

    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        dialect.quote_identifier(&schema.target_table_name),
        columns.join(", ")
    )
}

/// Parameterized insert with columns and placeholders in field order
pub fn insert_sql(schema: &Schema, dialect: Dialect) -> String {
    let columns: Vec<String> = schema
        .fields
        .iter()
        .map(|f| dialect.quote_identifier(&f.target_field_name))
        .collect();
    let placeholders: Vec<String> = (1..=schema.fields.len())
        .map(|i| dialect.placeholder(i))
        .collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        dialect.quote_identifier(&schema.target_table_name),
        columns.join(", "),
        placeholders.join(", ")
    )
}

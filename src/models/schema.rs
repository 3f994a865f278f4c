//! Schema model: field specs and extraction bounds

use chrono::NaiveDate;
use chrono::format::{Parsed, StrftimeItems, parse};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

/// Abstract column type declared in the schema descriptor
///
/// Unknown names are kept verbatim so they can pass straight through to DDL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataType {
    String,
    Date,
    Float,
    Integer,
    Other(String),
}

impl DataType {
    /// Parse a type name (case-insensitive)
    pub fn parse(name: &str) -> Self {
        let trimmed = name.trim();
        match trimmed.to_lowercase().as_str() {
            "string" | "str" | "text" => DataType::String,
            "date" => DataType::Date,
            "float" | "double" => DataType::Float,
            "integer" | "int" => DataType::Integer,
            _ => DataType::Other(trimmed.to_string()),
        }
    }

    /// Canonical name of the type
    pub fn name(&self) -> &str {
        match self {
            DataType::String => "string",
            DataType::Date => "date",
            DataType::Float => "float",
            DataType::Integer => "integer",
            DataType::Other(name) => name,
        }
    }
}

impl From<String> for DataType {
    fn from(value: String) -> Self {
        DataType::parse(&value)
    }
}

impl From<DataType> for String {
    fn from(value: DataType) -> Self {
        value.name().to_string()
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One column of the schema descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Column name in the delimited file header
    pub source_field_name: String,
    /// Column name in the target table
    pub target_field_name: String,
    /// Declared type
    pub data_type: DataType,
    /// `"y"` when the field must not be null
    #[serde(default, with = "yes_no")]
    pub not_null: bool,
    /// strftime-style pattern for date fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
}

impl FieldSpec {
    /// Create a nullable field with the same source and target name
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        let name = name.into();
        Self {
            source_field_name: name.clone(),
            target_field_name: name,
            data_type,
            not_null: false,
            format: None,
            precision: None,
            scale: None,
        }
    }

    /// Set the target column name
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target_field_name = target.into();
        self
    }

    /// Mark the field as not-null
    pub fn required(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Set the date format pattern
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Set numeric precision and scale
    pub fn with_precision(mut self, precision: u32, scale: u32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    pub fn is_nullable(&self) -> bool {
        !self.not_null
    }

    pub fn is_date(&self) -> bool {
        self.data_type == DataType::Date
    }

    /// Parse `raw` with this field's date format, dropping any time component
    ///
    /// Parts the format leaves out default the way `strptime` does: a missing
    /// day or month becomes 1. Returns `None` when the field has no format or
    /// the text does not match.
    pub fn parse_date(&self, raw: &str) -> Option<NaiveDate> {
        let format = self.format.as_deref()?;
        let mut parsed = Parsed::new();
        parse(&mut parsed, raw.trim(), StrftimeItems::new(format)).ok()?;

        let dated_by_week = parsed.isoweek().is_some()
            || parsed.week_from_sun().is_some()
            || parsed.week_from_mon().is_some();
        if parsed.ordinal().is_none() && !dated_by_week {
            if parsed.month().is_none() {
                parsed.set_month(1).ok()?;
            }
            if parsed.day().is_none() {
                parsed.set_day(1).ok()?;
            }
        }
        parsed.to_naive_date().ok()
    }
}

/// Field schema plus extraction bounds and target table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Leading lines to skip before the header
    #[serde(default, deserialize_with = "lenient_usize")]
    pub skip_rows: usize,
    /// First column to keep (inclusive, zero-based)
    #[serde(default, deserialize_with = "lenient_usize")]
    pub start_column: usize,
    /// Last column to keep (exclusive)
    #[serde(deserialize_with = "lenient_usize")]
    pub end_column: usize,
    pub target_table_name: String,
    pub fields: Vec<FieldSpec>,
}

impl Schema {
    /// Look up a field by its source column name
    pub fn field(&self, source_name: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|f| f.source_field_name == source_name)
    }

    /// Fields declared as dates, in schema order
    pub fn date_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.is_date())
    }

    /// Validate the schema
    pub fn validate(&self) -> Result<(), String> {
        if self.target_table_name.trim().is_empty() {
            return Err("target_table_name must not be empty".to_string());
        }
        if self.fields.is_empty() {
            return Err("schema declares no fields".to_string());
        }
        if self.end_column <= self.start_column {
            return Err(format!(
                "end_column ({}) must be greater than start_column ({})",
                self.end_column, self.start_column
            ));
        }

        let mut targets = HashSet::new();
        for field in &self.fields {
            if !targets.insert(field.target_field_name.as_str()) {
                return Err(format!(
                    "duplicate target field name '{}'",
                    field.target_field_name
                ));
            }
            match field.data_type {
                DataType::Date if field.format.is_none() => {
                    return Err(format!(
                        "date field '{}' requires a format",
                        field.source_field_name
                    ));
                }
                DataType::Float if field.precision.is_none() || field.scale.is_none() => {
                    return Err(format!(
                        "float field '{}' requires precision and scale",
                        field.source_field_name
                    ));
                }
                _ => {}
            }
        }

        Ok(())
    }
}

/// `"y"`/`"n"` flags, also accepting booleans
mod yes_no {
    use super::*;
    use serde::Serializer;
    use serde::de::Error as _;

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "y" } else { "n" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Flag {
            Bool(bool),
            Text(String),
        }

        match Flag::deserialize(deserializer)? {
            Flag::Bool(b) => Ok(b),
            Flag::Text(s) => match s.trim().to_lowercase().as_str() {
                "y" | "yes" | "true" => Ok(true),
                "n" | "no" | "false" | "" => Ok(false),
                other => Err(D::Error::custom(format!(
                    "invalid not_null flag '{other}', expected \"y\" or \"n\""
                ))),
            },
        }
    }
}

/// Accepts `3` as well as `"3"`
fn lenient_usize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Int(usize),
        Text(String),
    }

    match Number::deserialize(deserializer)? {
        Number::Int(n) => Ok(n),
        Number::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("expected a non-negative integer, got '{s}'"))),
    }
}

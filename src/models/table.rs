//! In-memory table produced by the extractor

use chrono::NaiveDate;
use std::collections::HashSet;

use super::schema::DataType;

/// Cell text treated as a missing value
pub const NULL_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

static NULL: Value = Value::Null;

/// A single cell
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
}

impl Value {
    /// Build a cell from raw text, typing numeric cells by the declared type
    ///
    /// Numeric cells that fail to parse are kept as text so the database
    /// reports the mismatch rather than the value being silently lost.
    pub fn from_cell(raw: &str, data_type: Option<&DataType>) -> Self {
        let trimmed = raw.trim();
        if NULL_MARKERS.contains(&trimmed) {
            return Value::Null;
        }

        match data_type {
            Some(DataType::Integer) => trimmed
                .parse::<i64>()
                .map(Value::Integer)
                .unwrap_or_else(|_| Value::Text(raw.to_string())),
            Some(DataType::Float) => trimmed
                .parse::<f64>()
                .map(Value::Float)
                .unwrap_or_else(|_| Value::Text(raw.to_string())),
            _ => Value::Text(raw.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Text(s) => write!(f, "{}", s),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// A row and its original position in the source file
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Zero-based position among the data rows, stable across drops
    pub index: usize,
    pub values: Vec<Value>,
}

/// Ordered rows by named columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
    next_index: usize,
}

impl Table {
    /// Create an empty table with the given column names
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            next_index: 0,
        }
    }

    /// Append a row, padding or truncating to the column count
    ///
    /// Returns the index assigned to the row.
    pub fn push_row(&mut self, mut values: Vec<Value>) -> usize {
        values.resize(self.columns.len(), Value::Null);
        let index = self.next_index;
        self.rows.push(Row { index, values });
        self.next_index += 1;
        index
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `column` in `row`; `Null` when the column does not exist
    pub fn value<'a>(&self, row: &'a Row, column: &str) -> &'a Value {
        self.column_index(column)
            .and_then(|i| row.values.get(i))
            .unwrap_or(&NULL)
    }

    /// Drop every row whose original index is in `indices`
    ///
    /// Returns the number of rows removed.
    pub fn drop_rows(&mut self, indices: &HashSet<usize>) -> usize {
        let before = self.rows.len();
        self.rows.retain(|r| !indices.contains(&r.index));
        before - self.rows.len()
    }

    /// Mutable access to one column across all rows
    pub fn column_mut(&mut self, name: &str) -> Option<impl Iterator<Item = (usize, &mut Value)>> {
        let col = self.column_index(name)?;
        Some(
            self.rows
                .iter_mut()
                .filter_map(move |r| r.values.get_mut(col).map(|v| (r.index, v))),
        )
    }

    /// Render a row's values joined by commas
    pub fn render_row(&self, row: &Row) -> String {
        row.values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

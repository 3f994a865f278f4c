//! Target database abstraction
//!
//! The loader talks to the database only through [`TargetDatabase`]. The
//! connection descriptor is an opaque map handed to [`connect`], which picks
//! a backend from its `backend` key (DuckDB when absent).

pub mod error;

#[cfg(feature = "duckdb-backend")]
pub mod duckdb;

pub use error::{DatabaseError, DatabaseResult};

#[cfg(feature = "duckdb-backend")]
pub use self::duckdb::DuckDbTarget;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::Value;

/// Opaque connection parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionParams(serde_json::Map<String, serde_json::Value>);

impl ConnectionParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// String parameter, if present and a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// SQL dialect used to render DDL and DML
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Standard,
    #[default]
    DuckDb,
    MySql,
    Postgres,
}

impl Dialect {
    /// Quote an identifier, escaping embedded quote characters
    pub fn quote_identifier(&self, identifier: &str) -> String {
        match self {
            Dialect::MySql => format!("`{}`", identifier.replace('`', "``")),
            Dialect::Standard | Dialect::DuckDb | Dialect::Postgres => {
                format!("\"{}\"", identifier.replace('"', "\"\""))
            }
        }
    }

    /// Positional placeholder for the 1-based parameter `position`
    pub fn placeholder(&self, position: usize) -> String {
        match self {
            Dialect::Postgres => format!("${position}"),
            _ => "?".to_string(),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::DuckDb => write!(f, "duckdb"),
            Self::MySql => write!(f, "mysql"),
            Self::Postgres => write!(f, "postgres"),
        }
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" | "ansi" => Ok(Self::Standard),
            "duckdb" => Ok(Self::DuckDb),
            "mysql" | "mariadb" => Ok(Self::MySql),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            _ => Err(format!("Unknown dialect: {}", s)),
        }
    }
}

/// A relational database the loader can write into
///
/// Implementations hold one exclusive connection. `begin`/`commit`/`rollback`
/// bracket each batch.
pub trait TargetDatabase {
    /// Dialect used when the caller does not override it
    fn dialect(&self) -> Dialect;

    /// Execute a single statement without parameters
    fn execute(&mut self, sql: &str) -> DatabaseResult<()>;

    /// Open a transaction
    fn begin(&mut self) -> DatabaseResult<()>;

    /// Execute `sql` once per parameter tuple
    fn execute_many(&mut self, sql: &str, rows: &[Vec<&Value>]) -> DatabaseResult<()>;

    fn commit(&mut self) -> DatabaseResult<()>;

    fn rollback(&mut self) -> DatabaseResult<()>;
}

/// Open a connection from descriptor parameters
pub fn connect(params: &ConnectionParams) -> DatabaseResult<Box<dyn TargetDatabase>> {
    let backend = params.get_str("backend").unwrap_or("duckdb").to_lowercase();

    match backend.as_str() {
        #[cfg(feature = "duckdb-backend")]
        "duckdb" => Ok(Box::new(DuckDbTarget::from_params(params)?)),
        _ => Err(DatabaseError::Unsupported(backend)),
    }
}

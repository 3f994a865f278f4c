//! DuckDB target

use duckdb::types::{ToSql, ToSqlOutput};

use super::{ConnectionParams, DatabaseError, DatabaseResult, Dialect, TargetDatabase};
use crate::models::Value;

/// Embedded DuckDB database
pub struct DuckDbTarget {
    conn: duckdb::Connection,
    path: Option<String>,
}

impl DuckDbTarget {
    /// Open or create a database file
    pub fn open(path: &str) -> DatabaseResult<Self> {
        let conn = duckdb::Connection::open(path)
            .map_err(|e| DatabaseError::Connection(format!("{path}: {e}")))?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database
    pub fn memory() -> DatabaseResult<Self> {
        let conn = duckdb::Connection::open_in_memory()
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;
        Ok(Self { conn, path: None })
    }

    /// Open from descriptor parameters (`path` or `database`)
    pub fn from_params(params: &ConnectionParams) -> DatabaseResult<Self> {
        match params.get_str("path").or_else(|| params.get_str("database")) {
            None | Some(":memory:") => Self::memory(),
            Some(path) => Self::open(path),
        }
    }

    /// Get the database path (if not in-memory)
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Underlying connection, for queries outside the load path
    pub fn connection(&self) -> &duckdb::Connection {
        &self.conn
    }
}

impl TargetDatabase for DuckDbTarget {
    fn dialect(&self) -> Dialect {
        Dialect::DuckDb
    }

    fn execute(&mut self, sql: &str) -> DatabaseResult<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    fn begin(&mut self) -> DatabaseResult<()> {
        self.conn.execute_batch("BEGIN TRANSACTION")?;
        Ok(())
    }

    fn execute_many(&mut self, sql: &str, rows: &[Vec<&Value>]) -> DatabaseResult<()> {
        let mut stmt = self.conn.prepare(sql)?;
        for row in rows {
            stmt.execute(duckdb::params_from_iter(row.iter()))?;
        }
        Ok(())
    }

    fn commit(&mut self) -> DatabaseResult<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> DatabaseResult<()> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> duckdb::Result<ToSqlOutput<'_>> {
        use duckdb::types::Value as Sql;

        Ok(match self {
            Value::Null => ToSqlOutput::Owned(Sql::Null),
            Value::Text(s) => ToSqlOutput::Owned(Sql::Text(s.clone())),
            Value::Integer(n) => ToSqlOutput::Owned(Sql::BigInt(*n)),
            Value::Float(x) => ToSqlOutput::Owned(Sql::Double(*x)),
            Value::Date(d) => ToSqlOutput::Owned(Sql::Text(d.format("%Y-%m-%d").to_string())),
        })
    }
}

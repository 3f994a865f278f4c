//! Models module
//!
//! Defines the schema descriptor types and the in-memory table that flows
//! through extraction, validation, cleansing and loading.

pub mod schema;
pub mod table;

pub use schema::{DataType, FieldSpec, Schema};
pub use table::{Row, Table, Value};

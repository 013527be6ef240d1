//! Core types and traits for the Snowflake dialect of SQLModel Rust.
//!
//! This crate holds the collaborator-facing abstractions the Snowflake write
//! engine is built on:
//!
//! - `Model` trait plus static `FieldInfo` descriptors for table mapping
//! - `Value` / `Row` for parameters and result rows
//! - `Connection` and `RowCursor` traits for statement execution
//! - `Outcome` re-export from asupersync for cancel-correct operations
//! - `Cx` context for structured concurrency

// Re-export asupersync primitives for structured concurrency
pub use asupersync::{Cx, Outcome};

pub mod connection;
pub mod error;
pub mod field;
pub mod model;
pub mod row;
pub mod types;
pub mod value;

pub use connection::{BufferedCursor, Connection, RowCursor};
pub use error::{
    ConfigError, ConnectionError, ConnectionErrorKind, Error, QueryError, QueryErrorKind, Result,
    SchemaError, SchemaErrorKind, TypeError,
};
pub use field::FieldInfo;
pub use model::Model;
pub use row::{ColumnInfo, FromValue, Row};
pub use types::SqlType;
pub use value::Value;

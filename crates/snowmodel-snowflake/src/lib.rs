//! Snowflake dialect for SQLModel Rust.
//!
//! `snowmodel-snowflake` implements inserts and upserts for Snowflake,
//! which has no `RETURNING` clause. Generated values (identity columns,
//! column defaults) are read back from the table's change log right after
//! the write and bound onto the written models.
//!
//! # Role In The Architecture
//!
//! - Renders `INSERT` and `MERGE` statements from model metadata
//! - Recovers generated values with `CHANGES(...) BEFORE(statement=>LAST_QUERY_ID())`
//! - Provides naming, type mapping, pagination and migration for the dialect
//!
//! # Write pipeline
//!
//! ```text
//! ConflictResolver -> StatementBuilder -> Executor
//!     -> GeneratedValueRecoverer -> RowMatcher -> CreateReport
//! ```
//!
//! The write and its change-log read run back to back on one session.
//! [`executor::WriteReceipt`] holds the session between the two, so no other
//! statement can move `LAST_QUERY_ID()`.
//!
//! # Example
//!
//! ```rust,ignore
//! use snowmodel_snowflake::{ConflictSpec, SnowflakeDialect, WriteStrategy};
//!
//! let dialect = SnowflakeDialect::open("user:pass@account/db/schema");
//! let report = dialect
//!     .create_strategy()
//!     .create_many(&cx, &mut conn, &mut orders, Some(&ConflictSpec::do_nothing()))
//!     .await;
//! ```

pub mod clause;
pub mod config;
pub mod conflict;
pub mod create;
pub mod dialect;
pub mod executor;
pub mod matcher;
pub mod matrix;
pub mod migrate;
pub mod naming;
pub mod recover;
pub mod statement;
pub mod types;

pub use clause::{Limit, Offset, Pagination};
pub use config::{SNOWFLAKE_DRIVER_NAME, SnowflakeConfig};
pub use conflict::{ConflictResolver, ConflictSpec, Downgrade, Resolution, WritePath};
pub use create::{CreateReport, SnowflakeCreate, WriteStrategy};
pub use dialect::SnowflakeDialect;
pub use executor::{Executor, WriteReceipt};
pub use matcher::{RowMatcher, Shape};
pub use matrix::{ColumnSpec, TableSchema, ValueMatrix};
pub use migrate::Migrator;
pub use naming::{NamingStrategy, to_db_name};
pub use recover::{CursorGuard, GeneratedValueRecoverer, Recovery, ScanError};
pub use statement::{ChangeLogMode, Statement, StatementBuilder};
pub use types::data_type_of;

//! Warehouse connection traits.
//!
//! - [`Connection`] - executes parameterized statements on one session
//! - [`RowCursor`] - streams rows of an open result set
//! - [`BufferedCursor`] - a cursor over rows that are already materialized
//!
//! All operations integrate with asupersync's structured concurrency via `Cx`
//! for cancellation and timeout handling. Snowflake sessions carry state
//! between statements (`LAST_QUERY_ID()` among others), so a connection value
//! stands for exactly one session.

use crate::error::{Error, Result};
use crate::row::Row;
use crate::value::Value;
use asupersync::{Cx, Outcome};
use std::collections::VecDeque;

/// A warehouse session capable of executing statements.
///
/// Placeholders in `sql` are positional `?` markers bound from `params` in
/// order. Snowflake has no savepoints and no transactional DDL, so unlike
/// other drivers this trait carries no transaction API.
///
/// # Example
///
/// ```rust,ignore
/// let n = conn
///     .execute(&cx, "INSERT INTO USERS (NAME) VALUES (?);", &[Value::from("ada")])
///     .await;
/// ```
pub trait Connection: Send + Sync {
    /// Cursor type returned by [`open_cursor`](Connection::open_cursor).
    type Cursor: RowCursor;

    /// Execute a query and return all rows.
    fn query(
        &self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<Vec<Row>, Error>> + Send;

    /// Execute a query and return the first row, if any.
    fn query_one(
        &self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<Option<Row>, Error>> + Send {
        let rows = self.query(cx, sql, params);
        async move {
            match rows.await {
                Outcome::Ok(rows) => Outcome::Ok(rows.into_iter().next()),
                Outcome::Err(e) => Outcome::Err(e),
                Outcome::Cancelled(r) => Outcome::Cancelled(r),
                Outcome::Panicked(p) => Outcome::Panicked(p),
            }
        }
    }

    /// Execute a statement (INSERT, MERGE, DDL) and return rows affected.
    fn execute(
        &self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<u64, Error>> + Send;

    /// Execute a query and return a cursor over its rows.
    ///
    /// The caller owns the cursor and must close it; see [`RowCursor::close`].
    fn open_cursor(
        &self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<Self::Cursor, Error>> + Send;

    /// Check if the session is still alive.
    fn ping(&self, cx: &Cx) -> impl Future<Output = Outcome<(), Error>> + Send;

    /// Check if the session is valid (ping succeeds).
    fn is_valid(&self, cx: &Cx) -> impl Future<Output = bool> + Send {
        let ping = self.ping(cx);
        async move { matches!(ping.await, Outcome::Ok(())) }
    }

    /// Close the session gracefully.
    fn close(self, cx: &Cx) -> impl Future<Output = Result<()>> + Send;
}

/// An open result set read one row at a time.
pub trait RowCursor: Send {
    /// Fetch the next row, or `None` once the result set is exhausted.
    fn next(&mut self, cx: &Cx) -> impl Future<Output = Outcome<Option<Row>, Error>> + Send;

    /// Release the result set.
    ///
    /// Must be idempotent: scope guards call it on drop even after an
    /// explicit close.
    fn close(&mut self);

    /// Whether [`close`](RowCursor::close) has been called.
    fn is_closed(&self) -> bool;
}

/// A [`RowCursor`] over rows that were fetched eagerly.
///
/// Drivers without server-side cursors return this from `open_cursor`.
#[derive(Debug, Default)]
pub struct BufferedCursor {
    rows: VecDeque<Row>,
    closed: bool,
}

impl BufferedCursor {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows: rows.into(),
            closed: false,
        }
    }

    /// Rows not yet fetched.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl RowCursor for BufferedCursor {
    fn next(&mut self, cx: &Cx) -> impl Future<Output = Outcome<Option<Row>, Error>> + Send {
        let next = if self.closed {
            Outcome::Err(Error::Custom("cursor is closed".to_string()))
        } else if let Some(reason) = cx.cancel_reason() {
            Outcome::Cancelled(reason)
        } else {
            Outcome::Ok(self.rows.pop_front())
        };
        async move { next }
    }

    fn close(&mut self) {
        self.rows.clear();
        self.closed = true;
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

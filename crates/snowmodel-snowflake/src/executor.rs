//! Write execution.
//!
//! `LAST_QUERY_ID()` refers to the previous statement of the session, so the
//! change-log read must directly follow the write on the same connection.
//! [`WriteReceipt`] keeps the exclusive borrow of the connection from the
//! write until recovery consumes it, so nothing can run in between.

use snowmodel_core::{Connection, Cx, Error, Outcome};

use crate::conflict::WritePath;
use crate::statement::Statement;

/// Runs write statements on one session.
#[derive(Debug)]
pub struct Executor<'c, C: Connection> {
    conn: &'c mut C,
}

impl<'c, C: Connection> Executor<'c, C> {
    pub fn new(conn: &'c mut C) -> Self {
        Self { conn }
    }

    /// Execute `statement` and hand the session over to a receipt.
    ///
    /// Nothing is executed when cancellation is already requested.
    #[tracing::instrument(level = "debug", skip(self, cx, statement))]
    pub async fn execute(
        self,
        cx: &Cx,
        table: &str,
        path: WritePath,
        statement: &Statement,
    ) -> Outcome<WriteReceipt<'c, C>, Error> {
        if let Some(reason) = cx.cancel_reason() {
            return Outcome::Cancelled(reason);
        }

        tracing::trace!(sql = %statement.sql, params = statement.params.len(), "Executing write");
        tracing::trace!(sql = %statement.explain(), "Explained write");

        match self.conn.execute(cx, &statement.sql, &statement.params).await {
            Outcome::Ok(rows_affected) => {
                tracing::debug!(rows_affected, %path, "Write executed");
                Outcome::Ok(WriteReceipt {
                    conn: self.conn,
                    table: table.to_string(),
                    path,
                    rows_affected,
                })
            }
            Outcome::Err(e) => {
                tracing::debug!(error = %e, "Write failed");
                Outcome::Err(e)
            }
            Outcome::Cancelled(r) => Outcome::Cancelled(r),
            Outcome::Panicked(p) => Outcome::Panicked(p),
        }
    }
}

/// Proof that a write ran, holding its session until recovery.
#[derive(Debug)]
pub struct WriteReceipt<'c, C: Connection> {
    conn: &'c mut C,
    table: String,
    path: WritePath,
    rows_affected: u64,
}

impl<'c, C: Connection> WriteReceipt<'c, C> {
    /// Rows the warehouse reported as affected.
    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    pub fn path(&self) -> WritePath {
        self.path
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Release the session without recovering generated values.
    pub fn finish(self) -> u64 {
        self.rows_affected
    }

    /// Give up the session to run the statement that must follow the write.
    pub(crate) fn into_connection(self) -> &'c mut C {
        self.conn
    }
}

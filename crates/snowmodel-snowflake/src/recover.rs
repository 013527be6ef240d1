//! Generated-value recovery through the change log.
//!
//! Snowflake has no `RETURNING`. Tables are created with change tracking,
//! so the rows written by the previous statement can be read back with
//! `CHANGES(...) BEFORE(statement=>LAST_QUERY_ID())`.

use snowmodel_core::{Connection, Cx, Error, Outcome, Row, RowCursor};

use crate::conflict::WritePath;
use crate::executor::WriteReceipt;
use crate::matrix::{ColumnSpec, TableSchema};
use crate::statement::{ChangeLogMode, StatementBuilder};

/// A change-log row that could not be bound to its target.
#[derive(Debug)]
pub struct ScanError {
    /// Position of the target in the written collection
    pub target: usize,
    pub error: Error,
}

/// What happened to generated values after a successful write.
#[derive(Debug)]
pub enum Recovery {
    /// The table has no generated columns, or recovery is disabled
    NotRequired,
    /// The change log was read to the end or every eligible target was bound
    Recovered {
        rows: usize,
        scan_errors: Vec<ScanError>,
    },
    /// Reading the change log failed; the write stays committed
    Failed { rows: usize, error: Error },
    /// Cancellation arrived after the write; remaining targets keep zero values
    Interrupted { rows: usize },
}

impl Recovery {
    /// Targets that received generated values.
    pub fn rows(&self) -> usize {
        match self {
            Recovery::NotRequired => 0,
            Recovery::Recovered { rows, .. }
            | Recovery::Failed { rows, .. }
            | Recovery::Interrupted { rows } => *rows,
        }
    }

    /// Whether recovery ran to completion without errors.
    pub fn is_complete(&self) -> bool {
        match self {
            Recovery::NotRequired => true,
            Recovery::Recovered { scan_errors, .. } => scan_errors.is_empty(),
            Recovery::Failed { .. } | Recovery::Interrupted { .. } => false,
        }
    }
}

/// Closes the wrapped cursor when dropped.
#[derive(Debug)]
pub struct CursorGuard<R: RowCursor> {
    cursor: R,
}

impl<R: RowCursor> CursorGuard<R> {
    pub fn new(cursor: R) -> Self {
        Self { cursor }
    }

    /// Fetch the next change-log row.
    pub async fn next(&mut self, cx: &Cx) -> Outcome<Option<Row>, Error> {
        self.cursor.next(cx).await
    }

    /// Close the cursor now.
    pub fn close(mut self) {
        self.cursor.close();
    }
}

impl<R: RowCursor> Drop for CursorGuard<R> {
    fn drop(&mut self) {
        if !self.cursor.is_closed() {
            self.cursor.close();
        }
    }
}

/// Opens the change-log read that follows a write.
#[derive(Debug, Clone, Copy)]
pub struct GeneratedValueRecoverer<'s> {
    schema: &'s TableSchema,
    plain_insert_mode: ChangeLogMode,
}

impl<'s> GeneratedValueRecoverer<'s> {
    pub fn new(schema: &'s TableSchema) -> Self {
        Self {
            schema,
            plain_insert_mode: ChangeLogMode::Default,
        }
    }

    /// Change-log mode used after plain inserts.
    pub fn plain_insert_mode(mut self, mode: ChangeLogMode) -> Self {
        self.plain_insert_mode = mode;
        self
    }

    /// Change-log mode for a write path.
    ///
    /// MERGE also reports matched rows as changes; only inserted rows carry
    /// fresh generated values, so merges read `APPEND_ONLY`.
    pub fn mode_for(&self, path: WritePath) -> ChangeLogMode {
        match path {
            WritePath::PlainInsert => self.plain_insert_mode,
            WritePath::MergeUpsert => ChangeLogMode::AppendOnly,
        }
    }

    /// Read `columns` of the rows the receipt's write produced.
    #[tracing::instrument(level = "debug", skip_all, fields(table = %receipt.table()))]
    pub async fn open<C: Connection>(
        &self,
        cx: &Cx,
        receipt: WriteReceipt<'_, C>,
        columns: &[&ColumnSpec],
    ) -> Outcome<CursorGuard<C::Cursor>, Error> {
        let mode = self.mode_for(receipt.path());

        if let Some(reason) = cx.cancel_reason() {
            tracing::warn!(
                ?reason,
                rows_affected = receipt.rows_affected(),
                "Cancelled before generated values were read back"
            );
            return Outcome::Cancelled(reason);
        }

        let statement = StatementBuilder::new(self.schema).change_log(columns, mode);
        tracing::trace!(sql = %statement.sql, %mode, "Reading change log");

        let conn = receipt.into_connection();
        match conn.open_cursor(cx, &statement.sql, &statement.params).await {
            Outcome::Ok(cursor) => Outcome::Ok(CursorGuard::new(cursor)),
            Outcome::Err(e) => {
                tracing::warn!(error = %e, "Change log read failed");
                Outcome::Err(e)
            }
            Outcome::Cancelled(r) => Outcome::Cancelled(r),
            Outcome::Panicked(p) => Outcome::Panicked(p),
        }
    }
}

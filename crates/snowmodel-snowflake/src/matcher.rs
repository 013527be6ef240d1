//! Binding change-log rows back onto the written targets.
//!
//! The change log returns no row identity. Rows are matched to targets by
//! position: the i-th change-log row belongs to the i-th target that could
//! have produced a new row.

use snowmodel_core::{Cx, Error, Model, Outcome, Row, RowCursor};

use crate::conflict::WritePath;
use crate::matrix::{ColumnSpec, TableSchema};
use crate::recover::{CursorGuard, Recovery, ScanError};

/// Whether the write covered one object or a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Single,
    Collection,
}

/// Correlates change-log rows with targets and writes the values back.
#[derive(Debug, Clone, Copy)]
pub struct RowMatcher<'s> {
    schema: &'s TableSchema,
    path: WritePath,
}

impl<'s> RowMatcher<'s> {
    pub fn new(schema: &'s TableSchema, path: WritePath) -> Self {
        Self { schema, path }
    }

    /// Whether `target` produced a new row and so consumes a change-log row.
    ///
    /// Every target of a plain insert does. For a MERGE only targets without
    /// a key do: their prioritized primary key is zero, or, when the key is
    /// not generated, all their generated columns are zero.
    pub fn is_eligible<M: Model>(&self, target: &M) -> bool {
        match self.path {
            WritePath::PlainInsert => true,
            WritePath::MergeUpsert => match self.schema.prioritized_primary() {
                Some(key) if key.is_generated() => target.column_value(key.field).is_zero(),
                _ => self
                    .schema
                    .generated()
                    .iter()
                    .all(|column| target.column_value(column.field).is_zero()),
            },
        }
    }

    /// Bind cursor rows onto `targets`, stopping when either runs out.
    ///
    /// Row errors are collected per target and do not stop the walk. A
    /// failing or cancelled cursor ends the walk with what was bound so far.
    #[tracing::instrument(level = "debug", skip_all, fields(table = %self.schema.table(), targets = targets.len()))]
    pub async fn bind<M: Model, R: RowCursor>(
        &self,
        cx: &Cx,
        cursor: &mut CursorGuard<R>,
        targets: &mut [M],
        columns: &[&ColumnSpec],
        shape: Shape,
    ) -> Outcome<Recovery, Error> {
        let mut rows = 0;
        let mut scan_errors = Vec::new();

        let eligible = targets
            .iter_mut()
            .enumerate()
            .filter(|(_, target)| shape == Shape::Single || self.is_eligible(&**target));

        for (index, target) in eligible {
            let row = match cursor.next(cx).await {
                Outcome::Ok(Some(row)) => row,
                Outcome::Ok(None) => break,
                Outcome::Err(error) => {
                    tracing::warn!(%error, rows, "Change log cursor failed");
                    return Outcome::Ok(Recovery::Failed { rows, error });
                }
                Outcome::Cancelled(reason) => {
                    tracing::warn!(?reason, rows, "Recovery interrupted");
                    return Outcome::Ok(Recovery::Interrupted { rows });
                }
                Outcome::Panicked(p) => return Outcome::Panicked(p),
            };

            match scan(target, row, columns) {
                Ok(()) => rows += 1,
                Err(error) => {
                    tracing::warn!(target_index = index, %error, "Failed to bind generated values");
                    scan_errors.push(ScanError {
                        target: index,
                        error,
                    });
                }
            }

            if shape == Shape::Single {
                break;
            }
        }

        tracing::debug!(rows, scan_errors = scan_errors.len(), "Generated values recovered");
        Outcome::Ok(Recovery::Recovered { rows, scan_errors })
    }
}

/// Assign the i-th row value to the i-th generated column.
#[allow(clippy::result_large_err)]
fn scan<M: Model>(target: &mut M, row: Row, columns: &[&ColumnSpec]) -> Result<(), Error> {
    if row.len() < columns.len() {
        return Err(Error::Custom(format!(
            "change log row has {} values, expected {}",
            row.len(),
            columns.len()
        )));
    }
    for (column, value) in columns.iter().zip(row.into_values()) {
        target.set_column(column.field, value)?;
    }
    Ok(())
}

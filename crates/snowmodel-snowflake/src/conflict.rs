//! Upsert policy resolution.
//!
//! Snowflake has no `ON CONFLICT`; upserts are emulated with `MERGE` keyed
//! on the primary key. That only works when the primary key is known and
//! written, otherwise the write falls back to a plain insert.

use std::fmt;

use serde::{Deserialize, Serialize};
use snowmodel_core::{Error, Result, SchemaErrorKind};

use crate::matrix::{ColumnSpec, TableSchema, ValueMatrix};

/// Requested behavior when a written row collides with an existing key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictSpec {
    /// Leave colliding rows untouched
    pub do_nothing: bool,
    /// Columns overwritten on collision
    pub update_columns: Vec<String>,
    /// Overwrite every written column on collision except keys and
    /// warehouse-defaulted columns
    pub update_all: bool,
}

impl ConflictSpec {
    /// Skip colliding rows.
    pub fn do_nothing() -> Self {
        Self {
            do_nothing: true,
            ..Default::default()
        }
    }

    /// Overwrite the given columns on collision.
    pub fn do_update<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            update_columns: columns.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Overwrite every written non-key column on collision.
    pub fn update_all() -> Self {
        Self {
            update_all: true,
            ..Default::default()
        }
    }
}

/// Statement family chosen for a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WritePath {
    PlainInsert,
    MergeUpsert,
}

impl fmt::Display for WritePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WritePath::PlainInsert => write!(f, "plain insert"),
            WritePath::MergeUpsert => write!(f, "merge upsert"),
        }
    }
}

/// Why a requested upsert was carried out as a plain insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Downgrade {
    /// The table declares no primary key
    NoPrimaryKey,
    /// These primary key columns are not among the written columns
    PrimaryKeyNotWritten { missing: Vec<String> },
}

impl fmt::Display for Downgrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Downgrade::NoPrimaryKey => write!(f, "table has no primary key"),
            Downgrade::PrimaryKeyNotWritten { missing } => {
                write!(f, "primary key column(s) not written: {}", missing.join(", "))
            }
        }
    }
}

/// Outcome of conflict resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub path: WritePath,
    /// Columns for `WHEN MATCHED THEN UPDATE SET`, empty for "do nothing"
    pub update_columns: Vec<String>,
    pub downgrade: Option<Downgrade>,
}

impl Resolution {
    fn plain(downgrade: Option<Downgrade>) -> Self {
        Self {
            path: WritePath::PlainInsert,
            update_columns: Vec::new(),
            downgrade,
        }
    }
}

/// Decides between a plain insert and a MERGE upsert.
#[derive(Debug, Clone, Copy)]
pub struct ConflictResolver<'a> {
    schema: &'a TableSchema,
    strict: bool,
}

impl<'a> ConflictResolver<'a> {
    pub fn new(schema: &'a TableSchema) -> Self {
        Self {
            schema,
            strict: false,
        }
    }

    /// Turn downgrades into `ConflictTarget` schema errors.
    ///
    /// A downgrade whose only missing keys are generated is still accepted:
    /// such a write inserts fresh rows and cannot collide.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Resolve the requested policy against the written columns.
    #[allow(clippy::result_large_err)]
    pub fn resolve(&self, spec: Option<&ConflictSpec>, matrix: &ValueMatrix) -> Result<Resolution> {
        let Some(spec) = spec else {
            return Ok(Resolution::plain(None));
        };

        let keys: Vec<&str> = self
            .schema
            .primary_keys()
            .map(|column| column.name.as_str())
            .collect();

        let downgrade = if keys.is_empty() {
            Some(Downgrade::NoPrimaryKey)
        } else {
            let missing: Vec<String> = keys
                .iter()
                .filter(|key| !matrix.contains_column(key))
                .map(|key| (*key).to_string())
                .collect();
            if missing.is_empty() {
                None
            } else {
                Some(Downgrade::PrimaryKeyNotWritten { missing })
            }
        };

        if let Some(downgrade) = downgrade {
            if self.strict && !self.is_collision_free(&downgrade) {
                return Err(Error::schema(
                    SchemaErrorKind::ConflictTarget,
                    format!(
                        "cannot upsert into {}: {}",
                        self.schema.table(),
                        downgrade
                    ),
                ));
            }
            tracing::warn!(
                table = %self.schema.table(),
                reason = %downgrade,
                "Upsert downgraded to plain insert"
            );
            return Ok(Resolution::plain(Some(downgrade)));
        }

        let update_columns = self.update_columns(spec, matrix)?;
        Ok(Resolution {
            path: WritePath::MergeUpsert,
            update_columns,
            downgrade: None,
        })
    }

    /// Whether a downgraded write cannot collide with existing rows.
    ///
    /// Generated key columns are left out of the matrix only when every
    /// target leaves them zero, so every target gets a fresh key.
    fn is_collision_free(&self, downgrade: &Downgrade) -> bool {
        match downgrade {
            Downgrade::NoPrimaryKey => false,
            Downgrade::PrimaryKeyNotWritten { missing } => missing.iter().all(|key| {
                self.schema
                    .column(key)
                    .is_some_and(ColumnSpec::is_generated)
            }),
        }
    }

    #[allow(clippy::result_large_err)]
    fn update_columns(&self, spec: &ConflictSpec, matrix: &ValueMatrix) -> Result<Vec<String>> {
        if spec.do_nothing {
            return Ok(Vec::new());
        }

        if spec.update_all {
            return Ok(matrix
                .columns()
                .iter()
                .filter(|column| !column.primary_key && !column.is_generated())
                .map(|column| column.name.clone())
                .collect());
        }

        spec.update_columns
            .iter()
            .map(|requested| {
                matrix
                    .columns()
                    .iter()
                    .find(|column| column.name.eq_ignore_ascii_case(requested))
                    .map(|column| column.name.clone())
                    .ok_or_else(|| {
                        Error::schema(
                            SchemaErrorKind::ColumnNotFound,
                            format!(
                                "update column {} is not written to {}",
                                requested,
                                self.schema.table()
                            ),
                        )
                    })
            })
            .collect()
    }
}

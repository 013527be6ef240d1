//! Table management for Snowflake.
//!
//! Tables are always created with `CHANGE_TRACKING = TRUE`; generated-value
//! recovery reads the change log and fails on tables without it.
//! Snowflake has no indexes, so index operations succeed without doing
//! anything.

use snowmodel_core::{
    Connection, Cx, Error, FieldInfo, Model, Outcome, Result, SchemaErrorKind, Value,
};

use crate::matrix::TableSchema;
use crate::naming::NamingStrategy;
use crate::types::data_type_of;

/// Schema operations for models.
#[derive(Debug, Clone, Default)]
pub struct Migrator {
    naming: NamingStrategy,
    table_options: Option<String>,
}

impl Migrator {
    pub fn new(naming: NamingStrategy) -> Self {
        Self {
            naming,
            table_options: None,
        }
    }

    /// Options appended to `CREATE TABLE`, before change tracking.
    pub fn table_options(mut self, options: impl Into<String>) -> Self {
        self.table_options = Some(options.into());
        self
    }

    /// Column type with its constraints, as used in `CREATE TABLE`.
    pub fn full_data_type_of(&self, field: &FieldInfo) -> String {
        let mut sql = data_type_of(field);
        if !field.nullable {
            sql.push_str(" NOT NULL");
        }
        if field.unique {
            sql.push_str(" UNIQUE");
        }
        if let Some(default) = field.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }
        sql
    }

    /// Render `CREATE TABLE` for a model.
    pub fn create_table_sql<M: Model>(&self) -> String {
        let schema = TableSchema::of::<M>(&self.naming);

        let mut parts: Vec<String> = schema
            .columns()
            .iter()
            .zip(M::fields())
            .map(|(column, field)| format!("{} {}", column.name, self.full_data_type_of(field)))
            .collect();

        let keys: Vec<&str> = schema.primary_keys().map(|c| c.name.as_str()).collect();
        if !keys.is_empty() {
            parts.push(format!("PRIMARY KEY ({})", keys.join(",")));
        }

        let mut sql = format!("CREATE TABLE {} ({})", schema.table(), parts.join(","));
        if let Some(options) = &self.table_options {
            sql.push(' ');
            sql.push_str(options);
        }
        sql.push_str(" CHANGE_TRACKING = TRUE");
        sql
    }

    /// Create the model's table.
    #[tracing::instrument(level = "debug", skip(self, cx, conn), fields(table = M::TABLE_NAME))]
    pub async fn create_table<C: Connection, M: Model>(&self, cx: &Cx, conn: &C) -> Outcome<(), Error> {
        let sql = self.create_table_sql::<M>();
        tracing::trace!(sql = %sql, "Creating table");
        conn.execute(cx, &sql, &[]).await.map(|_| ())
    }

    /// Drop the model's table if it exists.
    pub async fn drop_table<C: Connection, M: Model>(&self, cx: &Cx, conn: &C) -> Outcome<(), Error> {
        let schema = TableSchema::of::<M>(&self.naming);
        let sql = format!("DROP TABLE IF EXISTS {}", schema.table());
        conn.execute(cx, &sql, &[]).await.map(|_| ())
    }

    /// Name of the session's current database.
    pub async fn current_database<C: Connection>(&self, cx: &Cx, conn: &C) -> Outcome<String, Error> {
        match conn.query_one(cx, "SELECT CURRENT_DATABASE()", &[]).await {
            Outcome::Ok(Some(row)) => match row.get_as::<Option<String>>(0) {
                Ok(Some(name)) => Outcome::Ok(name),
                Ok(None) => Outcome::Err(Error::Custom(
                    "session has no current database".to_string(),
                )),
                Err(e) => Outcome::Err(e),
            },
            Outcome::Ok(None) => Outcome::Err(Error::Custom(
                "CURRENT_DATABASE() returned no row".to_string(),
            )),
            Outcome::Err(e) => Outcome::Err(e),
            Outcome::Cancelled(r) => Outcome::Cancelled(r),
            Outcome::Panicked(p) => Outcome::Panicked(p),
        }
    }

    /// Whether the model's table exists in the current database.
    pub async fn has_table<C: Connection, M: Model>(&self, cx: &Cx, conn: &C) -> Outcome<bool, Error> {
        let database = match self.current_database(cx, conn).await {
            Outcome::Ok(name) => name,
            Outcome::Err(e) => return Outcome::Err(e),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        };
        let schema = TableSchema::of::<M>(&self.naming);
        exists(
            cx,
            conn,
            "SELECT count(*) FROM INFORMATION_SCHEMA.TABLES WHERE table_name = ? AND table_catalog = ?",
            &[
                Value::Text(schema.table().to_uppercase()),
                Value::Text(database),
            ],
        )
        .await
    }

    /// Whether a column exists; `field` may be a field name or a column name.
    pub async fn has_column<C: Connection, M: Model>(
        &self,
        cx: &Cx,
        conn: &C,
        field: &str,
    ) -> Outcome<bool, Error> {
        let database = match self.current_database(cx, conn).await {
            Outcome::Ok(name) => name,
            Outcome::Err(e) => return Outcome::Err(e),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        };
        let schema = TableSchema::of::<M>(&self.naming);
        let column = schema
            .columns()
            .iter()
            .find(|c| c.field == field)
            .map_or_else(|| field.to_uppercase(), |c| c.name.to_uppercase());
        exists(
            cx,
            conn,
            "SELECT count(*) FROM INFORMATION_SCHEMA.columns WHERE table_catalog = ? AND table_name = ? AND column_name = ?",
            &[
                Value::Text(database),
                Value::Text(schema.table().to_uppercase()),
                Value::Text(column),
            ],
        )
        .await
    }

    /// Whether a named constraint exists on the model's table.
    pub async fn has_constraint<C: Connection, M: Model>(
        &self,
        cx: &Cx,
        conn: &C,
        name: &str,
    ) -> Outcome<bool, Error> {
        let database = match self.current_database(cx, conn).await {
            Outcome::Ok(name) => name,
            Outcome::Err(e) => return Outcome::Err(e),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        };
        let schema = TableSchema::of::<M>(&self.naming);
        exists(
            cx,
            conn,
            "SELECT count(*) FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS WHERE CONSTRAINT_NAME = ? AND TABLE_NAME = ? AND TABLE_CATALOG = ?",
            &[
                Value::Text(name.to_uppercase()),
                Value::Text(schema.table().to_uppercase()),
                Value::Text(database),
            ],
        )
        .await
    }

    /// Add the column backing `field` to the model's table.
    pub async fn add_column<C: Connection, M: Model>(
        &self,
        cx: &Cx,
        conn: &C,
        field: &str,
    ) -> Outcome<(), Error> {
        let sql = match self.add_column_sql::<M>(field) {
            Ok(sql) => sql,
            Err(e) => return Outcome::Err(e),
        };
        conn.execute(cx, &sql, &[]).await.map(|_| ())
    }

    /// Render `ALTER TABLE ... ADD COLUMN` for a field.
    #[allow(clippy::result_large_err)]
    pub fn add_column_sql<M: Model>(&self, field: &str) -> Result<String> {
        let schema = TableSchema::of::<M>(&self.naming);
        let (column, info) = schema
            .columns()
            .iter()
            .zip(M::fields())
            .find(|(column, _)| column.field == field || column.name.eq_ignore_ascii_case(field))
            .ok_or_else(|| {
                Error::schema(
                    SchemaErrorKind::ColumnNotFound,
                    format!("failed to look up field with name: {}", field),
                )
            })?;
        Ok(format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            schema.table(),
            column.name,
            self.full_data_type_of(info)
        ))
    }

    /// Create the table if missing, otherwise add missing columns.
    #[tracing::instrument(level = "debug", skip(self, cx, conn), fields(table = M::TABLE_NAME))]
    pub async fn auto_migrate<C: Connection, M: Model>(&self, cx: &Cx, conn: &C) -> Outcome<(), Error> {
        match self.has_table::<C, M>(cx, conn).await {
            Outcome::Ok(false) => return self.create_table::<C, M>(cx, conn).await,
            Outcome::Ok(true) => {}
            Outcome::Err(e) => return Outcome::Err(e),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        }

        for field in M::fields() {
            match self.has_column::<C, M>(cx, conn, field.name).await {
                Outcome::Ok(true) => continue,
                Outcome::Ok(false) => {
                    tracing::debug!(field = field.name, "Adding missing column");
                    match self.add_column::<C, M>(cx, conn, field.name).await {
                        Outcome::Ok(()) => {}
                        Outcome::Err(e) => return Outcome::Err(e),
                        Outcome::Cancelled(r) => return Outcome::Cancelled(r),
                        Outcome::Panicked(p) => return Outcome::Panicked(p),
                    }
                }
                Outcome::Err(e) => return Outcome::Err(e),
                Outcome::Cancelled(r) => return Outcome::Cancelled(r),
                Outcome::Panicked(p) => return Outcome::Panicked(p),
            }
        }
        Outcome::Ok(())
    }

    /// Snowflake has no indexes; reports every index as present.
    pub fn has_index<M: Model>(&self, _name: &str) -> bool {
        true
    }

    /// No-op: Snowflake has no indexes.
    #[allow(clippy::result_large_err)]
    pub fn create_index<M: Model>(&self, _name: &str) -> Result<()> {
        Ok(())
    }

    /// No-op: Snowflake has no indexes.
    #[allow(clippy::result_large_err)]
    pub fn drop_index<M: Model>(&self, _name: &str) -> Result<()> {
        Ok(())
    }

    /// No-op: Snowflake has no indexes.
    #[allow(clippy::result_large_err)]
    pub fn rename_index<M: Model>(&self, _old: &str, _new: &str) -> Result<()> {
        Ok(())
    }
}

async fn exists<C: Connection>(cx: &Cx, conn: &C, sql: &str, params: &[Value]) -> Outcome<bool, Error> {
    match conn.query_one(cx, sql, params).await {
        Outcome::Ok(Some(row)) => match row.get_as::<i64>(0) {
            Ok(count) => Outcome::Ok(count > 0),
            Err(e) => Outcome::Err(e),
        },
        Outcome::Ok(None) => Outcome::Ok(false),
        Outcome::Err(e) => Outcome::Err(e),
        Outcome::Cancelled(r) => Outcome::Cancelled(r),
        Outcome::Panicked(p) => Outcome::Panicked(p),
    }
}

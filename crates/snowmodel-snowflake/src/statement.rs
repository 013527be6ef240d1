//! Statement rendering for inserts, MERGE upserts and change-log reads.
//!
//! Identifiers are emitted without quotes and values are always bound
//! through positional `?` placeholders.

use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};
use snowmodel_core::{Error, Result, Value};

use crate::conflict::{Resolution, WritePath};
use crate::matrix::{ColumnSpec, TableSchema, ValueMatrix};

/// Alias of the source rows inside a MERGE.
pub const EXCLUDED: &str = "excluded";

/// SQL text plus its parameters in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Render with parameters inlined, for logging only.
    pub fn explain(&self) -> String {
        explain(&self.sql, &self.params)
    }
}

/// `INFORMATION =>` mode of a change-log read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeLogMode {
    /// Net row changes, including updates and deletes
    #[default]
    Default,
    /// Inserted rows only
    AppendOnly,
}

impl ChangeLogMode {
    pub const fn as_sql(self) -> &'static str {
        match self {
            ChangeLogMode::Default => "DEFAULT",
            ChangeLogMode::AppendOnly => "APPEND_ONLY",
        }
    }
}

impl fmt::Display for ChangeLogMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Renders the statements of one write against one table.
#[derive(Debug, Clone, Copy)]
pub struct StatementBuilder<'a> {
    schema: &'a TableSchema,
}

impl<'a> StatementBuilder<'a> {
    pub fn new(schema: &'a TableSchema) -> Self {
        Self { schema }
    }

    /// Render the write chosen by conflict resolution.
    #[allow(clippy::result_large_err)]
    pub fn build(&self, matrix: &ValueMatrix, resolution: &Resolution) -> Result<Statement> {
        match resolution.path {
            WritePath::PlainInsert => self.insert(matrix),
            WritePath::MergeUpsert => self.merge(matrix, &resolution.update_columns),
        }
    }

    /// `INSERT INTO T (C1,C2) VALUES (?,?),(?,?);`
    ///
    /// With no columns to write, a single row renders as
    /// `INSERT INTO T VALUES (DEFAULT);`; more rows are rejected.
    #[allow(clippy::result_large_err)]
    pub fn insert(&self, matrix: &ValueMatrix) -> Result<Statement> {
        let table = self.schema.table();

        if matrix.width() == 0 {
            if matrix.len() != 1 {
                return Err(Error::unsupported(format!(
                    "cannot insert {} rows of only default values into {}",
                    matrix.len(),
                    table
                )));
            }
            return Ok(Statement::new(
                format!("INSERT INTO {} VALUES (DEFAULT);", table),
                Vec::new(),
            ));
        }
        ensure_rows(matrix, table)?;

        let sql = format!(
            "INSERT INTO {} ({}) VALUES {};",
            table,
            column_list(matrix.columns()),
            placeholder_rows(matrix)
        );
        Ok(Statement::new(sql, matrix.params()))
    }

    /// Render a MERGE that upserts the matrix rows keyed on the primary key.
    ///
    /// The prioritized primary key is left out of the insert branch when it
    /// auto-increments.
    #[allow(clippy::result_large_err)]
    pub fn merge(&self, matrix: &ValueMatrix, update_columns: &[String]) -> Result<Statement> {
        let table = self.schema.table();
        ensure_rows(matrix, table)?;

        let generated_key = self
            .schema
            .prioritized_primary()
            .filter(|key| key.auto_increment)
            .map(|key| key.name.as_str());

        let insertable: Vec<&str> = matrix
            .columns()
            .iter()
            .map(|column| column.name.as_str())
            .filter(|name| Some(*name) != generated_key)
            .collect();
        if insertable.is_empty() {
            return Err(Error::unsupported(format!(
                "merge into {} has no insertable columns",
                table
            )));
        }

        let on = self
            .schema
            .primary_keys()
            .map(|key| format!("{table}.{name} = {EXCLUDED}.{name}", name = key.name))
            .collect::<Vec<_>>()
            .join(" AND ");

        let mut sql = String::new();
        let _ = write!(
            sql,
            "MERGE INTO {} USING (VALUES {}) AS {} ({}) ON {}",
            table,
            placeholder_rows(matrix),
            EXCLUDED,
            column_list(matrix.columns()),
            on
        );

        if !update_columns.is_empty() {
            let set = update_columns
                .iter()
                .map(|name| format!("{name} = {EXCLUDED}.{name}"))
                .collect::<Vec<_>>()
                .join(",");
            let _ = write!(sql, " WHEN MATCHED THEN UPDATE SET {}", set);
        }

        let values = insertable
            .iter()
            .map(|name| format!("{EXCLUDED}.{name}"))
            .collect::<Vec<_>>()
            .join(",");
        let _ = write!(
            sql,
            " WHEN NOT MATCHED THEN INSERT ({}) VALUES ({});",
            insertable.join(","),
            values
        );

        Ok(Statement::new(sql, matrix.params()))
    }

    /// Read `columns` for the rows changed by the previous statement of the session.
    pub fn change_log(&self, columns: &[&ColumnSpec], mode: ChangeLogMode) -> Statement {
        let list = columns
            .iter()
            .map(|column| column.name.as_str())
            .collect::<Vec<_>>()
            .join(",");
        Statement::new(
            format!(
                "SELECT {} FROM {} CHANGES(INFORMATION => {}) BEFORE(statement=>LAST_QUERY_ID());",
                list,
                self.schema.table(),
                mode
            ),
            Vec::new(),
        )
    }
}

#[allow(clippy::result_large_err)]
fn ensure_rows(matrix: &ValueMatrix, table: &str) -> Result<()> {
    if matrix.is_empty() {
        return Err(Error::unsupported(format!("no rows to write into {}", table)));
    }
    Ok(())
}

fn column_list(columns: &[ColumnSpec]) -> String {
    columns
        .iter()
        .map(|column| column.name.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

fn placeholder_rows(matrix: &ValueMatrix) -> String {
    let row = format!("({})", vec!["?"; matrix.width()].join(","));
    vec![row; matrix.len()].join(",")
}

/// Inline parameters into `sql` for logging.
///
/// Text is single-quoted with embedded quotes doubled. The output is never
/// executed.
pub fn explain(sql: &str, params: &[Value]) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut params = params.iter();
    for ch in sql.chars() {
        if ch == '?' {
            match params.next() {
                Some(value) => out.push_str(&literal(value)),
                None => out.push('?'),
            }
        } else {
            out.push(ch);
        }
    }
    out
}

fn quoted(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Default => "DEFAULT".to_string(),
        Value::Bool(v) => v.to_string(),
        Value::TinyInt(v) => v.to_string(),
        Value::SmallInt(v) => v.to_string(),
        Value::Int(v) => v.to_string(),
        Value::BigInt(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Double(v) => v.to_string(),
        Value::Decimal(v) => v.clone(),
        Value::Text(v) => quoted(v),
        Value::Bytes(v) => {
            let hex: String = v.iter().map(|b| format!("{:02X}", b)).collect();
            format!("X'{}'", hex)
        }
        Value::Date(v) => v.to_string(),
        Value::Time(v) | Value::Timestamp(v) | Value::TimestampTz(v) => v.to_string(),
        Value::Uuid(v) => {
            let hex: String = v.iter().map(|b| format!("{:02x}", b)).collect();
            quoted(&format!(
                "{}-{}-{}-{}-{}",
                &hex[0..8],
                &hex[8..12],
                &hex[12..16],
                &hex[16..20],
                &hex[20..32]
            ))
        }
        Value::Json(v) => quoted(&v.to_string()),
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(literal).collect();
            format!("[{}]", inner.join(", "))
        }
    }
}

//! Column descriptors and the column-by-row value matrix of a write.

use snowmodel_core::{Error, FieldInfo, Model, Result, SchemaErrorKind, SqlType, Value};

use crate::naming::NamingStrategy;

/// Name the prioritized primary key carries on composite keys.
const PRIORITIZED_KEY_NAME: &str = "ID";

/// One warehouse column as seen by the write engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Normalized warehouse identifier
    pub name: String,
    /// Model field key used with `Model::to_row` and `Model::set_column`
    pub field: &'static str,
    /// Semantic data kind
    pub kind: SqlType,
    /// Whether the warehouse supplies a default expression
    pub has_default: bool,
    pub primary_key: bool,
    pub auto_increment: bool,
}

impl ColumnSpec {
    /// Derive a column from field metadata.
    pub fn from_field(naming: &NamingStrategy, table: &str, info: &FieldInfo) -> Self {
        Self {
            name: naming.column_name(table, info.column_name),
            field: info.name,
            kind: info.sql_type.clone(),
            has_default: info.default.is_some(),
            primary_key: info.primary_key,
            auto_increment: info.auto_increment,
        }
    }

    /// Whether the warehouse generates this column's value when none is written.
    pub const fn is_generated(&self) -> bool {
        self.auto_increment || self.has_default
    }
}

/// Table name plus its columns in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    table: String,
    columns: Vec<ColumnSpec>,
}

impl TableSchema {
    pub fn new(table: impl Into<String>, columns: Vec<ColumnSpec>) -> Self {
        Self {
            table: table.into(),
            columns,
        }
    }

    /// Derive the schema of a model.
    ///
    /// Fields listed in `M::PRIMARY_KEY` are primary keys even when their
    /// `FieldInfo` does not say so. An empty `TABLE_NAME` falls back to the
    /// naming strategy applied to the type name.
    pub fn of<M: Model>(naming: &NamingStrategy) -> Self {
        let table = if M::TABLE_NAME.is_empty() {
            let type_name = std::any::type_name::<M>();
            let short = type_name.rsplit("::").next().unwrap_or(type_name);
            naming.table_name(short)
        } else {
            M::TABLE_NAME.to_string()
        };

        let columns = M::fields()
            .iter()
            .map(|info| {
                let mut column = ColumnSpec::from_field(naming, &table, info);
                column.primary_key |= M::PRIMARY_KEY.contains(&info.name);
                column
            })
            .collect();

        Self { table, columns }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Look up a column by identifier (ASCII case-insensitive).
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns
            .iter()
            .find(|column| column.name.eq_ignore_ascii_case(name))
    }

    pub fn primary_keys(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns.iter().filter(|column| column.primary_key)
    }

    /// Columns the warehouse generates, in declaration order.
    pub fn generated(&self) -> Vec<&ColumnSpec> {
        self.columns
            .iter()
            .filter(|column| column.is_generated())
            .collect()
    }

    /// The primary key used to tell new targets from existing ones.
    ///
    /// The sole primary key; for composite keys the one named `ID`.
    pub fn prioritized_primary(&self) -> Option<&ColumnSpec> {
        let mut keys = self.primary_keys();
        let first = keys.next()?;
        if keys.next().is_none() {
            return Some(first);
        }
        self.primary_keys()
            .find(|column| column.name.eq_ignore_ascii_case(PRIORITIZED_KEY_NAME))
    }
}

/// Columns to write and one positionally aligned value tuple per target.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueMatrix {
    columns: Vec<ColumnSpec>,
    rows: Vec<Vec<Value>>,
}

impl ValueMatrix {
    /// Build a matrix, checking that every row has one value per column.
    #[allow(clippy::result_large_err)]
    pub fn new(columns: Vec<ColumnSpec>, rows: Vec<Vec<Value>>) -> Result<Self> {
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(Error::schema(
                SchemaErrorKind::Invalid,
                format!(
                    "row {} has {} values but {} columns are written",
                    index,
                    row.len(),
                    columns.len()
                ),
            ));
        }
        Ok(Self { columns, rows })
    }

    /// Build the matrix for a set of targets.
    ///
    /// Non-generated columns are always written. A generated column is
    /// written only when some target carries a non-zero value for it; the
    /// other targets bind `NULL` there.
    #[allow(clippy::result_large_err)]
    pub fn from_models<M: Model>(schema: &TableSchema, targets: &[M]) -> Result<Self> {
        let source: Vec<Vec<(&'static str, Value)>> =
            targets.iter().map(Model::to_row).collect();

        let lookup = |row: &[(&'static str, Value)], field: &str| -> Value {
            row.iter()
                .find(|(name, _)| *name == field)
                .map_or(Value::Null, |(_, value)| value.clone())
        };

        let mut columns = Vec::new();
        let mut rows: Vec<Vec<Value>> = vec![Vec::new(); targets.len()];

        for column in schema.columns() {
            let values: Vec<Value> = source.iter().map(|row| lookup(row, column.field)).collect();

            if column.is_generated() {
                if values.iter().all(Value::is_zero) {
                    continue;
                }
                for (row, value) in rows.iter_mut().zip(values) {
                    row.push(if value.is_zero() { Value::Null } else { value });
                }
            } else {
                for (row, value) in rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
            columns.push(column.clone());
        }

        Self::new(columns, rows)
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of columns written.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether a column is written (ASCII case-insensitive).
    pub fn contains_column(&self, name: &str) -> bool {
        self.columns
            .iter()
            .any(|column| column.name.eq_ignore_ascii_case(name))
    }

    /// All values, row-major, in placeholder order.
    pub fn params(&self) -> Vec<Value> {
        self.rows.iter().flatten().cloned().collect()
    }
}

//! Model trait for struct-to-table mapping.
//!
//! A `Model` describes its table statically through [`FieldInfo`] and moves
//! values in and out by field name. Writers read with [`Model::to_row`];
//! generated-value recovery writes back with [`Model::set_column`].

use crate::Result;
use crate::field::FieldInfo;
use crate::value::Value;

/// Trait for types that can be mapped to warehouse tables.
///
/// # Example
///
/// ```ignore
/// use snowmodel_core::{FieldInfo, Model, Result, SqlType, Value};
///
/// struct Hero {
///     id: i64,
///     name: String,
/// }
///
/// impl Model for Hero {
///     const TABLE_NAME: &'static str = "heroes";
///     const PRIMARY_KEY: &'static [&'static str] = &["id"];
///
///     fn fields() -> &'static [FieldInfo] {
///         static FIELDS: &[FieldInfo] = &[
///             FieldInfo::new("id", "id", SqlType::BigInt)
///                 .primary_key(true)
///                 .auto_increment(true),
///             FieldInfo::new("name", "name", SqlType::VarChar(100)),
///         ];
///         FIELDS
///     }
///
///     fn to_row(&self) -> Vec<(&'static str, Value)> {
///         vec![("id", Value::from(self.id)), ("name", Value::from(self.name.as_str()))]
///     }
///
///     fn set_column(&mut self, field: &str, value: Value) -> Result<()> {
///         match field {
///             "id" => self.id = i64::try_from(value)?,
///             "name" => self.name = String::try_from(value)?,
///             _ => {}
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Model: Sized + Send + Sync {
    /// The name of the warehouse table.
    const TABLE_NAME: &'static str;

    /// The primary key field name(s).
    const PRIMARY_KEY: &'static [&'static str];

    /// Get field metadata for all columns, in declaration order.
    fn fields() -> &'static [FieldInfo];

    /// Convert this model instance to `(field name, value)` pairs.
    fn to_row(&self) -> Vec<(&'static str, Value)>;

    /// Assign a value read back from the warehouse to the named field.
    ///
    /// Unknown field names are ignored; conversion failures are returned.
    #[allow(clippy::result_large_err)]
    fn set_column(&mut self, field: &str, value: Value) -> Result<()>;

    /// Current value of the named field, `Value::Null` if the model has no such field.
    fn column_value(&self, field: &str) -> Value {
        self.to_row()
            .into_iter()
            .find(|(name, _)| *name == field)
            .map_or(Value::Null, |(_, value)| value)
    }
}

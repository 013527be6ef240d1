//! Snowflake DDL type mapping.

use snowmodel_core::{FieldInfo, SqlType};

/// Largest `VARCHAR` length rendered explicitly.
pub const MAX_EXPLICIT_VARCHAR: u32 = 4000;

/// Length given to unsized text columns that act as keys.
pub const KEY_VARCHAR_LEN: u32 = 256;

/// Render the Snowflake column type for a field.
///
/// An explicit `sql_type_override` is returned unchanged. Auto-increment
/// integer columns become `IDENTITY(1,1)` columns.
pub fn data_type_of(field: &FieldInfo) -> String {
    if let Some(override_str) = field.sql_type_override {
        return override_str.to_string();
    }

    match &field.sql_type {
        SqlType::Boolean => "BOOLEAN".to_string(),
        SqlType::SmallInt | SqlType::Integer | SqlType::BigInt => {
            let base = match field.sql_type {
                SqlType::SmallInt => "SMALLINT",
                SqlType::Integer => "INT",
                _ => "BIGINT",
            };
            if field.auto_increment {
                format!("{} IDENTITY(1,1)", base)
            } else {
                base.to_string()
            }
        }
        SqlType::Real | SqlType::Double => "FLOAT".to_string(),
        SqlType::Decimal { precision, scale } => format!("NUMBER({},{})", precision, scale),
        SqlType::VarChar(len) => varchar(field, *len),
        SqlType::Text => varchar(field, 0),
        SqlType::Uuid => "VARCHAR(36)".to_string(),
        SqlType::Binary => "VARBINARY".to_string(),
        SqlType::Date => "DATE".to_string(),
        SqlType::Time => "TIME".to_string(),
        SqlType::Timestamp => "TIMESTAMP_NTZ".to_string(),
        SqlType::TimestampTz => "TIMESTAMP_TZ".to_string(),
        SqlType::Json => "VARIANT".to_string(),
        SqlType::Array => "ARRAY".to_string(),
        SqlType::Custom(name) => (*name).to_string(),
    }
}

fn varchar(field: &FieldInfo, len: u32) -> String {
    let len = if len == 0 && (field.primary_key || field.unique) {
        KEY_VARCHAR_LEN
    } else {
        len
    };
    if (1..=MAX_EXPLICIT_VARCHAR).contains(&len) {
        format!("VARCHAR({})", len)
    } else {
        "VARCHAR".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_widths_and_identity() {
        let small = FieldInfo::new("n", "n", SqlType::SmallInt);
        assert_eq!(data_type_of(&small), "SMALLINT");

        let id = FieldInfo::new("id", "id", SqlType::BigInt)
            .primary_key(true)
            .auto_increment(true);
        assert_eq!(data_type_of(&id), "BIGINT IDENTITY(1,1)");

        let serial = FieldInfo::new("n", "n", SqlType::Integer).auto_increment(true);
        assert_eq!(data_type_of(&serial), "INT IDENTITY(1,1)");
    }

    #[test]
    fn test_varchar_sizes() {
        let sized = FieldInfo::new("name", "name", SqlType::VarChar(100));
        assert_eq!(data_type_of(&sized), "VARCHAR(100)");

        let huge = FieldInfo::new("body", "body", SqlType::VarChar(16_000));
        assert_eq!(data_type_of(&huge), "VARCHAR");

        let text = FieldInfo::new("bio", "bio", SqlType::Text);
        assert_eq!(data_type_of(&text), "VARCHAR");

        let key = FieldInfo::new("code", "code", SqlType::Text).primary_key(true);
        assert_eq!(data_type_of(&key), "VARCHAR(256)");

        let unique = FieldInfo::new("slug", "slug", SqlType::VarChar(0)).unique(true);
        assert_eq!(data_type_of(&unique), "VARCHAR(256)");
    }

    #[test]
    fn test_other_kinds() {
        let cases = [
            (SqlType::Boolean, "BOOLEAN"),
            (SqlType::Double, "FLOAT"),
            (SqlType::Decimal { precision: 12, scale: 4 }, "NUMBER(12,4)"),
            (SqlType::Timestamp, "TIMESTAMP_NTZ"),
            (SqlType::TimestampTz, "TIMESTAMP_TZ"),
            (SqlType::Binary, "VARBINARY"),
            (SqlType::Json, "VARIANT"),
            (SqlType::Array, "ARRAY"),
            (SqlType::Custom("GEOGRAPHY"), "GEOGRAPHY"),
        ];
        for (kind, expected) in cases {
            assert_eq!(data_type_of(&FieldInfo::new("c", "c", kind)), expected);
        }
    }

    #[test]
    fn test_override_wins() {
        let field = FieldInfo::new("amount", "amount", SqlType::Double).sql_type_override("NUMBER(38,2)");
        assert_eq!(data_type_of(&field), "NUMBER(38,2)");
    }
}

//! Semantic column kinds.

/// Semantic data kind of a column.
///
/// Dialects map these onto concrete DDL types; Snowflake collapses all
/// integer widths onto `NUMBER(38,0)` but keeps the names in DDL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlType {
    // Integer types
    SmallInt,
    Integer,
    BigInt,

    // Floating point
    Real,
    Double,

    // Fixed precision
    Decimal { precision: u8, scale: u8 },

    Boolean,

    /// Bounded text; `0` means unbounded
    VarChar(u32),
    Text,

    Binary,

    // Date/time types
    Date,
    Time,
    Timestamp,
    TimestampTz,

    Uuid,

    /// Semi-structured document
    Json,

    /// Untyped array
    Array,

    /// Custom type name, emitted verbatim
    Custom(&'static str),
}

impl SqlType {
    /// Check if this type is an integer type.
    pub const fn is_integer(&self) -> bool {
        matches!(self, SqlType::SmallInt | SqlType::Integer | SqlType::BigInt)
    }

    /// Check if this type is numeric.
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            SqlType::SmallInt
                | SqlType::Integer
                | SqlType::BigInt
                | SqlType::Real
                | SqlType::Double
                | SqlType::Decimal { .. }
        )
    }

    /// Check if this type is text-based.
    pub const fn is_text(&self) -> bool {
        matches!(self, SqlType::VarChar(_) | SqlType::Text | SqlType::Uuid)
    }

    /// Check if this type is a date/time type.
    pub const fn is_temporal(&self) -> bool {
        matches!(
            self,
            SqlType::Date | SqlType::Time | SqlType::Timestamp | SqlType::TimestampTz
        )
    }
}

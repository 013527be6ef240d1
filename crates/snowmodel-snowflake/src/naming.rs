//! Identifier naming conventions for Snowflake.
//!
//! Snowflake folds unquoted identifiers to upper case. Identifiers are never
//! quoted by this dialect, so column names are emitted upper case up front
//! and the names read back from the change log match them exactly.

use std::sync::LazyLock;

use regex::Regex;

static ACRONYM_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("valid acronym boundary regex"));

static WORD_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z\d])([A-Z])").expect("valid word boundary regex"));

/// Convert a Rust or CamelCase identifier to snake_case.
///
/// ```
/// use snowmodel_snowflake::naming::to_db_name;
///
/// assert_eq!(to_db_name("userName"), "user_name");
/// assert_eq!(to_db_name("HTTPServerID"), "http_server_id");
/// ```
pub fn to_db_name(name: &str) -> String {
    let split = ACRONYM_BOUNDARY.replace_all(name, "${1}_${2}");
    let split = WORD_BOUNDARY.replace_all(&split, "${1}_${2}");
    split.to_lowercase()
}

fn pluralize(word: &str) -> String {
    let consonant_y = word.len() > 1
        && word.ends_with('y')
        && !word[..word.len() - 1].ends_with(['a', 'e', 'i', 'o', 'u']);

    if consonant_y {
        format!("{}ies", &word[..word.len() - 1])
    } else if word.ends_with(['s', 'x', 'z']) || word.ends_with("ch") || word.ends_with("sh") {
        format!("{}es", word)
    } else {
        format!("{}s", word)
    }
}

/// Naming strategy: snake_case tables, upper-case columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamingStrategy {
    /// Prefix prepended to every table name
    pub table_prefix: String,
    /// Use singular table names (`user` instead of `users`)
    pub singular_table: bool,
}

impl NamingStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the table prefix.
    pub fn table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    /// Use singular table names.
    pub fn singular_table(mut self, singular: bool) -> Self {
        self.singular_table = singular;
        self
    }

    /// Table name for a type name: `UserAccount` becomes `user_accounts`.
    pub fn table_name(&self, type_name: &str) -> String {
        let base = to_db_name(type_name);
        if self.singular_table {
            format!("{}{}", self.table_prefix, base)
        } else {
            format!("{}{}", self.table_prefix, pluralize(&base))
        }
    }

    /// Column identifier: `userName` becomes `USER_NAME`.
    pub fn column_name(&self, _table: &str, column: &str) -> String {
        to_db_name(column).to_uppercase()
    }

    /// Join table name; names already in lower case are kept as given.
    pub fn join_table_name(&self, join_table: &str) -> String {
        if join_table.to_lowercase() == join_table {
            return format!("{}{}", self.table_prefix, join_table);
        }
        self.table_name(join_table)
    }

    /// Index name: `idx_<table>_<column>`.
    pub fn index_name(&self, table: &str, column: &str) -> String {
        format!("idx_{}_{}", table, to_db_name(column)).replace('.', "_")
    }

    /// Check constraint name: `chk_<table>_<column>`.
    pub fn checker_name(&self, table: &str, column: &str) -> String {
        format!("chk_{}_{}", table, column).replace('.', "_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_db_name() {
        assert_eq!(to_db_name("id"), "id");
        assert_eq!(to_db_name("created_at"), "created_at");
        assert_eq!(to_db_name("UserID"), "user_id");
        assert_eq!(to_db_name("CreatedAt"), "created_at");
        assert_eq!(to_db_name("address2Line"), "address2_line");
    }

    #[test]
    fn test_column_names_are_upper_case() {
        let ns = NamingStrategy::new();
        assert_eq!(ns.column_name("users", "userName"), "USER_NAME");
        assert_eq!(ns.column_name("users", "id"), "ID");
        assert_eq!(ns.column_name("users", "EMAIL"), "EMAIL");
    }

    #[test]
    fn test_table_names() {
        let ns = NamingStrategy::new();
        assert_eq!(ns.table_name("UserAccount"), "user_accounts");
        assert_eq!(ns.table_name("Company"), "companies");
        assert_eq!(ns.table_name("Day"), "days");
        assert_eq!(ns.table_name("Address"), "addresses");
        assert_eq!(ns.table_name("Batch"), "batches");

        let singular = NamingStrategy::new().singular_table(true).table_prefix("app_");
        assert_eq!(singular.table_name("UserAccount"), "app_user_account");
    }

    #[test]
    fn test_join_index_and_checker_names() {
        let ns = NamingStrategy::new();
        assert_eq!(ns.join_table_name("user_roles"), "user_roles");
        assert_eq!(ns.join_table_name("UserRole"), "user_roles");
        assert_eq!(ns.index_name("users", "emailAddress"), "idx_users_email_address");
        assert_eq!(ns.checker_name("public.users", "age"), "chk_public_users_age");
    }
}

//! The Snowflake dialect.

use snowmodel_core::{FieldInfo, Result};

use crate::clause::Pagination;
use crate::config::{SNOWFLAKE_DRIVER_NAME, SnowflakeConfig};
use crate::create::SnowflakeCreate;
use crate::migrate::Migrator;
use crate::naming::NamingStrategy;
use crate::types::data_type_of;

/// Snowflake dialect: configuration, naming and the pieces built from them.
#[derive(Debug, Clone, Default)]
pub struct SnowflakeDialect {
    config: SnowflakeConfig,
    naming: NamingStrategy,
}

impl SnowflakeDialect {
    pub fn new(config: SnowflakeConfig) -> Self {
        Self {
            config: config.normalized(),
            naming: NamingStrategy::new(),
        }
    }

    /// Dialect for a DSN with default settings.
    pub fn open(dsn: impl Into<String>) -> Self {
        Self::new(SnowflakeConfig::new(dsn))
    }

    /// Dialect from a JSON configuration.
    #[allow(clippy::result_large_err)]
    pub fn from_json(json: &str) -> Result<Self> {
        SnowflakeConfig::from_json(json).map(Self::new)
    }

    /// Replace the naming strategy.
    pub fn naming(mut self, naming: NamingStrategy) -> Self {
        self.naming = naming;
        self
    }

    pub const fn name(&self) -> &'static str {
        SNOWFLAKE_DRIVER_NAME
    }

    pub fn config(&self) -> &SnowflakeConfig {
        &self.config
    }

    pub fn naming_strategy(&self) -> &NamingStrategy {
        &self.naming
    }

    /// Insert/upsert strategy with change-log recovery.
    pub fn create_strategy(&self) -> SnowflakeCreate {
        SnowflakeCreate::new(self.config.clone(), self.naming.clone())
    }

    /// Migrator using the configured table options.
    pub fn migrator(&self) -> Migrator {
        let migrator = Migrator::new(self.naming.clone());
        match &self.config.table_options {
            Some(options) => migrator.table_options(options.clone()),
            None => migrator,
        }
    }

    /// Placeholder for every bind parameter.
    pub const fn bind_var(&self, _index: usize) -> &'static str {
        "?"
    }

    /// Identifiers are emitted as given.
    pub fn quote(&self, ident: &str) -> String {
        ident.to_string()
    }

    /// Expression for a column without a value.
    pub const fn default_value_of(&self, _field: &FieldInfo) -> &'static str {
        "NULL"
    }

    pub const fn supports_savepoints(&self) -> bool {
        false
    }

    pub fn data_type_of(&self, field: &FieldInfo) -> String {
        data_type_of(field)
    }

    /// Pagination clause for a SELECT.
    pub fn limit_clause(
        &self,
        pagination: Pagination,
        has_order_by: bool,
        order_key: Option<&str>,
    ) -> String {
        pagination.to_sql(has_order_by, order_key)
    }
}

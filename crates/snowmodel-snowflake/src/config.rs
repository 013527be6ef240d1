//! Snowflake dialect configuration.

use serde::{Deserialize, Serialize};
use snowmodel_core::error::ConfigError;
use snowmodel_core::{Error, Result};

use crate::statement::ChangeLogMode;

/// Driver name registered for the Snowflake dialect.
pub const SNOWFLAKE_DRIVER_NAME: &str = "snowflake";

/// Configuration for the Snowflake dialect and its write engine.
///
/// Unknown JSON keys are rejected; missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SnowflakeConfig {
    /// Driver name (default: `snowflake`)
    pub driver_name: String,
    /// Data source name handed to the driver
    pub dsn: String,
    /// Fail an upsert whose primary key cannot serve as the conflict target
    /// instead of downgrading it to a plain insert; rows whose only unwritten
    /// keys are generated still go through as plain inserts
    pub strict_upsert: bool,
    /// Change-log information mode for recovery after a plain insert
    pub plain_insert_changes: ChangeLogMode,
    /// Read generated values back through the change log after each write
    pub recover_generated: bool,
    /// Extra options appended to `CREATE TABLE` before change tracking
    pub table_options: Option<String>,
}

impl Default for SnowflakeConfig {
    fn default() -> Self {
        Self {
            driver_name: SNOWFLAKE_DRIVER_NAME.to_string(),
            dsn: String::new(),
            strict_upsert: false,
            plain_insert_changes: ChangeLogMode::Default,
            recover_generated: true,
            table_options: None,
        }
    }
}

impl SnowflakeConfig {
    /// Create a configuration for the given DSN.
    pub fn new(dsn: impl Into<String>) -> Self {
        Self {
            dsn: dsn.into(),
            ..Default::default()
        }
    }

    /// Parse a configuration from JSON.
    #[allow(clippy::result_large_err)]
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            Error::Config(ConfigError {
                message: format!("invalid snowflake configuration: {}", e),
                source: Some(Box::new(e)),
            })
        })?;
        Ok(config.normalized())
    }

    /// Set the driver name.
    pub fn driver_name(mut self, name: impl Into<String>) -> Self {
        self.driver_name = name.into();
        self
    }

    /// Set the DSN.
    pub fn dsn(mut self, dsn: impl Into<String>) -> Self {
        self.dsn = dsn.into();
        self
    }

    /// Enable or disable strict upserts.
    pub fn strict_upsert(mut self, strict: bool) -> Self {
        self.strict_upsert = strict;
        self
    }

    /// Set the change-log mode used after plain inserts.
    pub fn plain_insert_changes(mut self, mode: ChangeLogMode) -> Self {
        self.plain_insert_changes = mode;
        self
    }

    /// Enable or disable generated-value recovery.
    pub fn recover_generated(mut self, enabled: bool) -> Self {
        self.recover_generated = enabled;
        self
    }

    /// Set extra `CREATE TABLE` options.
    pub fn table_options(mut self, options: impl Into<String>) -> Self {
        self.table_options = Some(options.into());
        self
    }

    /// Fill an empty driver name with the Snowflake default.
    pub(crate) fn normalized(mut self) -> Self {
        if self.driver_name.is_empty() {
            self.driver_name = SNOWFLAKE_DRIVER_NAME.to_string();
        }
        self
    }
}

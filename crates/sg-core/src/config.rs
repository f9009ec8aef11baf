//! Engine options, loadable from YAML

use crate::error::{CoreError, CoreResult};
use crate::identifier::{validate_identifier, IdentifierRole};
use crate::tracking_table::TrackingTable;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default tracking table used when none is configured
pub const DEFAULT_TRACKING_TABLE: &str = "libschema.migration_status";

/// Options shared by every driver operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Options {
    /// Tracking table, `table` or `schema.table`
    #[serde(default = "default_tracking_table")]
    pub tracking_table: String,

    /// Namespace selected with `USE` at the start of every migration transaction.
    ///
    /// `USE` leaks out of transactions and pooled connections are shared, so
    /// the override is re-applied per transaction rather than once per
    /// connection.
    #[serde(default)]
    pub schema_override: Option<String>,

    /// Transaction options used for migration and status transactions
    #[serde(default)]
    pub migration_tx: TxOptions,
}

fn default_tracking_table() -> String {
    DEFAULT_TRACKING_TABLE.to_string()
}

impl Default for Options {
    fn default() -> Self {
        Self {
            tracking_table: default_tracking_table(),
            schema_override: None,
            migration_tx: TxOptions::default(),
        }
    }
}

impl Options {
    /// Load options from a YAML file
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::ConfigParseError {
            message: format!("{}: {}", path.display(), e),
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse options from YAML text and validate them
    pub fn from_yaml_str(yaml: &str) -> CoreResult<Self> {
        let options: Options =
            serde_yaml::from_str(yaml).map_err(|e| CoreError::ConfigParseError {
                message: e.to_string(),
            })?;
        options.validate()?;
        Ok(options)
    }

    /// Check every identifier the options will splice into SQL
    pub fn validate(&self) -> CoreResult<()> {
        self.tracking()?;
        if let Some(schema) = &self.schema_override {
            validate_identifier(schema, IdentifierRole::SchemaOverride)?;
        }
        Ok(())
    }

    /// Parse the configured tracking table name
    pub fn tracking(&self) -> CoreResult<TrackingTable> {
        TrackingTable::parse(&self.tracking_table)
    }
}

/// Transaction isolation level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

/// Options applied when beginning a transaction.
///
/// `isolation_level: None` keeps the server default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TxOptions {
    #[serde(default)]
    pub isolation_level: Option<IsolationLevel>,
    #[serde(default)]
    pub read_only: bool,
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

//! Migration identity and status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one migration: unique across the tracked universe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MigrationName {
    /// Library (namespace) the migration belongs to
    pub library: String,
    /// Migration name within the library
    pub name: String,
}

impl MigrationName {
    pub fn new(library: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            library: library.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for MigrationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.library, self.name)
    }
}

/// Outcome of the most recent attempt at a migration.
///
/// There is no in-progress state: an attempt that never recorded anything
/// leaves the previous outcome (or the default, not done) in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationStatus {
    pub done: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl MigrationStatus {
    /// Status of a successful attempt
    pub fn done() -> Self {
        Self {
            done: true,
            error: None,
        }
    }

    /// Status of a failed attempt; retry-eligible
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            done: false,
            error: Some(error.into()),
        }
    }
}

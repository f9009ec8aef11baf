//! Tracking table naming.
//!
//! The tracking table may be given as `table` or `schema.table`. Each
//! component must be a simple identifier. Names are never quoted: MySQL only
//! accepts `"table"` quoting in ANSI_QUOTES mode and that mode cannot be
//! assumed, so validation is the only protection.

use crate::error::{CoreError, CoreResult};
use crate::identifier::{Identifier, IdentifierRole};
use std::fmt;

/// Validated identity of the migration tracking table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackingTable {
    schema: Option<Identifier>,
    table: Identifier,
}

impl TrackingTable {
    /// Parse and validate a `table` or `schema.table` name.
    pub fn parse(name: &str) -> CoreResult<Self> {
        let parts: Vec<&str> = name.split('.').collect();
        match parts.as_slice() {
            [table] => Ok(Self {
                schema: None,
                table: Identifier::parse(*table, IdentifierRole::TrackingTable)?,
            }),
            [schema, table] => Ok(Self {
                schema: Some(Identifier::parse(*schema, IdentifierRole::TrackingSchema)?),
                table: Identifier::parse(*table, IdentifierRole::TrackingTable)?,
            }),
            _ => Err(CoreError::InvalidTrackingTable {
                name: name.to_string(),
            }),
        }
    }

    /// Schema qualifier, if the name was schema-qualified.
    pub fn schema(&self) -> Option<&Identifier> {
        self.schema.as_ref()
    }

    /// Unqualified table name.
    pub fn table(&self) -> &Identifier {
        &self.table
    }

    /// The reference to use in SQL text (`schema.table` or `table`).
    pub fn qualified(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.table),
            None => self.table.to_string(),
        }
    }
}

impl fmt::Display for TrackingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified())
    }
}

#[cfg(test)]
#[path = "tracking_table_test.rs"]
mod tests;

//! Simple SQL identifier validation.
//!
//! Schema and table names end up interpolated directly into SQL text because
//! placeholders cannot bind identifiers. Every such name must pass
//! [`validate_identifier`] first: `^[A-Za-z][A-Za-z0-9_]*$`, ASCII only.

use crate::error::{CoreError, CoreResult};
use std::fmt;
use std::ops::Deref;

/// What an identifier is used for, reported in validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierRole {
    /// Schema component of the tracking table name
    TrackingSchema,
    /// Table component of the tracking table name
    TrackingTable,
    /// Namespace applied at the start of every migration transaction
    SchemaOverride,
    /// Schema argument to an introspection helper
    Schema,
    /// Table argument to an introspection helper
    Table,
}

impl fmt::Display for IdentifierRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IdentifierRole::TrackingSchema => "Tracking table schema name",
            IdentifierRole::TrackingTable => "Tracking table table name",
            IdentifierRole::SchemaOverride => "Options.schema_override",
            IdentifierRole::Schema => "Schema name",
            IdentifierRole::Table => "Table name",
        };
        f.write_str(s)
    }
}

/// Check whether `s` is a simple identifier without allocating an error.
pub fn is_simple_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validate that `value` is a simple identifier, naming its `role` on failure.
pub fn validate_identifier(value: &str, role: IdentifierRole) -> CoreResult<()> {
    if is_simple_identifier(value) {
        Ok(())
    } else {
        Err(CoreError::InvalidIdentifier {
            role,
            value: value.to_string(),
        })
    }
}

/// Split a `table` or `schema.table` argument into validated parts.
pub fn split_qualified(name: &str) -> CoreResult<(Option<Identifier>, Identifier)> {
    let parts: Vec<&str> = name.split('.').collect();
    match parts.as_slice() {
        [table] => Ok((None, Identifier::parse(*table, IdentifierRole::Table)?)),
        [schema, table] => Ok((
            Some(Identifier::parse(*schema, IdentifierRole::Schema)?),
            Identifier::parse(*table, IdentifierRole::Table)?,
        )),
        _ => Err(CoreError::InvalidTableName {
            name: name.to_string(),
        }),
    }
}

/// An identifier that has passed [`validate_identifier`].
///
/// Holding an `Identifier` is proof that the text is safe to splice into SQL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    /// Validate `value` and wrap it.
    pub fn parse(value: impl Into<String>, role: IdentifierRole) -> CoreResult<Self> {
        let value = value.into();
        validate_identifier(&value, role)?;
        Ok(Self(value))
    }

    /// Return the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for Identifier {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<&str> for Identifier {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
#[path = "identifier_test.rs"]
mod tests;

//! Error types for sg-core

use crate::identifier::IdentifierRole;
use thiserror::Error;

/// Core error type for Schemagate
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Identifier is not safe to interpolate into SQL text
    #[error("[C001] {role} must be a simple identifier, not '{value}'")]
    InvalidIdentifier { role: IdentifierRole, value: String },

    /// C002: Tracking table name is neither `table` nor `schema.table`
    #[error("[C002] Tracking table '{name}' is not valid: expected 'table' or 'schema.table'")]
    InvalidTrackingTable { name: String },

    /// C003: Configuration file not found
    #[error("[C003] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C004: Failed to parse configuration
    #[error("[C004] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// C005: Table argument is neither `table` nor `schema.table`
    #[error("[C005] Table name '{name}' is not valid: expected 'table' or 'schema.table'")]
    InvalidTableName { name: String },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;

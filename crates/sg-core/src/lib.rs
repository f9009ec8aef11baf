//! sg-core - Core library for Schemagate
//!
//! This crate provides the types shared by every Schemagate component:
//! SQL identifier validation, tracking table naming, migration names and
//! statuses, and the YAML-backed engine options.

pub mod config;
pub mod error;
pub mod identifier;
pub mod migration_name;
pub mod tracking_table;

pub use config::{IsolationLevel, Options, TxOptions};
pub use error::{CoreError, CoreResult};
pub use identifier::{
    is_simple_identifier, split_qualified, validate_identifier, Identifier, IdentifierRole,
};
pub use migration_name::{MigrationName, MigrationStatus};
pub use tracking_table::TrackingTable;

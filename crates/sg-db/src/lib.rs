//! sg-db - Database abstraction layer for Schemagate
//!
//! This crate provides the `Database` and `Transaction` traits the migration
//! engine is written against, plain value types for parameters and rows, and
//! the MySQL implementation on top of `mysql_async`.

pub mod error;
pub mod mysql;
pub mod traits;
pub mod value;

pub use error::{DbError, DbResult};
pub use mysql::MySqlBackend;
pub use traits::{Database, Transaction};
pub use value::{ExecResult, Row, SqlValue};

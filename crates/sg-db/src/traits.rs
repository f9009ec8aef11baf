//! Database trait definitions

use crate::error::DbResult;
use crate::value::{ExecResult, Row, SqlValue};
use async_trait::async_trait;
use sg_core::TxOptions;

/// Database abstraction trait for Schemagate
///
/// Implementations must be Send + Sync for async operation. Statements run
/// directly on a `Database` use any pooled connection and auto-commit.
#[async_trait]
pub trait Database: Send + Sync {
    /// Begin a transaction on a dedicated connection
    async fn begin(&self, options: &TxOptions) -> DbResult<Box<dyn Transaction>>;

    /// Execute SQL text outside any transaction
    async fn execute(&self, sql: &str) -> DbResult<ExecResult>;

    /// Run a parameterized query outside any transaction
    async fn query(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<Row>>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}

/// An open transaction.
///
/// The transaction pins one connection until it is committed or rolled
/// back, so session state (advisory locks, `USE`) stays on that connection.
/// Dropping a transaction without finishing it rolls it back.
#[async_trait]
pub trait Transaction: Send {
    /// Execute SQL text, possibly several `;`-separated statements
    async fn execute(&mut self, sql: &str) -> DbResult<ExecResult>;

    /// Execute one statement with bound `?` parameters
    async fn execute_with(&mut self, sql: &str, params: &[SqlValue]) -> DbResult<ExecResult>;

    /// Run a query with bound `?` parameters and collect its rows
    async fn query(&mut self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<Row>>;

    async fn commit(self: Box<Self>) -> DbResult<()>;

    async fn rollback(self: Box<Self>) -> DbResult<()>;
}

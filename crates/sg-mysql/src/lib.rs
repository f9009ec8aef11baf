//! sg-mysql - MySQL migration engine for Schemagate
//!
//! MySQL cannot run DDL inside a transaction: every DDL statement commits
//! implicitly. This crate runs one migration at a time against such a
//! database, refuses scripts that cannot be retried safely, records every
//! attempt in a tracking table even when the attempt fails mid-transaction,
//! and serializes orchestrators across processes with a session-scoped
//! advisory lock.
//!
//! An orchestrator drives a [`Driver`] in this order:
//!
//! ```rust,ignore
//! let handle = driver.acquire().await?;
//! driver.ensure_tracking_table().await?;
//! let drift = driver.load_statuses(&mut migrations).await?;
//! for migration in migrations.iter_mut().filter(|m| !m.status().done) {
//!     driver.run(migration).await?;
//! }
//! driver.release(handle).await?;
//! ```

pub mod driver;
pub mod error;
mod executor;
pub mod introspect;
pub mod lock;
pub mod migration;
pub mod mysql;
pub mod status;

#[cfg(test)]
pub(crate) mod test_utils;

pub use driver::Driver;
pub use error::{ErrorKind, MigrateError, MigrateResult, Phase};
pub use introspect::Introspector;
pub use lock::{lock_name, LockHandle, LockManager};
pub use migration::{Action, Migration};
pub use mysql::MySqlDriver;
pub use sg_core::{MigrationName, MigrationStatus, Options};

//! Driver capability trait

use crate::error::MigrateResult;
use crate::lock::LockHandle;
use crate::migration::Migration;
use async_trait::async_trait;
use sg_core::MigrationName;
use sg_db::ExecResult;

/// Operations an orchestrator needs from a migration backend.
///
/// Each operation is independently invocable. A backend with different
/// locking or tracking needs provides its own implementation and is held
/// the same way (`Arc<dyn Driver>`).
#[async_trait]
pub trait Driver: Send + Sync {
    /// Create the tracking namespace and table if they do not exist
    async fn ensure_tracking_table(&self) -> MigrateResult<()>;

    /// Take the cross-process migration lock, waiting as long as it takes
    async fn acquire(&self) -> MigrateResult<LockHandle>;

    /// Give up the lock taken by [`Driver::acquire`]
    async fn release(&self, handle: LockHandle) -> MigrateResult<()>;

    /// Apply recorded statuses to `migrations`.
    ///
    /// Returns the names of completed rows matching none of them.
    async fn load_statuses(&self, migrations: &mut [Migration])
        -> MigrateResult<Vec<MigrationName>>;

    /// Run one migration and record its outcome
    async fn run(&self, migration: &mut Migration) -> MigrateResult<ExecResult>;

    /// Check that a migration can be scheduled on this backend
    fn validate(&self, migration: &Migration) -> MigrateResult<()>;

    /// Backend type identifier for logging
    fn driver_type(&self) -> &'static str;
}

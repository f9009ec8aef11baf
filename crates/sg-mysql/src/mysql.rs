//! MySQL driver

use crate::driver::Driver;
use crate::error::{MigrateError, MigrateResult};
use crate::executor;
use crate::introspect::Introspector;
use crate::lock::{LockHandle, LockManager};
use crate::migration::{Action, Migration};
use crate::status;
use async_trait::async_trait;
use sg_core::{CoreResult, Identifier, IdentifierRole, MigrationName, Options, TrackingTable};
use sg_db::{Database, ExecResult};
use std::sync::Arc;

/// Migration driver for MySQL and MariaDB
pub struct MySqlDriver {
    db: Arc<dyn Database>,
    options: Options,
    tracking: TrackingTable,
    schema_override: Option<Identifier>,
    locks: LockManager,
}

impl MySqlDriver {
    /// Create a driver, validating every configured identifier
    pub fn new(db: Arc<dyn Database>, options: Options) -> MigrateResult<Self> {
        Self::with_tracking_table_resolver(db, options, Options::tracking)
    }

    /// Create a driver that derives the tracking table with `resolve`
    /// instead of parsing `options.tracking_table`
    pub fn with_tracking_table_resolver<F>(
        db: Arc<dyn Database>,
        options: Options,
        resolve: F,
    ) -> MigrateResult<Self>
    where
        F: FnOnce(&Options) -> CoreResult<TrackingTable>,
    {
        let tracking = resolve(&options)?;
        let schema_override = options
            .schema_override
            .as_deref()
            .map(|s| Identifier::parse(s, IdentifierRole::SchemaOverride))
            .transpose()?;
        if let (None, Some(schema)) = (tracking.schema(), &schema_override) {
            log::warn!(
                "Tracking table {} is unqualified; status rows are written under schema {}",
                tracking,
                schema
            );
        }
        log::debug!(
            "Creating MySQL driver on {} database: tracking table {}, schema override {:?}",
            db.db_type(),
            tracking,
            schema_override.as_ref().map(Identifier::as_str)
        );
        Ok(Self {
            locks: LockManager::new(&tracking),
            db,
            options,
            tracking,
            schema_override,
        })
    }

    pub fn database(&self) -> &dyn Database {
        self.db.as_ref()
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn tracking(&self) -> &TrackingTable {
        &self.tracking
    }

    pub fn schema_override(&self) -> Option<&Identifier> {
        self.schema_override.as_ref()
    }

    pub fn lock_manager(&self) -> &LockManager {
        &self.locks
    }

    /// Schema introspection helpers for skip-if conditions and computed
    /// migrations, defaulting to the schema override
    pub fn introspector(&self) -> Introspector {
        Introspector::new(Arc::clone(&self.db), self.schema_override.clone())
    }
}

#[async_trait]
impl Driver for MySqlDriver {
    async fn ensure_tracking_table(&self) -> MigrateResult<()> {
        status::ensure_tracking_table(self.database(), &self.tracking).await
    }

    async fn acquire(&self) -> MigrateResult<LockHandle> {
        self.locks.acquire(self.database()).await
    }

    async fn release(&self, handle: LockHandle) -> MigrateResult<()> {
        self.locks.release(handle).await
    }

    async fn load_statuses(
        &self,
        migrations: &mut [Migration],
    ) -> MigrateResult<Vec<MigrationName>> {
        status::load_statuses(self.database(), &self.tracking, migrations).await
    }

    async fn run(&self, migration: &mut Migration) -> MigrateResult<ExecResult> {
        executor::run(self, migration).await
    }

    fn validate(&self, migration: &Migration) -> MigrateResult<()> {
        let name = migration.name();
        if name.library.is_empty() || name.name.is_empty() {
            return Err(MigrateError::InvalidMigration {
                migration: name.clone(),
                reason: "library and name must not be empty".to_string(),
            });
        }
        match migration.action() {
            Action::Script(_) | Action::Computed(_) => Ok(()),
        }
    }

    fn driver_type(&self) -> &'static str {
        "mysql"
    }
}

#[cfg(test)]
#[path = "mysql_test.rs"]
mod tests;

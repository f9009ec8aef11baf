//! Migration definitions
//!
//! A migration is either a script (SQL text, possibly computed at run time
//! from within the migration's transaction) or a computed action that runs
//! directly against the transaction.

use futures::future::BoxFuture;
use sg_core::{MigrationName, MigrationStatus};
use sg_db::Transaction;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Produces the SQL text of a script migration
pub type ScriptFn = Arc<
    dyn for<'a> Fn(&'a mut dyn Transaction) -> BoxFuture<'a, anyhow::Result<String>> + Send + Sync,
>;

/// Applies a computed migration
pub type ComputedFn = Arc<
    dyn for<'a> Fn(&'a mut dyn Transaction) -> BoxFuture<'a, anyhow::Result<()>> + Send + Sync,
>;

/// Decides whether a migration is inapplicable and should be skipped
pub type SkipIfFn = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<bool>> + Send + Sync>;

/// What a migration does when it runs
#[derive(Clone)]
pub enum Action {
    /// Generate SQL text, classify it, and execute it as one batch
    Script(ScriptFn),
    /// Run an action directly within the migration transaction
    Computed(ComputedFn),
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Script(_) => "script",
            Action::Computed(_) => "computed",
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

/// One named migration with its action and in-memory status
#[derive(Clone)]
pub struct Migration {
    name: MigrationName,
    action: Action,
    skip_if: Option<SkipIfFn>,
    status: MigrationStatus,
}

impl Migration {
    /// A migration with literal SQL text
    pub fn script(
        library: impl Into<String>,
        name: impl Into<String>,
        sql: impl Into<String>,
    ) -> Self {
        let sql: Arc<str> = Arc::from(sql.into());
        Self::generate(library, name, move |_tx| {
            let sql = Arc::clone(&sql);
            Box::pin(async move { Ok(sql.to_string()) })
        })
    }

    /// A migration whose SQL text is produced inside its transaction
    pub fn generate<F>(library: impl Into<String>, name: impl Into<String>, generator: F) -> Self
    where
        F: for<'a> Fn(&'a mut dyn Transaction) -> BoxFuture<'a, anyhow::Result<String>>
            + Send
            + Sync
            + 'static,
    {
        Self::with_action(library, name, Action::Script(Arc::new(generator)))
    }

    /// A migration that runs an action directly instead of SQL text
    pub fn computed<F>(library: impl Into<String>, name: impl Into<String>, action: F) -> Self
    where
        F: for<'a> Fn(&'a mut dyn Transaction) -> BoxFuture<'a, anyhow::Result<()>>
            + Send
            + Sync
            + 'static,
    {
        Self::with_action(library, name, Action::Computed(Arc::new(action)))
    }

    fn with_action(library: impl Into<String>, name: impl Into<String>, action: Action) -> Self {
        Self {
            name: MigrationName::new(library, name),
            action,
            skip_if: None,
            status: MigrationStatus::default(),
        }
    }

    /// Attach a skip-if condition.
    ///
    /// Declaring one also permits the script to contain unguarded DDL: the
    /// author takes responsibility for making retries safe.
    pub fn skip_if<F, Fut>(mut self, predicate: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<bool>> + Send + 'static,
    {
        self.skip_if = Some(Arc::new(move || {
            Box::pin(predicate()) as BoxFuture<'static, anyhow::Result<bool>>
        }));
        self
    }

    pub fn name(&self) -> &MigrationName {
        &self.name
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn has_skip_if(&self) -> bool {
        self.skip_if.is_some()
    }

    /// Evaluate the skip-if condition; `false` when none is declared
    pub async fn should_skip(&self) -> anyhow::Result<bool> {
        match &self.skip_if {
            Some(predicate) => predicate().await,
            None => Ok(false),
        }
    }

    pub fn status(&self) -> &MigrationStatus {
        &self.status
    }

    pub fn set_status(&mut self, status: MigrationStatus) {
        self.status = status;
    }
}

impl fmt::Debug for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migration")
            .field("name", &self.name)
            .field("action", &self.action)
            .field("skip_if", &self.skip_if.is_some())
            .field("status", &self.status)
            .finish()
    }
}

#[cfg(test)]
#[path = "migration_test.rs"]
mod tests;

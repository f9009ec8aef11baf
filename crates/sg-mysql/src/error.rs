//! Error types for sg-mysql
//!
//! Every error carries a stable [`ErrorKind`] so callers can tell "the
//! migration is wrong" apart from "the tracking/lock infrastructure failed"
//! without matching on message text.

use sg_core::{CoreError, MigrationName};
use sg_db::DbError;
use sg_sql::ScriptClass;
use std::fmt;
use thiserror::Error;

/// Boxed cause of a failed migration step
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Stable category of a [`MigrateError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid identifier, tracking table name, or migration definition
    Configuration,
    /// Script rejected by the safety policy; nothing was executed
    ClassificationPolicy,
    /// The migration itself failed; its failure was recorded
    Execution,
    /// The outcome of an attempt could not be recorded; always fatal
    StatusPersistence,
    /// Acquire while held, or release of a handle this manager does not hold
    LockState,
    /// Creating or reading the tracking table failed
    Tracking,
    /// The advisory lock primitive itself failed
    Lock,
    /// An introspection query failed
    Introspection,
}

/// Step of a migration attempt at which an error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Begin,
    NamespaceSwitch,
    Generate,
    Classify,
    Execute,
    Commit,
    StatusSave,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Begin => "begin",
            Phase::NamespaceSwitch => "namespace-switch",
            Phase::Generate => "generate",
            Phase::Classify => "classify",
            Phase::Execute => "execute",
            Phase::Commit => "commit",
            Phase::StatusSave => "status-save",
        };
        f.write_str(s)
    }
}

/// Migration engine errors
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration rejected before any database I/O (M001)
    #[error("[M001] Invalid configuration: {0}")]
    Configuration(#[from] CoreError),

    /// Migration definition cannot be scheduled (M002)
    #[error("[M002] Migration {migration} is not supported: {reason}")]
    InvalidMigration {
        migration: MigrationName,
        reason: String,
    },

    /// Script rejected by the safety policy (M003)
    #[error("[M003] Migration {migration} rejected during classify ({class}): {reason}")]
    Policy {
        migration: MigrationName,
        class: ScriptClass,
        reason: &'static str,
        sql: String,
    },

    /// Migration step failed (M004)
    #[error("[M004] Migration {migration} failed during {phase}: {source}")]
    Execution {
        migration: MigrationName,
        phase: Phase,
        sql: Option<String>,
        #[source]
        source: BoxError,
    },

    /// Attempt outcome could not be recorded (M005)
    #[error(
        "[M005] Saving status of migration {migration} failed during {phase}: {source}{}",
        after_original(.original)
    )]
    StatusPersistence {
        migration: MigrationName,
        phase: Phase,
        original: Option<Box<MigrateError>>,
        #[source]
        source: DbError,
    },

    /// Lock manager misuse (M006)
    #[error("[M006] {0}")]
    LockState(String),

    /// Tracking table operation failed (M007)
    #[error("[M007] Tracking table {table}: {operation} failed: {source}")]
    Tracking {
        table: String,
        operation: &'static str,
        #[source]
        source: DbError,
    },

    /// Advisory lock call failed (M008)
    #[error("[M008] Advisory lock '{lock_name}': {operation} failed: {source}")]
    Lock {
        lock_name: String,
        operation: &'static str,
        #[source]
        source: DbError,
    },

    /// Introspection query failed (M009)
    #[error("[M009] Introspection of {target} failed: {source}")]
    Introspection {
        target: String,
        #[source]
        source: DbError,
    },
}

fn after_original(original: &Option<Box<MigrateError>>) -> String {
    match original {
        Some(err) => format!(" (after: {err})"),
        None => String::new(),
    }
}

/// Result type alias for MigrateError
pub type MigrateResult<T> = Result<T, MigrateError>;

impl MigrateError {
    /// Create an Execution error for one phase of a migration
    pub fn execution(
        migration: &MigrationName,
        phase: Phase,
        sql: Option<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        MigrateError::Execution {
            migration: migration.clone(),
            phase,
            sql,
            source: source.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            MigrateError::Configuration(_) | MigrateError::InvalidMigration { .. } => {
                ErrorKind::Configuration
            }
            MigrateError::Policy { .. } => ErrorKind::ClassificationPolicy,
            MigrateError::Execution { .. } => ErrorKind::Execution,
            MigrateError::StatusPersistence { .. } => ErrorKind::StatusPersistence,
            MigrateError::LockState(_) => ErrorKind::LockState,
            MigrateError::Tracking { .. } => ErrorKind::Tracking,
            MigrateError::Lock { .. } => ErrorKind::Lock,
            MigrateError::Introspection { .. } => ErrorKind::Introspection,
        }
    }

    /// Phase of the migration attempt, for errors raised while running one
    pub fn phase(&self) -> Option<Phase> {
        match self {
            MigrateError::Policy { .. } => Some(Phase::Classify),
            MigrateError::Execution { phase, .. } | MigrateError::StatusPersistence { phase, .. } => {
                Some(*phase)
            }
            _ => None,
        }
    }

    /// Migration the error belongs to, if any
    pub fn migration(&self) -> Option<&MigrationName> {
        match self {
            MigrateError::InvalidMigration { migration, .. }
            | MigrateError::Policy { migration, .. }
            | MigrateError::Execution { migration, .. }
            | MigrateError::StatusPersistence { migration, .. } => Some(migration),
            _ => None,
        }
    }

    /// The run cannot continue: attempt history may be incomplete
    pub fn is_fatal(&self) -> bool {
        matches!(self, MigrateError::StatusPersistence { .. })
    }

    /// Text written to the tracking table's `error` column for this failure.
    ///
    /// This is the root cause only (the action's or driver's message, or the
    /// policy reason), not the wrapped chain.
    pub fn recorded_text(&self) -> String {
        match self {
            MigrateError::Policy { reason, .. } => (*reason).to_string(),
            MigrateError::Execution { source, .. } => source.to_string(),
            other => other.to_string(),
        }
    }

    /// SQL text involved, for script migrations
    pub fn sql(&self) -> Option<&str> {
        match self {
            MigrateError::Policy { sql, .. } => Some(sql),
            MigrateError::Execution { sql, .. } => sql.as_deref(),
            _ => None,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);
        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }
        output
    }
}

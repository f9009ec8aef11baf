//! Running one migration
//!
//! DDL commits implicitly in MySQL, so a migration transaction is only a
//! partial safety net. The executor therefore refuses scripts that cannot
//! be retried and always leaves a status row behind: staged in the
//! migration transaction on success, or written by a separate fallback
//! transaction once the migration transaction has been rolled back.

use crate::error::{MigrateError, MigrateResult, Phase};
use crate::migration::{Action, Migration};
use crate::mysql::MySqlDriver;
use crate::status;
use sg_core::{Identifier, MigrationName, MigrationStatus};
use sg_db::{DbError, ExecResult, Transaction};

fn use_statement(schema: &Identifier) -> String {
    format!("USE {}", schema)
}

pub(crate) async fn run(
    driver: &MySqlDriver,
    migration: &mut Migration,
) -> MigrateResult<ExecResult> {
    let name = migration.name().clone();
    log::info!("Starting migration {}", name);

    let mut tx = driver
        .database()
        .begin(&driver.options().migration_tx)
        .await
        .map_err(|e| MigrateError::execution(&name, Phase::Begin, None, e))?;

    if let Some(schema) = driver.schema_override() {
        let sql = use_statement(schema);
        if let Err(e) = tx.execute(&sql).await {
            rollback_quietly(tx, &name).await;
            return Err(MigrateError::execution(
                &name,
                Phase::NamespaceSwitch,
                Some(sql),
                e,
            ));
        }
    }

    let applied = apply(migration, tx.as_mut()).await;
    let failure = match applied {
        Ok(result) => {
            let saved =
                status::save_status(tx.as_mut(), driver.tracking(), &name, true, None).await;
            match saved {
                Ok(()) => match tx.commit().await {
                    Ok(()) => {
                        migration.set_status(MigrationStatus::done());
                        log::info!(
                            "Finished migration {} ({} rows affected)",
                            name,
                            result.rows_affected
                        );
                        return Ok(result);
                    }
                    Err(e) => MigrateError::execution(&name, Phase::Commit, None, e),
                },
                Err(e) => {
                    rollback_quietly(tx, &name).await;
                    MigrateError::execution(&name, Phase::StatusSave, None, e)
                }
            }
        }
        Err(err) => {
            rollback_quietly(tx, &name).await;
            err
        }
    };
    record_failure(driver, migration, failure).await
}

/// Execute the migration's action inside `tx`, enforcing the script policy
async fn apply(migration: &Migration, tx: &mut dyn Transaction) -> MigrateResult<ExecResult> {
    let name = migration.name();
    match migration.action() {
        Action::Script(generate) => {
            let sql = generate(&mut *tx)
                .await
                .map_err(|e| MigrateError::execution(name, Phase::Generate, None, e))?;
            let class = sg_sql::classify(&sql);
            if !class.permits(migration.has_skip_if()) {
                return Err(MigrateError::Policy {
                    migration: name.clone(),
                    class,
                    reason: class.rejection_reason(),
                    sql,
                });
            }
            log::debug!("Executing {} script for {}", class, name);
            match tx.execute(&sql).await {
                Ok(result) => Ok(result),
                Err(e) => Err(MigrateError::execution(name, Phase::Execute, Some(sql), e)),
            }
        }
        Action::Computed(action) => {
            action(&mut *tx)
                .await
                .map_err(|e| MigrateError::execution(name, Phase::Execute, None, e))?;
            Ok(ExecResult::default())
        }
    }
}

/// Record a failed attempt in a fresh transaction and return the failure.
///
/// If the outcome cannot be recorded the result is a fatal
/// `StatusPersistence` error carrying the original failure.
async fn record_failure(
    driver: &MySqlDriver,
    migration: &mut Migration,
    failure: MigrateError,
) -> MigrateResult<ExecResult> {
    let name = migration.name().clone();
    let text = failure.recorded_text();
    log::warn!("Migration {} failed: {}", name, failure);
    log::debug!("Recording failure of {} in a fallback transaction", name);

    let persistence = |phase: Phase, source: DbError, failure: MigrateError| {
        MigrateError::StatusPersistence {
            migration: name.clone(),
            phase,
            original: Some(Box::new(failure)),
            source,
        }
    };

    let mut tx = match driver.database().begin(&driver.options().migration_tx).await {
        Ok(tx) => tx,
        Err(e) => return Err(persistence(Phase::Begin, e, failure)),
    };
    if let Some(schema) = driver.schema_override() {
        if let Err(e) = tx.execute(&use_statement(schema)).await {
            rollback_quietly(tx, &name).await;
            return Err(persistence(Phase::NamespaceSwitch, e, failure));
        }
    }
    let saved =
        status::save_status(tx.as_mut(), driver.tracking(), &name, false, Some(&text)).await;
    if let Err(e) = saved {
        rollback_quietly(tx, &name).await;
        return Err(persistence(Phase::StatusSave, e, failure));
    }
    if let Err(e) = tx.commit().await {
        return Err(persistence(Phase::Commit, e, failure));
    }

    migration.set_status(MigrationStatus::failed(text));
    Err(failure)
}

async fn rollback_quietly(tx: Box<dyn Transaction>, name: &MigrationName) {
    if let Err(e) = tx.rollback().await {
        log::debug!("Rollback of migration {} failed: {}", name, e);
    }
}

#[cfg(test)]
#[path = "executor_test.rs"]
mod tests;

//! Tracking table storage
//!
//! One row per migration, replaced after every attempt.

use crate::error::{MigrateError, MigrateResult};
use crate::migration::Migration;
use sg_core::{MigrationName, MigrationStatus, TrackingTable};
use sg_db::value::{get_bool, get_string};
use sg_db::{Database, DbError, DbResult, SqlValue, Transaction};
use std::collections::HashMap;

/// `CREATE TABLE` statement for the tracking table
pub fn create_table_sql(tracking: &TrackingTable) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (
    library     varchar(255) NOT NULL,
    migration   varchar(255) NOT NULL,
    done        boolean NOT NULL,
    error       text NOT NULL,
    updated_at  timestamp DEFAULT now(),
    PRIMARY KEY (library, migration)
) ENGINE = InnoDB",
        tracking.qualified()
    )
}

fn load_sql(tracking: &TrackingTable) -> String {
    format!(
        "SELECT library, migration, done FROM {}",
        tracking.qualified()
    )
}

fn save_sql(tracking: &TrackingTable) -> String {
    format!(
        "REPLACE INTO {} (library, migration, done, error, updated_at) VALUES (?, ?, ?, ?, now())",
        tracking.qualified()
    )
}

/// Create the tracking schema (when qualified) and table if absent
pub async fn ensure_tracking_table(db: &dyn Database, tracking: &TrackingTable) -> MigrateResult<()> {
    if let Some(schema) = tracking.schema() {
        log::debug!("Ensuring tracking schema {} exists", schema);
        db.execute(&format!("CREATE SCHEMA IF NOT EXISTS {}", schema))
            .await
            .map_err(|source| MigrateError::Tracking {
                table: tracking.qualified(),
                operation: "create schema",
                source,
            })?;
    }
    db.execute(&create_table_sql(tracking))
        .await
        .map_err(|source| MigrateError::Tracking {
            table: tracking.qualified(),
            operation: "create table",
            source,
        })?;
    log::info!("Tracking table {} is ready", tracking);
    Ok(())
}

/// Apply recorded statuses to `migrations` and return drifted names.
///
/// A drifted name is a completed row that matches no known migration: it
/// ran against this database but is no longer defined.
pub async fn load_statuses(
    db: &dyn Database,
    tracking: &TrackingTable,
    migrations: &mut [Migration],
) -> MigrateResult<Vec<MigrationName>> {
    let load_error = |source: DbError| MigrateError::Tracking {
        table: tracking.qualified(),
        operation: "load statuses",
        source,
    };
    let rows = db.query(&load_sql(tracking), &[]).await.map_err(load_error)?;

    let index: HashMap<MigrationName, usize> = migrations
        .iter()
        .enumerate()
        .map(|(i, m)| (m.name().clone(), i))
        .collect();

    let mut unknown = Vec::new();
    for row in &rows {
        let name = MigrationName::new(
            get_string(row, 0).map_err(load_error)?,
            get_string(row, 1).map_err(load_error)?,
        );
        let done = get_bool(row, 2).map_err(load_error)?;
        match index.get(&name) {
            Some(&i) => migrations[i].set_status(MigrationStatus { done, error: None }),
            None if done => {
                log::warn!(
                    "Migration {} is recorded as done in {} but is not defined",
                    name,
                    tracking
                );
                unknown.push(name);
            }
            None => {}
        }
    }
    log::info!(
        "Loaded {} migration statuses from {} ({} unknown completed)",
        rows.len(),
        tracking,
        unknown.len()
    );
    Ok(unknown)
}

/// Upsert one tracking row inside `tx`
pub async fn save_status(
    tx: &mut dyn Transaction,
    tracking: &TrackingTable,
    name: &MigrationName,
    done: bool,
    error: Option<&str>,
) -> DbResult<()> {
    log::info!(
        "Saving migration status: migration={} done={} error={}",
        name,
        done,
        error.unwrap_or("")
    );
    let params = [
        SqlValue::from(name.library.as_str()),
        SqlValue::from(name.name.as_str()),
        SqlValue::from(done),
        SqlValue::from(error.unwrap_or("")),
    ];
    tx.execute_with(&save_sql(tracking), &params).await?;
    Ok(())
}

#[cfg(test)]
#[path = "status_test.rs"]
mod tests;

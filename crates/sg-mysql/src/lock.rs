//! Cross-process migration lock
//!
//! MySQL advisory locks (`GET_LOCK`) belong to a session, not a
//! transaction. The manager opens a transaction only to pin one pooled
//! connection for as long as the lock is held.

use crate::error::{MigrateError, MigrateResult};
use sg_core::{TrackingTable, TxOptions};
use sg_db::{Database, DbError, SqlValue, Transaction};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

const LOCK_PREFIX: &str = "libschema_";

/// MySQL rejects longer lock names
const MAX_LOCK_NAME_LEN: usize = 64;

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// Advisory lock name for a tracking table
pub fn lock_name(tracking: &TrackingTable) -> String {
    let qualified = tracking.qualified();
    if LOCK_PREFIX.len() + qualified.len() <= MAX_LOCK_NAME_LEN {
        return format!("{}{}", LOCK_PREFIX, qualified);
    }
    let digest = format!("{:x}", Sha256::digest(qualified.as_bytes()));
    format!(
        "{}{}",
        LOCK_PREFIX,
        &digest[..MAX_LOCK_NAME_LEN - LOCK_PREFIX.len()]
    )
}

/// Proof of an acquired lock, required to release it.
///
/// Dropping a handle without [`LockManager::release`] keeps the lock and its
/// session; only [`LockManager::force_release`] frees the manager afterwards.
#[must_use = "the migration lock stays held until the handle is released"]
#[derive(Debug)]
pub struct LockHandle {
    id: u64,
    lock_name: String,
    released: bool,
}

impl LockHandle {
    pub fn lock_name(&self) -> &str {
        &self.lock_name
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        if !self.released {
            log::warn!(
                "Lock handle for '{}' dropped without release; the lock stays held until force_release",
                self.lock_name
            );
        }
    }
}

enum LockSlot {
    Free,
    Acquiring(u64),
    Held { id: u64, session: Box<dyn Transaction> },
}

/// Owns the advisory lock session for one tracking table
pub struct LockManager {
    lock_name: String,
    slot: Mutex<LockSlot>,
}

impl LockManager {
    pub fn new(tracking: &TrackingTable) -> Self {
        Self {
            lock_name: lock_name(tracking),
            slot: Mutex::new(LockSlot::Free),
        }
    }

    pub fn lock_name(&self) -> &str {
        &self.lock_name
    }

    /// Whether this manager holds the lock or is waiting for it
    pub fn is_held(&self) -> bool {
        !matches!(*self.slot(), LockSlot::Free)
    }

    fn slot(&self) -> MutexGuard<'_, LockSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_error(&self, operation: &'static str, source: DbError) -> MigrateError {
        MigrateError::Lock {
            lock_name: self.lock_name.clone(),
            operation,
            source,
        }
    }

    /// Take the lock, waiting indefinitely for other holders.
    ///
    /// A stale lock left by a process that never released it blocks here
    /// until its session ends. Dropping the returned future gives up the
    /// attempt.
    pub async fn acquire(&self, db: &dyn Database) -> MigrateResult<LockHandle> {
        let id = NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed);
        {
            let mut slot = self.slot();
            if !matches!(*slot, LockSlot::Free) {
                return Err(MigrateError::LockState(format!(
                    "Migration lock '{}' is already held by this manager",
                    self.lock_name
                )));
            }
            *slot = LockSlot::Acquiring(id);
        }
        let reservation = Reservation {
            manager: self,
            id,
            active: true,
        };

        log::debug!("Waiting for migration lock '{}'", self.lock_name);
        let mut session = db
            .begin(&TxOptions::default())
            .await
            .map_err(|e| self.lock_error("open session", e))?;
        let rows = session
            .query(
                "SELECT GET_LOCK(?, -1)",
                &[SqlValue::from(self.lock_name.as_str())],
            )
            .await
            .map_err(|e| self.lock_error("GET_LOCK", e))?;
        let granted = rows
            .first()
            .and_then(|row| row.first())
            .and_then(SqlValue::as_bool)
            .unwrap_or(false);
        if !granted {
            if let Err(e) = session.rollback().await {
                log::debug!("Closing lock session failed: {}", e);
            }
            return Err(self.lock_error(
                "GET_LOCK",
                DbError::ExecutionError(format!("lock '{}' was not granted", self.lock_name)),
            ));
        }

        reservation.keep();
        *self.slot() = LockSlot::Held { id, session };
        log::info!("Acquired migration lock '{}'", self.lock_name);
        Ok(LockHandle {
            id,
            lock_name: self.lock_name.clone(),
            released: false,
        })
    }

    /// Release the lock and close its session.
    ///
    /// The session is closed even when `RELEASE_LOCK` fails.
    pub async fn release(&self, mut handle: LockHandle) -> MigrateResult<()> {
        let session = {
            let mut slot = self.slot();
            match std::mem::replace(&mut *slot, LockSlot::Free) {
                LockSlot::Held { id, session } if id == handle.id => session,
                other => {
                    *slot = other;
                    return Err(MigrateError::LockState(format!(
                        "Migration lock '{}' is not held by this manager",
                        handle.lock_name
                    )));
                }
            }
        };
        handle.released = true;
        self.close_session(session).await
    }

    /// Release whatever lock session this manager holds, with or without its
    /// handle. Returns whether a session was closed.
    ///
    /// Recovers a manager whose handle was dropped without release. An
    /// acquire still waiting for the lock is left alone.
    pub async fn force_release(&self) -> MigrateResult<bool> {
        let session = {
            let mut slot = self.slot();
            match std::mem::replace(&mut *slot, LockSlot::Free) {
                LockSlot::Held { session, .. } => session,
                other => {
                    *slot = other;
                    return Ok(false);
                }
            }
        };
        log::warn!("Force-releasing migration lock '{}'", self.lock_name);
        self.close_session(session).await?;
        Ok(true)
    }

    async fn close_session(&self, mut session: Box<dyn Transaction>) -> MigrateResult<()> {
        let released = session
            .query(
                "SELECT RELEASE_LOCK(?)",
                &[SqlValue::from(self.lock_name.as_str())],
            )
            .await;
        let closed = session.rollback().await;

        let rows = released.map_err(|e| {
            if let Err(close_err) = &closed {
                log::debug!("Closing lock session failed: {}", close_err);
            }
            self.lock_error("RELEASE_LOCK", e)
        })?;
        closed.map_err(|e| self.lock_error("close session", e))?;
        if rows.first().and_then(|row| row.first()).and_then(SqlValue::as_bool) != Some(true) {
            log::warn!(
                "RELEASE_LOCK reported that '{}' was not held by the lock session",
                self.lock_name
            );
        }
        log::info!("Released migration lock '{}'", self.lock_name);
        Ok(())
    }
}

/// Frees the slot if an acquire attempt fails or is dropped mid-wait
struct Reservation<'a> {
    manager: &'a LockManager,
    id: u64,
    active: bool,
}

impl Reservation<'_> {
    fn keep(mut self) {
        self.active = false;
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        let mut slot = self.manager.slot();
        if matches!(*slot, LockSlot::Acquiring(id) if id == self.id) {
            *slot = LockSlot::Free;
        }
    }
}

#[cfg(test)]
#[path = "lock_test.rs"]
mod tests;

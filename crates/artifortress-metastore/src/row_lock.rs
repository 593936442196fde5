//! In-process stand-in for `SELECT ... FOR UPDATE`.
//!
//! A real relational store takes a row lock inside a transaction and
//! releases it at commit/rollback. Here, a row lock is a per-key
//! condition-variable-guarded flag acquired with a bounded wait; holding
//! the returned guard is "being inside the transaction that has the row
//! locked". Contention that isn't resolved inside the wait surfaces as
//! [`MetaError::Locked`], mirroring `LockFile::acquire_with_timeout`'s
//! bail-on-contention shape.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crate::error::MetaError;

struct Slot {
    held: Mutex<bool>,
    released: Condvar,
}

#[derive(Default)]
pub struct RowLockTable {
    slots: Mutex<HashMap<(String, String), Arc<Slot>>>,
}

pub struct RowGuard {
    slot: Arc<Slot>,
}

impl Drop for RowGuard {
    fn drop(&mut self) {
        let mut held = self.slot.held.lock().expect("row lock slot poisoned");
        *held = false;
        self.slot.released.notify_all();
    }
}

impl RowLockTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, table: &str, key: &str) -> Arc<Slot> {
        let mut slots = self.slots.lock().expect("row lock table poisoned");
        slots
            .entry((table.to_string(), key.to_string()))
            .or_insert_with(|| {
                Arc::new(Slot {
                    held: Mutex::new(false),
                    released: Condvar::new(),
                })
            })
            .clone()
    }

    /// Acquire a row lock, blocking up to `timeout`. Returns
    /// [`MetaError::Locked`] if another transaction still holds it when the
    /// wait expires.
    pub fn lock_row(&self, table: &str, key: &str, timeout: Duration) -> Result<RowGuard, MetaError> {
        let slot = self.slot(table, key);
        let mut held = slot.held.lock().expect("row lock slot poisoned");
        let mut remaining = timeout;
        while *held {
            let start = std::time::Instant::now();
            let (guard, result) = slot
                .released
                .wait_timeout(held, remaining)
                .expect("row lock slot poisoned");
            held = guard;
            if result.timed_out() {
                tracing::warn!(table = %table, key = %key, "row lock acquisition timed out");
                return Err(MetaError::Locked {
                    table: table.to_string(),
                    key: key.to_string(),
                });
            }
            remaining = remaining.saturating_sub(start.elapsed());
        }
        *held = true;
        drop(held);
        Ok(RowGuard { slot })
    }
}

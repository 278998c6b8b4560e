//! Atomic, line-serialized units of work.
//!
//! [`ConsistencyTransaction`] is the only way order-mutating operations reach
//! the store. Each attempt:
//!
//! 1. takes the line-scoped lock, waiting at most `lock_timeout`;
//! 2. opens a write unit on the store;
//! 3. runs the operation body against that unit;
//! 4. commits, or drops the unit so every partial write is rolled back.
//!
//! A `Conflict` from any step (lock timeout, busy storage) is retried up to
//! `max_retries` times before it reaches the caller. Every other error is
//! returned immediately.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};
use tracing::{debug, warn};

use crate::config::TransactionPolicy;
use crate::identifiers::LineId;
use crate::models::types::{NetworkError, Result};
use crate::store::{NetworkStore, StoreUnit};

type Registry = Mutex<HashMap<LineId, Arc<Mutex<()>>>>;

/// Registry of per-line exclusive locks.
///
/// Entries only live while some caller holds or waits on them, so the map
/// stays bounded by the number of lines in flight.
#[derive(Default)]
pub struct LineLocks {
    locks: Arc<Registry>,
}

/// Held for the lifetime of one attempt; releases the line on drop.
pub struct LineGuard {
    registry: Arc<Registry>,
    line_id: LineId,
    guard: Option<ArcMutexGuard<RawMutex, ()>>,
}

impl LineLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, line_id: LineId, timeout: std::time::Duration) -> Result<LineGuard> {
        let lock = self.locks.lock().entry(line_id).or_default().clone();

        match lock.try_lock_arc_for(timeout) {
            Some(guard) => Ok(LineGuard {
                registry: Arc::clone(&self.locks),
                line_id,
                guard: Some(guard),
            }),
            None => {
                drop(lock);
                release_entry(&self.locks, line_id);
                Err(NetworkError::Conflict(format!(
                    "line {line_id} still locked after {timeout:?}"
                )))
            }
        }
    }

    /// Number of lines currently held or waited on.
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Drop the registry entry for `line_id` once the map holds the last handle.
///
/// Handles are only cloned under the registry mutex, so a count of one here
/// means no other caller holds or waits on the lock.
fn release_entry(registry: &Registry, line_id: LineId) {
    let mut locks = registry.lock();
    if locks
        .get(&line_id)
        .is_some_and(|lock| Arc::strong_count(lock) == 1)
    {
        locks.remove(&line_id);
    }
}

impl Drop for LineGuard {
    fn drop(&mut self) {
        // Unlock and give back our handle before checking the count
        self.guard.take();
        release_entry(&self.registry, self.line_id);
    }
}

/// Runs closures as atomic units against a [`NetworkStore`].
pub struct ConsistencyTransaction<S> {
    store: Arc<S>,
    locks: LineLocks,
    policy: TransactionPolicy,
}

impl<S: NetworkStore> ConsistencyTransaction<S> {
    pub fn new(store: Arc<S>, policy: TransactionPolicy) -> Self {
        Self {
            store,
            locks: LineLocks::new(),
            policy,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> &TransactionPolicy {
        &self.policy
    }

    pub fn line_locks(&self) -> &LineLocks {
        &self.locks
    }

    /// Run `body` atomically while holding the lock for `line_id`.
    pub fn run_on_line<T>(
        &self,
        line_id: LineId,
        body: impl FnMut(&mut S::Unit) -> Result<T>,
    ) -> Result<T> {
        self.execute(Some(line_id), body)
    }

    /// Run `body` atomically without taking any line lock.
    ///
    /// For mutations that never touch order keys (creating categories,
    /// lines). The store still serializes writers.
    pub fn run<T>(&self, body: impl FnMut(&mut S::Unit) -> Result<T>) -> Result<T> {
        self.execute(None, body)
    }

    /// Run `body` against a read unit. Sees committed state only.
    pub fn read<T>(&self, body: impl FnOnce(&S::Unit) -> Result<T>) -> Result<T> {
        let unit = self.store.begin_read()?;
        body(&unit)
    }

    fn execute<T>(
        &self,
        scope: Option<LineId>,
        mut body: impl FnMut(&mut S::Unit) -> Result<T>,
    ) -> Result<T> {
        let mut retries = 0;
        loop {
            match self.attempt(scope, &mut body) {
                Err(NetworkError::Conflict(reason)) if retries < self.policy.max_retries => {
                    retries += 1;
                    warn!(
                        line = ?scope.map(LineId::get),
                        retry = retries,
                        %reason,
                        "transaction conflict, retrying"
                    );
                    thread::sleep(self.policy.retry_backoff * retries);
                }
                outcome => return outcome,
            }
        }
    }

    fn attempt<T>(
        &self,
        scope: Option<LineId>,
        body: &mut impl FnMut(&mut S::Unit) -> Result<T>,
    ) -> Result<T> {
        let _line = scope
            .map(|line_id| self.locks.acquire(line_id, self.policy.lock_timeout))
            .transpose()?;

        let mut unit = self.store.begin_write()?;
        let value = match body(&mut unit) {
            Ok(value) => value,
            Err(err) => {
                debug!(error = %err, "rolling back unit");
                return Err(err);
            }
        };
        unit.commit()?;
        Ok(value)
    }
}

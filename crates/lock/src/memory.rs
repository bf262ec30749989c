//! In-memory lock manager backed by per-key tokio mutexes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::config::LockConfig;
use crate::error::LockError;
use crate::key::{LockKey, LockKeySet};
use crate::manager::LockManager;

type SlotTable = HashMap<LockKey, Arc<AsyncMutex<()>>>;
type HolderTable = HashMap<LockKey, HolderId>;

/// Identity of a lock holder.
///
/// Tokio task ID where one exists, falling back to the OS thread for
/// callers polled outside a spawned task (a runtime's `block_on` body,
/// which is where `#[tokio::test]` bodies run). Such a root future is
/// polled on the blocked thread only, so the thread ID is stable for the
/// duration of the hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum HolderId {
    Task(tokio::task::Id),
    Thread(std::thread::ThreadId),
}

impl HolderId {
    fn current() -> Self {
        match tokio::task::try_id() {
            Some(id) => HolderId::Task(id),
            None => HolderId::Thread(std::thread::current().id()),
        }
    }
}

/// In-memory [`LockManager`] for single-process deployments and tests.
///
/// Each key maps to its own `tokio::sync::Mutex`, so callers contending
/// for the same key queue in FIFO-ish, non-starving order while disjoint
/// keys never interact. Every hold is tracked by its [`HolderId`], which
/// lets the manager reject re-entrant acquisition instead of deadlocking
/// and gives tests a probe into who holds what.
#[derive(Clone)]
pub struct InMemoryLockManager {
    slots: Arc<StdMutex<SlotTable>>,
    holders: Arc<StdMutex<HolderTable>>,
    acquire_timeout: Duration,
}

impl InMemoryLockManager {
    /// Creates a manager with the default configuration.
    pub fn new() -> Self {
        Self::with_config(LockConfig::default())
    }

    /// Creates a manager with the given configuration.
    pub fn with_config(config: LockConfig) -> Self {
        Self {
            slots: Arc::new(StdMutex::new(HashMap::new())),
            holders: Arc::new(StdMutex::new(HashMap::new())),
            acquire_timeout: config.acquire_timeout,
        }
    }

    /// Returns true if any task currently holds `key`.
    pub fn is_held(&self, key: &LockKey) -> bool {
        self.holders
            .lock()
            .map(|holders| holders.contains_key(key))
            .unwrap_or(false)
    }

    /// Returns true if the calling task (or thread, when called outside a
    /// spawned task) currently holds `key`.
    ///
    /// Used as the ledger's lock probe: operations that must only run
    /// inside a product's critical section assert through this.
    pub fn is_held_by_current_task(&self, key: &LockKey) -> bool {
        let current = HolderId::current();
        self.holders
            .lock()
            .map(|holders| holders.get(key) == Some(&current))
            .unwrap_or(false)
    }

    /// Number of keys currently held across all tasks.
    ///
    /// Zero whenever no critical section is in flight; tests use this to
    /// verify acquisition/release balance on every code path.
    pub fn active_hold_count(&self) -> usize {
        self.holders.lock().map(|holders| holders.len()).unwrap_or(0)
    }

    fn slot(&self, key: &LockKey) -> Result<Arc<AsyncMutex<()>>, LockError> {
        let mut slots = self.slots.lock().map_err(|_| poisoned())?;
        Ok(slots
            .entry(key.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone())
    }
}

impl Default for InMemoryLockManager {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> LockError {
    LockError::BackendUnavailable("lock table poisoned".to_string())
}

/// Guard over a set of acquired keys; releases all of them on drop.
///
/// The holder entries are cleared before the underlying mutexes unlock,
/// so an observer never sees a key as held after its mutex is free.
pub struct InMemoryLockGuard {
    keys: Vec<LockKey>,
    guards: Vec<OwnedMutexGuard<()>>,
    holders: Arc<StdMutex<HolderTable>>,
}

impl Drop for InMemoryLockGuard {
    fn drop(&mut self) {
        if let Ok(mut holders) = self.holders.lock() {
            for key in &self.keys {
                holders.remove(key);
            }
        }
        // `guards` drops next, unlocking the mutexes.
    }
}

#[async_trait]
impl LockManager for InMemoryLockManager {
    type Guard = InMemoryLockGuard;

    async fn acquire(&self, keys: &LockKeySet) -> Result<InMemoryLockGuard, LockError> {
        let current = HolderId::current();

        {
            let holders = self.holders.lock().map_err(|_| poisoned())?;
            for key in keys.iter() {
                if holders.get(key) == Some(&current) {
                    return Err(LockError::ReentrantAcquisition {
                        key: key.as_str().to_string(),
                    });
                }
            }
        }

        // Keys come pre-sorted from the set; acquiring in that order keeps
        // overlapping requests deadlock-free. A timeout mid-sequence drops
        // the partial guard, releasing everything acquired so far.
        let mut guard = InMemoryLockGuard {
            keys: Vec::with_capacity(keys.len()),
            guards: Vec::with_capacity(keys.len()),
            holders: Arc::clone(&self.holders),
        };

        for key in keys.iter() {
            let slot = self.slot(key)?;
            let acquired = tokio::time::timeout(self.acquire_timeout, slot.lock_owned())
                .await
                .map_err(|_| {
                    tracing::warn!(key = %key, waited = ?self.acquire_timeout, "lock acquisition timed out");
                    LockError::AcquireTimeout {
                        key: key.as_str().to_string(),
                        waited: self.acquire_timeout,
                    }
                })?;

            self.holders
                .lock()
                .map_err(|_| poisoned())?
                .insert(key.clone(), current);
            guard.keys.push(key.clone());
            guard.guards.push(acquired);
        }

        Ok(guard)
    }
}

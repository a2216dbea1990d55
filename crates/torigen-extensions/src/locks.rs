//! Per-extension operation locks
//!
//! At most one install/update/uninstall/toggle runs per id at a time. A
//! second operation on the same id waits for the first to finish.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Held for the duration of one operation on one id
#[derive(Debug)]
pub struct OperationGuard {
    _guard: OwnedMutexGuard<()>,
}

#[derive(Debug, Default)]
pub struct OperationLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl OperationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `id`
    pub async fn acquire(&self, id: &str) -> OperationGuard {
        let lock = self.slot(id);
        OperationGuard {
            _guard: lock.lock_owned().await,
        }
    }

    /// Take `id` only if no other operation holds it
    pub fn try_acquire(&self, id: &str) -> Option<OperationGuard> {
        let lock = self.slot(id);
        lock.try_lock_owned()
            .ok()
            .map(|guard| OperationGuard { _guard: guard })
    }

    /// Lock several ids in a fixed order so bulk operations cannot deadlock
    pub async fn acquire_many(&self, ids: &[String]) -> Vec<OperationGuard> {
        let mut sorted: Vec<&String> = ids.iter().collect();
        sorted.sort();
        sorted.dedup();

        let mut guards = Vec::with_capacity(sorted.len());
        for id in sorted {
            guards.push(self.acquire(id).await);
        }
        guards
    }

    /// Number of ids with a live lock slot
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock();
        // Slots nobody holds or waits on can go
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(
            locks
                .entry(id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
        )
    }
}

//! Key lock table for serializing file access.
//!
//! All read/write/delete operations against one key's file go through the
//! lock returned by [`KeyLocks::lock`]. The granularity is fixed at
//! construction:
//!
//! - **Coarse**: every key maps to the same mutex, so all cache file I/O is
//!   serialized. Throughput is traded for simplicity and bounded memory.
//! - **Per-key**: each key gets its own mutex from a concurrent table.
//!   Unrelated keys do not contend, but the table only ever grows - lock
//!   entries are never removed, so long-running processes with many distinct
//!   keys pay for it in memory.
//!
//! Guards are owned (`OwnedMutexGuard`) so they can be held across await
//! points and moved into spawned tasks.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::cache::config::LockStrategy;

/// Lock table with construction-time granularity.
pub(crate) struct KeyLocks {
    table: Table,
}

enum Table {
    Coarse(Arc<Mutex<()>>),
    PerKey(DashMap<String, Arc<Mutex<()>>>),
}

impl KeyLocks {
    pub(crate) fn new(strategy: LockStrategy) -> Self {
        let table = match strategy {
            LockStrategy::Coarse => Table::Coarse(Arc::new(Mutex::new(()))),
            LockStrategy::PerKey => Table::PerKey(DashMap::new()),
        };
        Self { table }
    }

    /// Acquire the lock covering `key`, waiting if it is held.
    pub(crate) async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let mutex = match &self.table {
            Table::Coarse(mutex) => Arc::clone(mutex),
            Table::PerKey(table) => Arc::clone(
                &table
                    .entry(key.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            ),
        };
        mutex.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_coarse_serializes_unrelated_keys() {
        let locks = KeyLocks::new(LockStrategy::Coarse);
        let _guard = locks.lock("a").await;

        let blocked = timeout(Duration::from_millis(50), locks.lock("b")).await;
        assert!(blocked.is_err(), "coarse lock should cover every key");
    }

    #[tokio::test]
    async fn test_per_key_allows_unrelated_keys() {
        let locks = KeyLocks::new(LockStrategy::PerKey);
        let _guard = locks.lock("a").await;

        let other = timeout(Duration::from_millis(50), locks.lock("b")).await;
        assert!(other.is_ok(), "different keys should not contend");
    }

    #[tokio::test]
    async fn test_per_key_serializes_same_key() {
        let locks = KeyLocks::new(LockStrategy::PerKey);
        let _guard = locks.lock("a").await;

        let blocked = timeout(Duration::from_millis(50), locks.lock("a")).await;
        assert!(blocked.is_err(), "same key must be serialized");
    }

    #[tokio::test]
    async fn test_lock_released_on_drop() {
        let locks = KeyLocks::new(LockStrategy::Coarse);
        {
            let _guard = locks.lock("a").await;
        }
        let reacquired = timeout(Duration::from_millis(50), locks.lock("a")).await;
        assert!(reacquired.is_ok());
    }
}

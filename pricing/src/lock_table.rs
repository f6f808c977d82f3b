//! Per-item lock table.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};
use tracing::debug;

use gamerate_common::CatalogId;

use crate::metrics::SharedMetrics;

/// Lock mode held by a guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Mutating access; excludes every other holder.
    Exclusive,
    /// Read access; compatible with other shared holders.
    Shared,
}

enum Held {
    Exclusive(OwnedRwLockWriteGuard<()>),
    Shared(OwnedRwLockReadGuard<()>),
}

/// Scope guard over one catalog item. The lock is released when the guard
/// is dropped, on every exit path.
pub struct ItemGuard {
    catalog_id: CatalogId,
    held: Held,
    metrics: SharedMetrics,
}

impl ItemGuard {
    /// Mode this guard holds.
    pub fn mode(&self) -> LockMode {
        match self.held {
            Held::Exclusive(_) => LockMode::Exclusive,
            Held::Shared(_) => LockMode::Shared,
        }
    }
}

impl Drop for ItemGuard {
    fn drop(&mut self) {
        self.metrics.lock_released();
    }
}

impl std::fmt::Debug for ItemGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemGuard")
            .field("catalog_id", &self.catalog_id)
            .field("mode", &self.mode())
            .finish()
    }
}

/// Table of catalog id to lock handle.
///
/// Handles are created lazily on first use. Entries no request holds are
/// dropped by [`ItemLocks::prune`].
pub struct ItemLocks {
    locks: Arc<DashMap<CatalogId, Arc<RwLock<()>>>>,
    metrics: SharedMetrics,
}

impl ItemLocks {
    /// Create an empty lock table.
    pub fn new(metrics: SharedMetrics) -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
            metrics,
        }
    }

    fn handle(&self, catalog_id: CatalogId) -> Arc<RwLock<()>> {
        self.locks
            .entry(catalog_id)
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone()
    }

    /// Acquire the item's lock for mutation.
    pub async fn exclusive(&self, catalog_id: CatalogId) -> ItemGuard {
        let held = Held::Exclusive(self.handle(catalog_id).write_owned().await);
        self.guard(catalog_id, held)
    }

    /// Acquire the item's lock for reading.
    pub async fn shared(&self, catalog_id: CatalogId) -> ItemGuard {
        let held = Held::Shared(self.handle(catalog_id).read_owned().await);
        self.guard(catalog_id, held)
    }

    fn guard(&self, catalog_id: CatalogId, held: Held) -> ItemGuard {
        self.metrics.lock_acquired();
        ItemGuard {
            catalog_id,
            held,
            metrics: self.metrics.clone(),
        }
    }

    /// Number of lock handles in the table.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    /// Drop handles that nobody holds or waits on.
    pub fn prune(&self) -> usize {
        let before = self.locks.len();
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        let pruned = before.saturating_sub(self.locks.len());
        if pruned > 0 {
            debug!(pruned, "Idle item locks pruned");
        }
        pruned
    }

    /// Run the prune loop.
    pub async fn run_prune_loop(&self, interval: Duration) {
        loop {
            tokio::time::sleep(interval).await;
            self.prune();
        }
    }
}

//! Metrics collection for price conversion monitoring.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Pricing metrics.
pub struct Metrics {
    /// Total conversions requested.
    pub conversions_total: AtomicU64,
    /// Conversions that persisted a value.
    pub conversions_succeeded: AtomicU64,
    /// Conversions that ended in an error.
    pub conversions_failed: AtomicU64,
    /// Base prices pulled from the price feed.
    pub base_price_fetches: AtomicU64,
    /// Calls to the price feed or rate source that failed.
    pub upstream_failures: AtomicU64,
    /// Total item locks acquired.
    pub locks_acquired: AtomicU64,
    /// Item locks currently held.
    pub locks_active: AtomicU64,
}

impl Metrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self {
            conversions_total: AtomicU64::new(0),
            conversions_succeeded: AtomicU64::new(0),
            conversions_failed: AtomicU64::new(0),
            base_price_fetches: AtomicU64::new(0),
            upstream_failures: AtomicU64::new(0),
            locks_acquired: AtomicU64::new(0),
            locks_active: AtomicU64::new(0),
        }
    }

    /// Increment conversions requested.
    pub fn conversion_started(&self) {
        self.conversions_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record conversion success.
    pub fn conversion_succeeded(&self) {
        self.conversions_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record conversion failure.
    pub fn conversion_failed(&self) {
        self.conversions_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a base price pulled from the feed.
    pub fn base_price_fetched(&self) {
        self.base_price_fetches.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed upstream call.
    pub fn upstream_failure(&self) {
        self.upstream_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment lock acquired.
    pub fn lock_acquired(&self) {
        self.locks_acquired.fetch_add(1, Ordering::Relaxed);
        self.locks_active.fetch_add(1, Ordering::Relaxed);
    }

    /// Record lock released.
    pub fn lock_released(&self) {
        self.locks_active.fetch_sub(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            conversions_total: self.conversions_total.load(Ordering::Relaxed),
            conversions_succeeded: self.conversions_succeeded.load(Ordering::Relaxed),
            conversions_failed: self.conversions_failed.load(Ordering::Relaxed),
            base_price_fetches: self.base_price_fetches.load(Ordering::Relaxed),
            upstream_failures: self.upstream_failures.load(Ordering::Relaxed),
            locks_acquired: self.locks_acquired.load(Ordering::Relaxed),
            locks_active: self.locks_active.load(Ordering::Relaxed),
        }
    }

    /// Export metrics in Prometheus format.
    pub fn to_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        format!(
            r#"# HELP gamerate_conversions_total Total number of conversions requested
# TYPE gamerate_conversions_total counter
gamerate_conversions_total {}

# HELP gamerate_conversions_succeeded Total successful conversions
# TYPE gamerate_conversions_succeeded counter
gamerate_conversions_succeeded {}

# HELP gamerate_conversions_failed Total failed conversions
# TYPE gamerate_conversions_failed counter
gamerate_conversions_failed {}

# HELP gamerate_base_price_fetches Total base prices pulled from the price feed
# TYPE gamerate_base_price_fetches counter
gamerate_base_price_fetches {}

# HELP gamerate_upstream_failures Total failed upstream calls
# TYPE gamerate_upstream_failures counter
gamerate_upstream_failures {}

# HELP gamerate_locks_acquired Total item locks acquired
# TYPE gamerate_locks_acquired counter
gamerate_locks_acquired {}

# HELP gamerate_locks_active Current held item locks
# TYPE gamerate_locks_active gauge
gamerate_locks_active {}
"#,
            snapshot.conversions_total,
            snapshot.conversions_succeeded,
            snapshot.conversions_failed,
            snapshot.base_price_fetches,
            snapshot.upstream_failures,
            snapshot.locks_acquired,
            snapshot.locks_active,
        )
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub conversions_total: u64,
    pub conversions_succeeded: u64,
    pub conversions_failed: u64,
    pub base_price_fetches: u64,
    pub upstream_failures: u64,
    pub locks_acquired: u64,
    pub locks_active: u64,
}

/// Shared metrics instance.
pub type SharedMetrics = Arc<Metrics>;

//! Latest-ask cache for the tracked symbols.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use gamerate_common::RateSymbol;
use tracing::{debug, info, instrument, warn};

use crate::error::{RateError, RateResult};
use crate::provider::RateProvider;
use crate::store::KeyValueStore;

/// Value `get` returns when a rate is unknown.
pub const UNKNOWN_RATE: f64 = 0.0;

/// Outcome of a refresh cycle.
#[derive(Debug, Clone)]
pub struct RefreshReport {
    /// Symbols overwritten with a fresh ask.
    pub updated: Vec<RateSymbol>,
    /// Symbols whose previous value was kept.
    pub failed: Vec<RateSymbol>,
    /// When the cycle finished.
    pub finished_at: DateTime<Utc>,
}

impl RefreshReport {
    /// Whether every symbol was refreshed.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Latest ask price per tracked symbol, backed by a key-value store and
/// refreshed by pull from a rate provider.
pub struct RateCache {
    store: Arc<dyn KeyValueStore>,
    provider: Arc<dyn RateProvider>,
}

impl RateCache {
    /// Create a new rate cache.
    pub fn new(store: Arc<dyn KeyValueStore>, provider: Arc<dyn RateProvider>) -> Self {
        Self { store, provider }
    }

    /// Reset the backing store and seed every symbol as unknown.
    ///
    /// An unreachable store is logged; the cache then serves the sentinel.
    #[instrument(skip(self))]
    pub async fn init(&self) {
        if let Err(e) = self.store.ping().await {
            warn!(error = %e, "Rate store unreachable");
            return;
        }

        if let Err(e) = self.store.flush().await {
            warn!(error = %e, "Failed to flush rate store");
        }

        for symbol in RateSymbol::ALL {
            if let Err(e) = self.set(symbol, UNKNOWN_RATE).await {
                warn!(symbol = %symbol, error = %e, "Failed to seed rate");
            }
        }

        info!("Rate store connected");
    }

    /// Last known ask for a symbol.
    ///
    /// Returns [`UNKNOWN_RATE`] when the value is absent, unreadable or the
    /// store is unreachable. Callers must not treat it as a real rate.
    pub async fn get(&self, symbol: RateSymbol) -> f64 {
        match self.store.get(symbol.as_str()).await {
            Ok(Some(raw)) => match raw.parse::<f64>() {
                Ok(value) if value.is_finite() => value,
                _ => {
                    warn!(symbol = %symbol, raw = %raw, "Unreadable cached rate");
                    UNKNOWN_RATE
                }
            },
            Ok(None) => UNKNOWN_RATE,
            Err(e) => {
                debug!(symbol = %symbol, error = %e, "Can't get rate from store");
                UNKNOWN_RATE
            }
        }
    }

    /// Overwrite the cached ask for a symbol.
    pub async fn set(&self, symbol: RateSymbol, price: f64) -> RateResult<()> {
        self.store.set(symbol.as_str(), price.to_string()).await
    }

    /// Fetch a fresh ask for one symbol and cache it.
    ///
    /// On failure the previous value stays in place.
    #[instrument(skip(self), fields(symbol = %symbol))]
    pub async fn refresh(&self, symbol: RateSymbol) -> RateResult<f64> {
        let ask = self.provider.fetch_ask(symbol).await?;

        if !ask.is_finite() || ask < 0.0 {
            return Err(RateError::InvalidPrice { symbol, price: ask });
        }

        self.set(symbol, ask).await?;
        debug!(ask, "Rate updated");
        Ok(ask)
    }

    /// Refresh every tracked symbol.
    ///
    /// Individual failures are logged and never propagate.
    #[instrument(skip(self))]
    pub async fn refresh_all(&self) -> RefreshReport {
        let mut updated = Vec::new();
        let mut failed = Vec::new();

        for symbol in RateSymbol::ALL {
            match self.refresh(symbol).await {
                Ok(_) => updated.push(symbol),
                Err(e) => {
                    warn!(
                        provider = self.provider.name(),
                        symbol = %symbol,
                        error = %e,
                        "Rate refresh failed, keeping previous value"
                    );
                    failed.push(symbol);
                }
            }
        }

        let report = RefreshReport {
            updated,
            failed,
            finished_at: Utc::now(),
        };

        info!(
            updated = report.updated.len(),
            failed = report.failed.len(),
            "Rate refresh finished"
        );

        report
    }

    /// All tracked symbols with their last known ask.
    pub async fn snapshot(&self) -> BTreeMap<RateSymbol, f64> {
        let mut rates = BTreeMap::new();
        for symbol in RateSymbol::ALL {
            rates.insert(symbol, self.get(symbol).await);
        }
        rates
    }

    /// Run the periodic refresh. The first refresh happens one interval
    /// after the call.
    pub async fn run_refresh_loop(&self, interval: Duration) {
        let start = tokio::time::Instant::now() + interval;
        let mut ticker = tokio::time::interval_at(start, interval);
        loop {
            ticker.tick().await;
            let report = self.refresh_all().await;
            debug!(finished_at = %report.finished_at, "Last update of all rates");
        }
    }
}

/// Shared rate cache.
pub type SharedRateCache = Arc<RateCache>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockRateProvider;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use tokio_test::assert_ok;

    struct UnreachableStore;

    #[async_trait]
    impl KeyValueStore for UnreachableStore {
        async fn get(&self, _key: &str) -> RateResult<Option<String>> {
            Err(RateError::Store("connection refused".to_string()))
        }

        async fn set(&self, _key: &str, _value: String) -> RateResult<()> {
            Err(RateError::Store("connection refused".to_string()))
        }

        async fn flush(&self) -> RateResult<()> {
            Err(RateError::Store("connection refused".to_string()))
        }

        async fn ping(&self) -> RateResult<()> {
            Err(RateError::Store("connection refused".to_string()))
        }
    }

    fn setup_cache() -> (RateCache, Arc<MockRateProvider>) {
        let provider = Arc::new(MockRateProvider::new("test"));
        provider.set_ask(RateSymbol::BtcUsd, 50000.0);
        provider.set_ask(RateSymbol::BtcEur, 45000.0);
        provider.set_ask(RateSymbol::BtcGbp, 39000.0);
        provider.set_ask(RateSymbol::BtcRub, 4500000.0);

        let cache = RateCache::new(Arc::new(MemoryStore::new()), provider.clone());
        (cache, provider)
    }

    #[tokio::test]
    async fn test_init_seeds_unknown_rates() {
        let (cache, _) = setup_cache();
        cache.init().await;

        let snapshot = cache.snapshot().await;
        assert_eq!(snapshot.len(), 4);
        assert!(snapshot.values().all(|v| *v == UNKNOWN_RATE));
    }

    #[tokio::test]
    async fn test_refresh_all() {
        let (cache, _) = setup_cache();
        cache.init().await;

        let report = cache.refresh_all().await;

        assert!(report.is_complete());
        assert_eq!(report.updated.len(), 4);
        assert_eq!(cache.get(RateSymbol::BtcUsd).await, 50000.0);
        assert_eq!(cache.get(RateSymbol::BtcRub).await, 4500000.0);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_value() {
        let (cache, provider) = setup_cache();
        cache.init().await;
        cache.refresh_all().await;

        provider.set_ask(RateSymbol::BtcUsd, 51000.0);
        provider.set_ask(RateSymbol::BtcEur, 46000.0);
        provider.fail(RateSymbol::BtcEur);

        let report = cache.refresh_all().await;

        assert_eq!(report.failed, vec![RateSymbol::BtcEur]);
        assert_eq!(cache.get(RateSymbol::BtcUsd).await, 51000.0);
        assert_eq!(cache.get(RateSymbol::BtcEur).await, 45000.0);
    }

    #[tokio::test]
    async fn test_invalid_ask_never_cached() {
        let (cache, provider) = setup_cache();
        cache.init().await;
        cache.refresh_all().await;

        provider.set_ask(RateSymbol::BtcGbp, -1.0);
        assert!(cache.refresh(RateSymbol::BtcGbp).await.is_err());

        let value = cache.get(RateSymbol::BtcGbp).await;
        assert_eq!(value, 39000.0);
        assert!(value >= 0.0);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let (cache, _) = setup_cache();
        cache.init().await;

        assert_ok!(cache.set(RateSymbol::BtcRub, 155.55).await);
        assert_eq!(cache.get(RateSymbol::BtcRub).await, 155.55);
    }

    #[tokio::test]
    async fn test_unreachable_store_returns_sentinel() {
        let provider = Arc::new(MockRateProvider::new("test"));
        provider.set_ask(RateSymbol::BtcUsd, 50000.0);
        let cache = RateCache::new(Arc::new(UnreachableStore), provider);

        cache.init().await;

        assert_eq!(cache.get(RateSymbol::BtcUsd).await, UNKNOWN_RATE);
        assert!(matches!(
            cache.refresh(RateSymbol::BtcUsd).await,
            Err(RateError::Store(_))
        ));
        assert!(cache.refresh_all().await.updated.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_loop_ticks() {
        let (cache, provider) = setup_cache();
        let cache = Arc::new(cache);
        cache.init().await;

        let looping = cache.clone();
        let handle = tokio::spawn(async move {
            looping.run_refresh_loop(Duration::from_millis(20)).await;
        });

        tokio::time::sleep(Duration::from_millis(110)).await;
        handle.abort();

        assert!(provider.calls() >= 4);
        assert_eq!(cache.get(RateSymbol::BtcEur).await, 45000.0);
    }
}

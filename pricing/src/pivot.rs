//! Sources of BTC pivot rates.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use gamerate_common::{GameRateError, RateSymbol, Result};
use gamerate_rates::RateCache;

use crate::config::CurrencyApiConfig;

/// Latest ask price per tracked BTC pair.
///
/// Implementations may hand back the zero sentinel for an unknown rate;
/// the engine guards against it.
#[async_trait]
pub trait PivotRates: Send + Sync {
    /// Current ask for a symbol.
    async fn ask(&self, symbol: RateSymbol) -> Result<f64>;
}

#[derive(Debug, Deserialize)]
struct RateValue {
    value: f64,
}

/// Client for the rate service's HTTP surface.
pub struct CurrencyApiClient {
    client: reqwest::Client,
    config: CurrencyApiConfig,
}

impl CurrencyApiClient {
    /// Create a new client.
    pub fn new(config: CurrencyApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GameRateError::UpstreamUnavailable(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn rate_url(&self, symbol: RateSymbol) -> String {
        format!(
            "{}/currency/{}",
            self.config.base_url.trim_end_matches('/'),
            symbol
        )
    }
}

#[async_trait]
impl PivotRates for CurrencyApiClient {
    async fn ask(&self, symbol: RateSymbol) -> Result<f64> {
        let response = self
            .client
            .get(self.rate_url(symbol))
            .send()
            .await
            .map_err(|e| GameRateError::UpstreamUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GameRateError::UpstreamUnavailable(format!(
                "rate service answered {} for {}",
                response.status(),
                symbol
            )));
        }

        let rate: RateValue = response
            .json()
            .await
            .map_err(|e| GameRateError::ParseError(e.to_string()))?;

        debug!(symbol = %symbol, value = rate.value, "Got pivot rate");
        Ok(rate.value)
    }
}

#[async_trait]
impl PivotRates for RateCache {
    async fn ask(&self, symbol: RateSymbol) -> Result<f64> {
        Ok(self.get(symbol).await)
    }
}

/// Mock pivot rates for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockPivotRates {
    rates: dashmap::DashMap<RateSymbol, f64>,
    failing: dashmap::DashSet<RateSymbol>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockPivotRates {
    /// Create a mock with every rate unknown.
    pub fn new() -> Self {
        Self {
            rates: dashmap::DashMap::new(),
            failing: dashmap::DashSet::new(),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Set the ask for a symbol.
    pub fn set_rate(&self, symbol: RateSymbol, value: f64) {
        self.rates.insert(symbol, value);
    }

    /// Make lookups of a symbol fail.
    pub fn fail(&self, symbol: RateSymbol) {
        self.failing.insert(symbol);
    }

    /// Number of lookups made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Default for MockPivotRates {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl PivotRates for MockPivotRates {
    async fn ask(&self, symbol: RateSymbol) -> Result<f64> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        if self.failing.contains(&symbol) {
            return Err(GameRateError::UpstreamUnavailable(format!(
                "{} unreachable",
                symbol
            )));
        }

        Ok(self.rates.get(&symbol).map(|r| *r).unwrap_or(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use gamerate_rates::{MemoryStore, MockRateProvider};

    #[test]
    fn test_rate_url() {
        let client = CurrencyApiClient::new(CurrencyApiConfig {
            base_url: "http://localhost:8888/api/".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(
            client.rate_url(RateSymbol::BtcEur),
            "http://localhost:8888/api/currency/BTCEUR"
        );
    }

    #[tokio::test]
    async fn test_rate_cache_as_pivot_source() {
        let provider = Arc::new(MockRateProvider::new("test"));
        provider.set_ask(RateSymbol::BtcUsd, 50000.0);
        let cache = RateCache::new(Arc::new(MemoryStore::new()), provider);
        cache.init().await;

        assert_eq!(cache.ask(RateSymbol::BtcUsd).await, Ok(0.0));

        cache.refresh(RateSymbol::BtcUsd).await.unwrap();
        assert_eq!(cache.ask(RateSymbol::BtcUsd).await, Ok(50000.0));
    }

    #[tokio::test]
    async fn test_mock_pivot_rates() {
        let rates = MockPivotRates::new();
        rates.set_rate(RateSymbol::BtcUsd, 50000.0);
        rates.fail(RateSymbol::BtcRub);

        assert_eq!(rates.ask(RateSymbol::BtcUsd).await, Ok(50000.0));
        assert_eq!(rates.ask(RateSymbol::BtcGbp).await, Ok(0.0));
        assert!(rates.ask(RateSymbol::BtcRub).await.is_err());
        assert_eq!(rates.calls(), 3);
    }
}

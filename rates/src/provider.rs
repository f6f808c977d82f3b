//! Rate provider trait and implementations.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use gamerate_common::RateSymbol;
use hkdf::Hkdf;
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, warn};

use crate::error::{RateError, RateResult};

/// Trait for exchange-rate feeds.
///
/// One call, one answer: implementations do not retry. The caller owns the
/// failure policy.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Fetch the current ask price for a tracked symbol.
    async fn fetch_ask(&self, symbol: RateSymbol) -> RateResult<f64>;
}

/// Configuration for the BitcoinAverage ticker client.
#[derive(Debug, Clone)]
pub struct BitcoinAverageConfig {
    /// Base URL of the global ticker index; the symbol is appended.
    pub base_url: String,
    /// API public key.
    pub public_key: String,
    /// API secret key.
    pub secret_key: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for BitcoinAverageConfig {
    fn default() -> Self {
        Self {
            base_url: "https://apiv2.bitcoinaverage.com/indices/global/ticker".to_string(),
            public_key: String::new(),
            secret_key: String::new(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl BitcoinAverageConfig {
    /// Whether request signing credentials are configured.
    pub fn has_credentials(&self) -> bool {
        !self.public_key.is_empty() && !self.secret_key.is_empty()
    }
}

/// Ticker body. Failures come back as `{"success": false, "error": "..."}`.
#[derive(Debug, Deserialize)]
struct TickerResponse {
    ask: Option<f64>,
    success: Option<bool>,
    error: Option<String>,
}

/// Client for the BitcoinAverage global ticker.
pub struct BitcoinAverageProvider {
    client: reqwest::Client,
    config: BitcoinAverageConfig,
}

impl BitcoinAverageProvider {
    /// Create a new provider.
    pub fn new(config: BitcoinAverageConfig) -> RateResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RateError::Transport(e.to_string()))?;

        if !config.has_credentials() {
            warn!("BitcoinAverage credentials not configured, requests will be unsigned");
        }

        Ok(Self { client, config })
    }

    fn ticker_url(&self, symbol: RateSymbol) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), symbol)
    }
}

#[async_trait]
impl RateProvider for BitcoinAverageProvider {
    fn name(&self) -> &str {
        "bitcoinaverage"
    }

    async fn fetch_ask(&self, symbol: RateSymbol) -> RateResult<f64> {
        let mut request = self.client.get(self.ticker_url(symbol));
        if self.config.has_credentials() {
            request = request.header(
                "X-signature",
                signature_header(
                    &self.config.public_key,
                    &self.config.secret_key,
                    Utc::now().timestamp(),
                ),
            );
        }

        let response = request
            .send()
            .await
            .map_err(|e| RateError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| RateError::Transport(e.to_string()))?;

        let ask = parse_ticker(symbol, status, &body)?;
        debug!(symbol = %symbol, ask, "Got ask from rate feed");
        Ok(ask)
    }
}

/// Build the `X-signature` header value.
///
/// The digest is HMAC-SHA256 keyed by the secret over
/// `"{timestamp}.{public_key}"`. HKDF-Extract is defined as exactly that
/// HMAC with the salt as key.
pub fn signature_header(public_key: &str, secret_key: &str, timestamp: i64) -> String {
    let payload = format!("{}.{}", timestamp, public_key);
    let (digest, _) = Hkdf::<Sha256>::extract(Some(secret_key.as_bytes()), payload.as_bytes());
    format!("{}.{}", payload, hex::encode(digest))
}

/// Read an ask price out of a ticker response.
fn parse_ticker(symbol: RateSymbol, status: u16, body: &str) -> RateResult<f64> {
    let ok_status = (200..300).contains(&status);

    let ticker: TickerResponse = match serde_json::from_str(body) {
        Ok(ticker) => ticker,
        Err(_) if !ok_status => {
            return Err(RateError::Rejected {
                symbol,
                reason: format!("HTTP {}", status),
            })
        }
        Err(e) => return Err(RateError::Parse(e.to_string())),
    };

    if !ok_status || ticker.success == Some(false) {
        return Err(RateError::Rejected {
            symbol,
            reason: ticker
                .error
                .unwrap_or_else(|| format!("HTTP {}", status)),
        });
    }

    let ask = ticker
        .ask
        .ok_or_else(|| RateError::Parse(format!("no ask in ticker for {}", symbol)))?;

    if !ask.is_finite() || ask <= 0.0 {
        return Err(RateError::InvalidPrice { symbol, price: ask });
    }

    Ok(ask)
}

/// Mock rate provider for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateProvider {
    name: String,
    asks: dashmap::DashMap<RateSymbol, f64>,
    failing: dashmap::DashSet<RateSymbol>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateProvider {
    /// Create a new mock provider.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            asks: dashmap::DashMap::new(),
            failing: dashmap::DashSet::new(),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Set the ask returned for a symbol.
    pub fn set_ask(&self, symbol: RateSymbol, ask: f64) {
        self.asks.insert(symbol, ask);
    }

    /// Make every fetch of a symbol fail with a transport error.
    pub fn fail(&self, symbol: RateSymbol) {
        self.failing.insert(symbol);
    }

    /// Number of fetches made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateProvider for MockRateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_ask(&self, symbol: RateSymbol) -> RateResult<f64> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        if self.failing.contains(&symbol) {
            return Err(RateError::Transport(format!("{} unreachable", self.name)));
        }

        let ask = self
            .asks
            .get(&symbol)
            .map(|a| *a)
            .ok_or_else(|| RateError::Rejected {
                symbol,
                reason: "no such ticker".to_string(),
            })?;

        if !ask.is_finite() || ask <= 0.0 {
            return Err(RateError::InvalidPrice { symbol, price: ask });
        }

        Ok(ask)
    }
}

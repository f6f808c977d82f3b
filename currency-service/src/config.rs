//! Currency service configuration.

use std::time::Duration;

use gamerate_rates::BitcoinAverageConfig;

/// Main currency service configuration.
#[derive(Debug, Clone)]
pub struct CurrencyServiceConfig {
    /// Listen address.
    pub listen_addr: String,
    /// Prefix every API route is nested under.
    pub api_prefix: String,
    /// Interval between scheduled refreshes of every rate.
    pub refresh_interval: Duration,
    /// Refresh every rate once at startup instead of waiting a full interval.
    pub refresh_on_start: bool,
    /// Rate feed configuration.
    pub feed: BitcoinAverageConfig,
    /// Log level used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for CurrencyServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8888".to_string(),
            api_prefix: "/api".to_string(),
            refresh_interval: Duration::from_secs(5 * 60),
            refresh_on_start: true,
            feed: BitcoinAverageConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl CurrencyServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from a variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("CURRENCY_LISTEN_ADDR") {
            config.listen_addr = addr;
        }

        if let Some(prefix) = lookup("CURRENCY_API_PREFIX") {
            config.api_prefix = prefix;
        }

        if let Some(minutes) = lookup("CURRENCY_REFRESH_MINUTES") {
            if let Ok(minutes) = minutes.parse::<u64>() {
                config.refresh_interval = Duration::from_secs(minutes * 60);
            }
        }

        if let Some(flag) = lookup("CURRENCY_REFRESH_ON_START") {
            if let Ok(flag) = flag.parse() {
                config.refresh_on_start = flag;
            }
        }

        if let Some(url) = lookup("CURRENCY_FEED_URL") {
            config.feed.base_url = url;
        }

        if let Some(key) = lookup("CURRENCY_PUBLIC_KEY") {
            config.feed.public_key = key;
        }

        if let Some(key) = lookup("CURRENCY_SECRET_KEY") {
            config.feed.secret_key = key;
        }

        if let Some(secs) = lookup("CURRENCY_REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.feed.request_timeout = Duration::from_secs(secs);
            }
        }

        if let Some(level) = lookup("CURRENCY_LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_addr.is_empty() {
            return Err("Listen address cannot be empty".to_string());
        }

        if !self.api_prefix.starts_with('/') {
            return Err(format!("API prefix must start with '/': {}", self.api_prefix));
        }

        if self.refresh_interval.is_zero() {
            return Err("Refresh interval cannot be 0".to_string());
        }

        if self.feed.base_url.is_empty() {
            return Err("Feed URL cannot be empty".to_string());
        }

        if self.feed.request_timeout.is_zero() {
            return Err("Request timeout cannot be 0".to_string());
        }

        Ok(())
    }
}

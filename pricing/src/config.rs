//! Pricing configuration.

use std::time::Duration;

/// Lock table configuration.
#[derive(Debug, Clone)]
pub struct LockConfig {
    /// Interval between prunes of idle item locks.
    pub prune_interval: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            prune_interval: Duration::from_secs(60),
        }
    }
}

/// Price conversion engine configuration.
#[derive(Debug, Clone, Default)]
pub struct PriceEngineConfig {
    /// Pull the base price from the feed on every conversion, not only when
    /// it is unset.
    pub always_refresh_base: bool,
    /// Lock configuration.
    pub lock_config: LockConfig,
}

/// Storefront endpoints.
#[derive(Debug, Clone)]
pub struct StoreFeedConfig {
    /// Per-item price endpoint.
    pub store_api_url: String,
    /// Full catalog listing endpoint.
    pub app_list_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for StoreFeedConfig {
    fn default() -> Self {
        Self {
            store_api_url: "https://store.steampowered.com/api/appdetails/".to_string(),
            app_list_url: "https://api.steampowered.com/ISteamApps/GetAppList/v2".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Rate service endpoint.
#[derive(Debug, Clone)]
pub struct CurrencyApiConfig {
    /// Base URL of the rate service API, including its prefix.
    pub base_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for CurrencyApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8888/api".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl StoreFeedConfig {
    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.store_api_url.is_empty() || self.app_list_url.is_empty() {
            return Err("Storefront URLs cannot be empty".to_string());
        }

        if self.request_timeout.is_zero() {
            return Err("Request timeout cannot be 0".to_string());
        }

        Ok(())
    }
}

impl CurrencyApiConfig {
    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("Currency API URL cannot be empty".to_string());
        }

        if self.request_timeout.is_zero() {
            return Err("Request timeout cannot be 0".to_string());
        }

        Ok(())
    }
}

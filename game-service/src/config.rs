//! Game service configuration.

use std::time::Duration;

use gamerate_pricing::{CurrencyApiConfig, PriceEngineConfig, StoreFeedConfig};

/// Main game service configuration.
#[derive(Debug, Clone)]
pub struct GameServiceConfig {
    /// Listen address.
    pub listen_addr: String,
    /// Prefix every API route is nested under.
    pub api_prefix: String,
    /// Storefront endpoints.
    pub store_feed: StoreFeedConfig,
    /// Rate service endpoint.
    pub currency_api: CurrencyApiConfig,
    /// Postgres URL; empty selects the in-memory catalog.
    pub database_url: String,
    /// Replace the catalog with the storefront listing at startup.
    pub ingest_on_start: bool,
    /// Engine configuration.
    pub engine: PriceEngineConfig,
    /// Log level used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for GameServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8099".to_string(),
            api_prefix: "/api".to_string(),
            store_feed: StoreFeedConfig::default(),
            currency_api: CurrencyApiConfig::default(),
            database_url: String::new(),
            ingest_on_start: true,
            engine: PriceEngineConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl GameServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from a variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("GAMEAPP_LISTEN_ADDR") {
            config.listen_addr = addr;
        }

        if let Some(prefix) = lookup("GAMEAPP_API_PREFIX") {
            config.api_prefix = prefix;
        }

        if let Some(url) = lookup("GAMEAPP_CURRENCY_API_URL") {
            config.currency_api.base_url = url;
        }

        if let Some(url) = lookup("GAMEAPP_STORE_API_URL") {
            config.store_feed.store_api_url = url;
        }

        if let Some(url) = lookup("GAMEAPP_APP_LIST_URL") {
            config.store_feed.app_list_url = url;
        }

        if let Some(url) = lookup("GAMEAPP_DATABASE_URL") {
            config.database_url = url;
        }

        if let Some(secs) = lookup("GAMEAPP_REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.set_request_timeout(Duration::from_secs(secs));
            }
        }

        if let Some(flag) = lookup("GAMEAPP_INGEST_ON_START") {
            if let Ok(flag) = flag.parse() {
                config.ingest_on_start = flag;
            }
        }

        if let Some(flag) = lookup("GAMEAPP_ALWAYS_REFRESH_BASE") {
            if let Ok(flag) = flag.parse() {
                config.engine.always_refresh_base = flag;
            }
        }

        if let Some(level) = lookup("GAMEAPP_LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Set the timeout of every outbound request.
    pub fn set_request_timeout(&mut self, timeout: Duration) {
        self.store_feed.request_timeout = timeout;
        self.currency_api.request_timeout = timeout;
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_addr.is_empty() {
            return Err("Listen address cannot be empty".to_string());
        }

        if !self.api_prefix.starts_with('/') {
            return Err(format!("API prefix must start with '/': {}", self.api_prefix));
        }

        if self.engine.lock_config.prune_interval.is_zero() {
            return Err("Lock prune interval cannot be 0".to_string());
        }

        self.store_feed.validate()?;
        self.currency_api.validate()?;

        Ok(())
    }
}

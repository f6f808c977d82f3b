//! Storefront price feed.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use gamerate_common::{CatalogEntry, CatalogId, GameRateError, Result};

use crate::config::StoreFeedConfig;

/// Source of base prices and of the catalog listing.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Current base (USD) price of an item, in cents.
    async fn fetch_base_price(&self, catalog_id: CatalogId) -> Result<i64>;

    /// Every item the storefront lists.
    async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>>;
}

#[derive(Debug, Deserialize)]
struct AppDetails {
    success: bool,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct PriceOverview {
    #[serde(rename = "final")]
    final_cents: i64,
}

#[derive(Debug, Deserialize)]
struct AppListResponse {
    applist: AppList,
}

#[derive(Debug, Deserialize)]
struct AppList {
    apps: Vec<AppListEntry>,
}

#[derive(Debug, Deserialize)]
struct AppListEntry {
    appid: i64,
    name: String,
}

/// Client for the Steam storefront.
pub struct SteamStoreClient {
    client: reqwest::Client,
    config: StoreFeedConfig,
}

impl SteamStoreClient {
    /// Create a new storefront client.
    pub fn new(config: StoreFeedConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GameRateError::UpstreamUnavailable(e.to_string()))?;
        Ok(Self { client, config })
    }

    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<(u16, String)> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| GameRateError::UpstreamUnavailable(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| GameRateError::UpstreamUnavailable(e.to_string()))?;
        Ok((status, body))
    }
}

#[async_trait]
impl PriceFeed for SteamStoreClient {
    async fn fetch_base_price(&self, catalog_id: CatalogId) -> Result<i64> {
        let query = [
            ("appids", catalog_id.to_string()),
            ("cc", "us".to_string()),
            ("filters", "price_overview".to_string()),
        ];
        let (status, body) = self.get(&self.config.store_api_url, &query).await?;

        let cents = parse_app_details(catalog_id, status, &body)?;
        debug!(catalog_id = %catalog_id, cents, "Got base price from storefront");
        Ok(cents)
    }

    async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>> {
        let (status, body) = self.get(&self.config.app_list_url, &[]).await?;
        parse_app_list(status, &body)
    }
}

fn check_status(status: u16) -> Result<()> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(GameRateError::UpstreamUnavailable(format!(
            "storefront answered HTTP {}",
            status
        )))
    }
}

/// Read the final price in cents out of an app-details response.
///
/// A listed item without a price overview is free.
fn parse_app_details(catalog_id: CatalogId, status: u16, body: &str) -> Result<i64> {
    check_status(status)?;

    let mut details: HashMap<String, AppDetails> =
        serde_json::from_str(body).map_err(|e| GameRateError::ParseError(e.to_string()))?;

    let entry = details
        .remove(&catalog_id.to_string())
        .filter(|d| d.success)
        .ok_or(GameRateError::NotFoundUpstream(catalog_id))?;

    let overview = entry
        .data
        .as_ref()
        .and_then(|data| data.get("price_overview"))
        .cloned();

    match overview {
        Some(value) => {
            let overview: PriceOverview = serde_json::from_value(value)
                .map_err(|e| GameRateError::ParseError(e.to_string()))?;
            if overview.final_cents < 0 {
                return Err(GameRateError::ParseError(format!(
                    "negative price {} for {}",
                    overview.final_cents, catalog_id
                )));
            }
            Ok(overview.final_cents)
        }
        None => Ok(0),
    }
}

fn parse_app_list(status: u16, body: &str) -> Result<Vec<CatalogEntry>> {
    check_status(status)?;

    let response: AppListResponse =
        serde_json::from_str(body).map_err(|e| GameRateError::ParseError(e.to_string()))?;

    Ok(response
        .applist
        .apps
        .into_iter()
        .filter(|app| app.appid >= 0)
        .map(|app| CatalogEntry::new(CatalogId::new(app.appid), app.name))
        .collect())
}

/// Mock price feed for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockPriceFeed {
    prices: dashmap::DashMap<CatalogId, i64>,
    catalog: parking_lot::Mutex<Vec<CatalogEntry>>,
    failure: parking_lot::Mutex<Option<GameRateError>>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockPriceFeed {
    /// Create an empty mock feed.
    pub fn new() -> Self {
        Self {
            prices: dashmap::DashMap::new(),
            catalog: parking_lot::Mutex::new(Vec::new()),
            failure: parking_lot::Mutex::new(None),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Set the base price of an item, in cents.
    pub fn set_price(&self, catalog_id: CatalogId, cents: i64) {
        self.prices.insert(catalog_id, cents);
    }

    /// Set the catalog listing.
    pub fn set_catalog(&self, entries: Vec<CatalogEntry>) {
        *self.catalog.lock() = entries;
    }

    /// Make every call fail with the given error.
    pub fn fail_with(&self, error: GameRateError) {
        *self.failure.lock() = Some(error);
    }

    /// Number of calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn record_call(&self) -> Result<()> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        match self.failure.lock().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Default for MockPriceFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl PriceFeed for MockPriceFeed {
    async fn fetch_base_price(&self, catalog_id: CatalogId) -> Result<i64> {
        self.record_call()?;
        self.prices
            .get(&catalog_id)
            .map(|p| *p)
            .ok_or(GameRateError::NotFoundUpstream(catalog_id))
    }

    async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>> {
        self.record_call()?;
        Ok(self.catalog.lock().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price_overview() {
        let body = r#"{"237110": {"success": true, "data": {"price_overview": {
            "currency": "USD", "initial": 1999, "final": 999, "discount_percent": 50,
            "initial_formatted": "$19.99", "final_formatted": "$9.99"}}}}"#;

        let cents = parse_app_details(CatalogId::new(237110), 200, body).unwrap();
        assert_eq!(cents, 999);
    }

    #[test]
    fn test_free_item_has_zero_price() {
        let body = r#"{"570": {"success": true, "data": []}}"#;
        assert_eq!(parse_app_details(CatalogId::new(570), 200, body).unwrap(), 0);
    }

    #[test]
    fn test_unlisted_item() {
        let id = CatalogId::new(1);
        let body = r#"{"1": {"success": false}}"#;
        assert_eq!(
            parse_app_details(id, 200, body),
            Err(GameRateError::NotFoundUpstream(id))
        );
        assert_eq!(
            parse_app_details(id, 200, "{}"),
            Err(GameRateError::NotFoundUpstream(id))
        );
    }

    #[test]
    fn test_malformed_and_failed_responses() {
        let id = CatalogId::new(20);
        assert!(matches!(
            parse_app_details(id, 200, "null?"),
            Err(GameRateError::ParseError(_))
        ));
        assert!(matches!(
            parse_app_details(id, 200, r#"{"20": {"success": true, "data": {"price_overview": {"final": "free"}}}}"#),
            Err(GameRateError::ParseError(_))
        ));
        assert!(matches!(
            parse_app_details(id, 429, ""),
            Err(GameRateError::UpstreamUnavailable(_))
        ));
    }

    #[test]
    fn test_parse_app_list() {
        let body = r#"{"applist": {"apps": [
            {"appid": 10, "name": "Counter-Strike"},
            {"appid": 20, "name": "Team Fortress Classic"}
        ]}}"#;

        let entries = parse_app_list(200, body).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1], CatalogEntry::new(CatalogId::new(20), "Team Fortress Classic"));
    }

    #[tokio::test]
    async fn test_mock_feed() {
        let feed = MockPriceFeed::new();
        feed.set_price(CatalogId::new(20), 999);

        assert_eq!(feed.fetch_base_price(CatalogId::new(20)).await, Ok(999));
        assert!(matches!(
            feed.fetch_base_price(CatalogId::new(30)).await,
            Err(GameRateError::NotFoundUpstream(_))
        ));

        feed.fail_with(GameRateError::UpstreamUnavailable("down".into()));
        assert!(feed.fetch_catalog().await.is_err());
        assert_eq!(feed.calls(), 3);
    }
}

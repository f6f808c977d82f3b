//! GameRate Pricing
//!
//! The price conversion pipeline: per-item locking, base prices from the
//! storefront, BTC pivot rates, conversion arithmetic and field-level
//! persistence.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use gamerate_pricing::{ConversionRequest, Metrics, PriceEngine, PriceEngineConfig};
//! use gamerate_common::{CatalogId, Currency};
//!
//! let engine = PriceEngine::new(store, feed, rates, Arc::new(Metrics::new()), PriceEngineConfig::default());
//! let item = engine
//!     .convert(ConversionRequest::new(CatalogId::new(237110), Currency::Eur))
//!     .await?;
//! ```

pub mod config;
pub mod conversion;
pub mod engine;
pub mod ingest;
pub mod lock_table;
pub mod metrics;
pub mod pivot;
pub mod price_feed;

pub use config::{CurrencyApiConfig, LockConfig, PriceEngineConfig, StoreFeedConfig};
pub use conversion::{ConversionRequest, PivotQuote, PriceConversion};
pub use engine::{PriceEngine, SharedPriceEngine};
pub use ingest::{ingest_catalog, IngestReport};
pub use lock_table::{ItemGuard, ItemLocks, LockMode};
pub use metrics::{Metrics, MetricsSnapshot, SharedMetrics};
pub use pivot::{CurrencyApiClient, PivotRates};
pub use price_feed::{PriceFeed, SteamStoreClient};

#[cfg(any(test, feature = "test-utils"))]
pub use pivot::MockPivotRates;
#[cfg(any(test, feature = "test-utils"))]
pub use price_feed::MockPriceFeed;

//! GameRate Rates
//!
//! Exchange-rate plumbing for the currency service.
//!
//! # Features
//!
//! - Rate client for the BitcoinAverage global ticker
//! - Key-value store seam for the latest ask per tracked symbol
//! - Rate cache with per-symbol refresh and partial-failure tolerance
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use gamerate_rates::{BitcoinAverageProvider, MemoryStore, RateCache};
//! use gamerate_common::RateSymbol;
//!
//! let provider = Arc::new(BitcoinAverageProvider::new(config)?);
//! let cache = RateCache::new(Arc::new(MemoryStore::new()), provider);
//! cache.init().await;
//!
//! cache.refresh_all().await;
//! let btc_usd = cache.get(RateSymbol::BtcUsd).await;
//! ```

pub mod provider;
pub mod store;
pub mod cache;
pub mod error;

pub use provider::{BitcoinAverageConfig, BitcoinAverageProvider, RateProvider};
pub use store::{KeyValueStore, MemoryStore};
pub use cache::{RateCache, RefreshReport, SharedRateCache, UNKNOWN_RATE};
pub use error::{RateError, RateResult};

#[cfg(any(test, feature = "test-utils"))]
pub use provider::MockRateProvider;

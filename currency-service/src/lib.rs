//! GameRate Currency Service
//!
//! Serves the latest BTC ask prices over HTTP and keeps them fresh with a
//! periodic pull from the rate feed.

pub mod config;
pub mod error;
pub mod routes;

pub use config::CurrencyServiceConfig;
pub use error::ApiError;
pub use routes::{router, AppState};

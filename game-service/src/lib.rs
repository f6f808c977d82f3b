//! GameRate Game Service
//!
//! Prices storefront games in USD, EUR, GBP, RUB and BTC on request.

pub mod config;
pub mod error;
pub mod routes;

pub use config::GameServiceConfig;
pub use error::ApiError;
pub use routes::{router, AppState};

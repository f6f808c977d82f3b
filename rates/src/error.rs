//! Rate error types.

use gamerate_common::{GameRateError, RateSymbol};
use thiserror::Error;

/// Errors that can occur while fetching or caching rates.
#[derive(Debug, Error)]
pub enum RateError {
    /// The feed could not be reached.
    #[error("Rate feed transport error: {0}")]
    Transport(String),

    /// The feed answered but marked the request as unsuccessful.
    #[error("Rate feed rejected request for {symbol}: {reason}")]
    Rejected { symbol: RateSymbol, reason: String },

    /// The feed answered with a body we could not read.
    #[error("Malformed rate feed response: {0}")]
    Parse(String),

    /// The feed returned a price that cannot be a rate.
    #[error("Invalid price {price} for {symbol}")]
    InvalidPrice { symbol: RateSymbol, price: f64 },

    /// The backing key-value store failed.
    #[error("Rate store error: {0}")]
    Store(String),
}

/// Result type for rate operations.
pub type RateResult<T> = Result<T, RateError>;

impl From<RateError> for GameRateError {
    fn from(e: RateError) -> Self {
        match e {
            RateError::Parse(msg) => GameRateError::ParseError(msg),
            RateError::Store(msg) => GameRateError::PersistError(msg),
            other => GameRateError::UpstreamUnavailable(other.to_string()),
        }
    }
}

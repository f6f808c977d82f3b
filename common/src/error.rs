//! Error types for the price-conversion pipeline.

use crate::CatalogId;
use thiserror::Error;

/// Main error type for GameRate operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GameRateError {
    /// Catalog item or symbol absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The price feed has no record for this catalog id.
    #[error("No upstream record for catalog id {0}")]
    NotFoundUpstream(CatalogId),

    /// External feed unreachable or reported failure.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Malformed upstream payload.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Store write failed.
    #[error("Persist error: {0}")]
    PersistError(String),

    /// Unsupported currency code or malformed id.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl GameRateError {
    /// Check if repeating the request could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GameRateError::UpstreamUnavailable(_) | GameRateError::PersistError(_)
        )
    }

    /// Stable error code for logs and responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            GameRateError::NotFound(_) => "NOT_FOUND",
            GameRateError::NotFoundUpstream(_) => "NOT_FOUND_UPSTREAM",
            GameRateError::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            GameRateError::ParseError(_) => "PARSE_ERROR",
            GameRateError::PersistError(_) => "PERSIST_ERROR",
            GameRateError::InvalidInput(_) => "INVALID_INPUT",
        }
    }
}

/// Result type alias for GameRate operations.
pub type Result<T> = std::result::Result<T, GameRateError>;

//! Catalog store errors.

use gamerate_common::{GameRateError, StorageId};
use thiserror::Error;

/// Errors raised by a catalog store.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The backing store failed.
    #[error("Catalog backend error: {0}")]
    Backend(String),

    /// No record with this storage id.
    #[error("Catalog record not found: {0}")]
    NotFound(StorageId),
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::Backend(e.to_string())
    }
}

impl From<CatalogError> for GameRateError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Backend(msg) => GameRateError::PersistError(msg),
            CatalogError::NotFound(id) => GameRateError::NotFound(id.to_string()),
        }
    }
}

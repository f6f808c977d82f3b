//! Catalog store seam.

use std::sync::Arc;

use async_trait::async_trait;
use gamerate_common::{CatalogId, CatalogItem, PriceField, StorageId};

use crate::error::CatalogResult;

/// Collection of catalog records.
///
/// Lookups go by the external catalog id; writes go by the storage id.
/// There is no optimistic-concurrency check on writes: callers serialize
/// mutation of one record themselves.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Remove every record.
    ///
    /// Must not run concurrently with live traffic.
    async fn reset(&self) -> CatalogResult<()>;

    /// Insert records, returning how many were stored.
    async fn insert_many(&self, items: Vec<CatalogItem>) -> CatalogResult<usize>;

    /// Find a record by catalog id. Absence is `Ok(None)`.
    async fn find_by_catalog_id(&self, appid: CatalogId) -> CatalogResult<Option<CatalogItem>>;

    /// Set a single price field.
    async fn update_field(&self, id: StorageId, field: PriceField, value: f64) -> CatalogResult<()>;

    /// Number of records held.
    async fn count(&self) -> CatalogResult<usize>;
}

/// Shared catalog store handle.
pub type SharedCatalogStore = Arc<dyn CatalogStore>;

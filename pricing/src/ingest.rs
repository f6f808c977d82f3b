//! Catalog ingestion.

use tracing::{info, instrument};

use gamerate_catalog::CatalogStore;
use gamerate_common::{CatalogEntry, Result};

use crate::price_feed::PriceFeed;

/// Outcome of an ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    /// Entries the feed listed.
    pub fetched: usize,
    /// Records stored.
    pub inserted: usize,
}

/// Replace the stored catalog with the feed's listing, every price zeroed.
///
/// The listing is fetched before the store is reset, so a failed fetch
/// leaves the previous catalog in place. Must not run concurrently with
/// live traffic.
#[instrument(skip_all)]
pub async fn ingest_catalog(store: &dyn CatalogStore, feed: &dyn PriceFeed) -> Result<IngestReport> {
    let entries = feed.fetch_catalog().await?;
    let fetched = entries.len();

    store.reset().await?;

    let items = entries.into_iter().map(CatalogEntry::into_item).collect();
    let inserted = store.insert_many(items).await?;

    info!(fetched, inserted, "Catalog ingested");
    Ok(IngestReport { fetched, inserted })
}

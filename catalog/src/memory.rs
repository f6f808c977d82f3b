//! In-memory catalog store.

use std::collections::HashMap;

use async_trait::async_trait;
use gamerate_common::{CatalogId, CatalogItem, PriceField, StorageId};
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{CatalogError, CatalogResult};
use crate::store::CatalogStore;

#[derive(Default)]
struct Records {
    items: HashMap<StorageId, CatalogItem>,
    by_catalog_id: HashMap<CatalogId, StorageId>,
}

/// Catalog store held in process memory.
///
/// The record map and the catalog-id index sit behind one lock so a reset
/// clears both at once.
#[derive(Default)]
pub struct MemoryCatalogStore {
    records: RwLock<Records>,
}

impl MemoryCatalogStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn reset(&self) -> CatalogResult<()> {
        let mut records = self.records.write();
        records.items.clear();
        records.by_catalog_id.clear();
        Ok(())
    }

    async fn insert_many(&self, items: Vec<CatalogItem>) -> CatalogResult<usize> {
        let mut records = self.records.write();
        let mut inserted = 0;

        for item in items {
            // First record with a catalog id owns the index entry.
            records.by_catalog_id.entry(item.appid).or_insert(item.id);
            records.items.insert(item.id, item);
            inserted += 1;
        }

        debug!(inserted, "Catalog records inserted");
        Ok(inserted)
    }

    async fn find_by_catalog_id(&self, appid: CatalogId) -> CatalogResult<Option<CatalogItem>> {
        let records = self.records.read();
        Ok(records
            .by_catalog_id
            .get(&appid)
            .and_then(|id| records.items.get(id))
            .cloned())
    }

    async fn update_field(&self, id: StorageId, field: PriceField, value: f64) -> CatalogResult<()> {
        let mut records = self.records.write();
        let item = records
            .items
            .get_mut(&id)
            .ok_or(CatalogError::NotFound(id))?;
        item.set_price(field.currency(), value);
        Ok(())
    }

    async fn count(&self) -> CatalogResult<usize> {
        Ok(self.records.read().items.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamerate_common::Currency;
    use tokio_test::assert_ok;

    fn item(appid: i64, name: &str) -> CatalogItem {
        CatalogItem::new(CatalogId::new(appid), name)
    }

    #[tokio::test]
    async fn test_find_by_catalog_id() {
        let store = MemoryCatalogStore::new();
        store
            .insert_many(vec![item(10, "Counter-Strike"), item(20, "Team Fortress Classic")])
            .await
            .unwrap();

        let found = store.find_by_catalog_id(CatalogId::new(20)).await.unwrap();
        assert_eq!(found.map(|i| i.name), Some("Team Fortress Classic".to_string()));

        let missing = store.find_by_catalog_id(CatalogId::new(30)).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_catalog_id_first_wins() {
        let store = MemoryCatalogStore::new();
        let first = item(10, "Counter-Strike");
        let first_id = first.id;
        store
            .insert_many(vec![first, item(10, "Counter-Strike (dup)")])
            .await
            .unwrap();

        let found = store
            .find_by_catalog_id(CatalogId::new(10))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, first_id);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_field() {
        let store = MemoryCatalogStore::new();
        let record = item(10, "Counter-Strike");
        let id = record.id;
        store.insert_many(vec![record]).await.unwrap();

        assert_ok!(store.update_field(id, Currency::Eur.into(), 8.99).await);

        let found = store
            .find_by_catalog_id(CatalogId::new(10))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.eur, 8.99);
        assert_eq!(found.usd, 0.0);
    }

    #[tokio::test]
    async fn test_update_unknown_record() {
        let store = MemoryCatalogStore::new();
        let result = store
            .update_field(StorageId::new(), Currency::Usd.into(), 1.0)
            .await;
        assert!(matches!(result, Err(CatalogError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_reset_clears_index() {
        let store = MemoryCatalogStore::new();
        store.insert_many(vec![item(10, "Counter-Strike")]).await.unwrap();

        store.reset().await.unwrap();

        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store
            .find_by_catalog_id(CatalogId::new(10))
            .await
            .unwrap()
            .is_none());
    }
}

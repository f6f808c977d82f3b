//! Postgres-backed catalog store.

use std::time::Duration;

use async_trait::async_trait;
use gamerate_common::{CatalogId, CatalogItem, PriceField, StorageId};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{info, instrument};

use crate::error::{CatalogError, CatalogResult};
use crate::store::CatalogStore;

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS games (
    seq   BIGSERIAL,
    id    UUID PRIMARY KEY,
    appid BIGINT NOT NULL,
    name  TEXT NOT NULL,
    "USD" DOUBLE PRECISION NOT NULL DEFAULT 0,
    "EUR" DOUBLE PRECISION NOT NULL DEFAULT 0,
    "GBP" DOUBLE PRECISION NOT NULL DEFAULT 0,
    "RUB" DOUBLE PRECISION NOT NULL DEFAULT 0,
    "BTC" DOUBLE PRECISION NOT NULL DEFAULT 0
)
"#;

const CREATE_INDEX: &str = "CREATE INDEX IF NOT EXISTS games_appid_idx ON games (appid)";

const SELECT_BY_APPID: &str = r#"
SELECT id, appid, name, "USD", "EUR", "GBP", "RUB", "BTC"
FROM games
WHERE appid = $1
ORDER BY seq
LIMIT 1
"#;

const INSERT: &str = r#"
INSERT INTO games (id, appid, name, "USD", "EUR", "GBP", "RUB", "BTC")
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
"#;

/// Connection settings for the Postgres store.
#[derive(Debug, Clone)]
pub struct PgStoreConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl PgStoreConfig {
    /// Settings for a database URL with default pool limits.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// Catalog store over a Postgres `games` table.
#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    /// Connect a pool.
    pub async fn connect(config: &PgStoreConfig) -> CatalogResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the table and its catalog-id index if missing.
    #[instrument(skip(self))]
    pub async fn migrate(&self) -> CatalogResult<()> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_INDEX).execute(&self.pool).await?;
        info!("Catalog schema ready");
        Ok(())
    }
}

/// `UPDATE` statement for one price column. Column names come from the
/// closed [`PriceField`] set, never from input.
fn update_statement(field: PriceField) -> String {
    format!(r#"UPDATE games SET "{}" = $1 WHERE id = $2"#, field.name())
}

fn item_from_row(row: &PgRow) -> Result<CatalogItem, sqlx::Error> {
    let id: uuid::Uuid = row.try_get("id")?;
    let appid: i64 = row.try_get("appid")?;
    Ok(CatalogItem {
        id: StorageId::from_uuid(id),
        appid: CatalogId::new(appid),
        name: row.try_get("name")?,
        usd: row.try_get("USD")?,
        eur: row.try_get("EUR")?,
        gbp: row.try_get("GBP")?,
        rub: row.try_get("RUB")?,
        btc: row.try_get("BTC")?,
    })
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn reset(&self) -> CatalogResult<()> {
        sqlx::query("TRUNCATE games").execute(&self.pool).await?;
        Ok(())
    }

    #[instrument(skip(self, items), fields(items = items.len()))]
    async fn insert_many(&self, items: Vec<CatalogItem>) -> CatalogResult<usize> {
        let mut tx = self.pool.begin().await?;

        for item in &items {
            sqlx::query(INSERT)
                .bind(*item.id.as_uuid())
                .bind(item.appid.value())
                .bind(&item.name)
                .bind(item.usd)
                .bind(item.eur)
                .bind(item.gbp)
                .bind(item.rub)
                .bind(item.btc)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(items.len())
    }

    async fn find_by_catalog_id(&self, appid: CatalogId) -> CatalogResult<Option<CatalogItem>> {
        let row = sqlx::query(SELECT_BY_APPID)
            .bind(appid.value())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref()
            .map(item_from_row)
            .transpose()
            .map_err(CatalogError::from)
    }

    async fn update_field(&self, id: StorageId, field: PriceField, value: f64) -> CatalogResult<()> {
        let result = sqlx::query(&update_statement(field))
            .bind(value)
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound(id));
        }
        Ok(())
    }

    async fn count(&self) -> CatalogResult<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM games")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamerate_common::Currency;

    #[test]
    fn test_update_statement_targets_quoted_column() {
        assert_eq!(
            update_statement(Currency::Gbp.into()),
            r#"UPDATE games SET "GBP" = $1 WHERE id = $2"#
        );
        assert_eq!(
            update_statement(Currency::Btc.into()),
            r#"UPDATE games SET "BTC" = $1 WHERE id = $2"#
        );
    }

    #[test]
    fn test_pool_defaults() {
        let config = PgStoreConfig::new("postgres://localhost/gamerate");
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.acquire_timeout, Duration::from_secs(5));
    }
}

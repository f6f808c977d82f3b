//! Price conversion engine.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use gamerate_catalog::SharedCatalogStore;
use gamerate_common::{
    rate_from_f64, to_f64, CatalogId, CatalogItem, Currency, GameRateError, RateSymbol, Result,
};

use crate::config::PriceEngineConfig;
use crate::conversion::{self, ConversionRequest, PivotQuote, PriceConversion};
use crate::lock_table::ItemLocks;
use crate::metrics::SharedMetrics;
use crate::pivot::PivotRates;
use crate::price_feed::PriceFeed;

/// Prices catalog items in a target currency through the BTC pivot.
///
/// Each conversion runs lookup, lock, base price check, pivot rate fetch,
/// conversion and a single field write. Every read and write of an item's
/// price fields happens under that item's exclusive lock, and the lock is
/// released on every exit path.
pub struct PriceEngine {
    store: SharedCatalogStore,
    feed: Arc<dyn PriceFeed>,
    rates: Arc<dyn PivotRates>,
    locks: Arc<ItemLocks>,
    metrics: SharedMetrics,
    config: PriceEngineConfig,
}

impl PriceEngine {
    /// Create a new engine.
    pub fn new(
        store: SharedCatalogStore,
        feed: Arc<dyn PriceFeed>,
        rates: Arc<dyn PivotRates>,
        metrics: SharedMetrics,
        config: PriceEngineConfig,
    ) -> Self {
        Self {
            store,
            feed,
            rates,
            locks: Arc::new(ItemLocks::new(metrics.clone())),
            metrics,
            config,
        }
    }

    /// Get the item lock table.
    pub fn locks(&self) -> Arc<ItemLocks> {
        self.locks.clone()
    }

    /// Get the metrics.
    pub fn metrics(&self) -> SharedMetrics {
        self.metrics.clone()
    }

    /// Get the engine configuration.
    pub fn config(&self) -> &PriceEngineConfig {
        &self.config
    }

    /// Price an item in the requested currency and persist the result.
    ///
    /// Returns the full updated item.
    #[instrument(skip(self), fields(catalog_id = %request.catalog_id, target = %request.target))]
    pub async fn convert(&self, request: ConversionRequest) -> Result<CatalogItem> {
        self.metrics.conversion_started();

        match self.run_conversion(request).await {
            Ok((item, conversion)) => {
                self.metrics.conversion_succeeded();
                info!(
                    conversion_id = %conversion.id,
                    base_cents = %conversion.base_cents,
                    value = %conversion.value,
                    "Price converted"
                );
                Ok(item)
            }
            Err(e) => {
                self.metrics.conversion_failed();
                if matches!(
                    e,
                    GameRateError::UpstreamUnavailable(_) | GameRateError::NotFoundUpstream(_)
                ) {
                    self.metrics.upstream_failure();
                }
                warn!(
                    error_code = e.error_code(),
                    retryable = e.is_retryable(),
                    error = %e,
                    "Conversion failed"
                );
                Err(e)
            }
        }
    }

    /// Current record of an item, read under a shared lock.
    pub async fn item(&self, catalog_id: CatalogId) -> Result<CatalogItem> {
        let _guard = self.locks.shared(catalog_id).await;
        self.lookup(catalog_id).await
    }

    async fn run_conversion(
        &self,
        request: ConversionRequest,
    ) -> Result<(CatalogItem, PriceConversion)> {
        let catalog_id = request.catalog_id;

        // Unknown ids fail here, before any lock or external call.
        self.lookup(catalog_id).await?;

        let _guard = self.locks.exclusive(catalog_id).await;
        let mut item = self.lookup(catalog_id).await?;

        // A fresh base price is only stored once the conversion has succeeded.
        let fresh_usd =
            if request.force_refresh || self.config.always_refresh_base || !item.has_base_price() {
                let usd = self.fetch_base_price(item.appid).await?;
                item.usd = usd;
                Some(usd)
            } else {
                None
            };

        let base_cents = item.base_cost_cents().ok_or_else(|| {
            GameRateError::ParseError(format!("unreadable base price {}", item.usd))
        })?;

        let quote = self.fetch_quote(request.target).await?;
        let value = conversion::convert(base_cents, request.target, &quote)?;
        let stored = to_f64(value);

        if let Some(usd) = fresh_usd {
            if request.target != Currency::Usd {
                self.persist(&item, Currency::Usd, usd).await?;
                debug!(catalog_id = %item.appid, usd, "Base price updated");
            }
        }
        self.persist(&item, request.target, stored).await?;
        item.set_price(request.target, stored);

        let record = PriceConversion::new(catalog_id, request.target, base_cents, quote, value);
        Ok((item, record))
    }

    async fn lookup(&self, catalog_id: CatalogId) -> Result<CatalogItem> {
        self.store
            .find_by_catalog_id(catalog_id)
            .await?
            .ok_or_else(|| GameRateError::NotFound(format!("catalog id {}", catalog_id)))
    }

    async fn fetch_base_price(&self, catalog_id: CatalogId) -> Result<f64> {
        let cents = self.feed.fetch_base_price(catalog_id).await?;
        self.metrics.base_price_fetched();
        Ok(to_f64(conversion::usd_price(Decimal::from(cents))))
    }

    async fn persist(&self, item: &CatalogItem, currency: Currency, value: f64) -> Result<()> {
        self.store
            .update_field(item.id, currency.into(), value)
            .await
            .map_err(|e| GameRateError::PersistError(e.to_string()))
    }

    async fn fetch_quote(&self, target: Currency) -> Result<PivotQuote> {
        let mut quote = PivotQuote::default();

        for symbol in conversion::required_symbols(target) {
            let ask = self.rates.ask(symbol).await?;
            let rate = rate_from_f64(ask).ok_or_else(|| {
                GameRateError::UpstreamUnavailable(format!("{} rate unknown ({})", symbol, ask))
            })?;

            match symbol {
                RateSymbol::BtcUsd => quote.btc_usd = Some(rate),
                _ => quote.btc_target = Some(rate),
            }
        }

        Ok(quote)
    }
}

/// Shared engine handle.
pub type SharedPriceEngine = Arc<PriceEngine>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Metrics;
    use crate::pivot::MockPivotRates;
    use crate::price_feed::MockPriceFeed;
    use gamerate_catalog::{CatalogStore, MemoryCatalogStore};

    const APP: i64 = 20;

    struct Fixture {
        engine: Arc<PriceEngine>,
        store: Arc<MemoryCatalogStore>,
        feed: Arc<MockPriceFeed>,
        rates: Arc<MockPivotRates>,
        metrics: SharedMetrics,
    }

    async fn setup_engine(config: PriceEngineConfig) -> Fixture {
        let store = Arc::new(MemoryCatalogStore::new());
        store
            .insert_many(vec![CatalogItem::new(CatalogId::new(APP), "Team Fortress Classic")])
            .await
            .unwrap();

        let feed = Arc::new(MockPriceFeed::new());
        feed.set_price(CatalogId::new(APP), 999);

        let rates = Arc::new(MockPivotRates::new());
        rates.set_rate(RateSymbol::BtcUsd, 50000.0);
        rates.set_rate(RateSymbol::BtcEur, 45000.0);
        rates.set_rate(RateSymbol::BtcGbp, 39000.0);
        rates.set_rate(RateSymbol::BtcRub, 4500000.0);

        let metrics = Arc::new(Metrics::new());
        let engine = Arc::new(PriceEngine::new(
            store.clone(),
            feed.clone(),
            rates.clone(),
            metrics.clone(),
            config,
        ));

        Fixture {
            engine,
            store,
            feed,
            rates,
            metrics,
        }
    }

    fn assert_price(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    async fn stored(store: &MemoryCatalogStore) -> CatalogItem {
        store
            .find_by_catalog_id(CatalogId::new(APP))
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_convert_to_eur() {
        let fx = setup_engine(PriceEngineConfig::default()).await;

        let item = fx
            .engine
            .convert(ConversionRequest::new(CatalogId::new(APP), Currency::Eur))
            .await
            .unwrap();

        assert_price(item.usd, 9.99);
        assert_price(item.eur, 8.99);
        assert_eq!(item, stored(&fx.store).await);
        assert_eq!(fx.feed.calls(), 1);
        assert_eq!(fx.metrics.snapshot().conversions_succeeded, 1);
    }

    #[tokio::test]
    async fn test_convert_to_usd_is_identity() {
        let fx = setup_engine(PriceEngineConfig::default()).await;

        let item = fx
            .engine
            .convert(ConversionRequest::new(CatalogId::new(APP), Currency::Usd))
            .await
            .unwrap();

        assert_price(item.usd, 9.99);
        assert_eq!(fx.rates.calls(), 0);
    }

    #[tokio::test]
    async fn test_convert_to_btc_unrounded() {
        let fx = setup_engine(PriceEngineConfig::default()).await;

        let item = fx
            .engine
            .convert(ConversionRequest::new(CatalogId::new(APP), Currency::Btc))
            .await
            .unwrap();

        assert_price(item.btc, 0.0001998);
    }

    #[tokio::test]
    async fn test_unknown_item_makes_no_external_calls() {
        let fx = setup_engine(PriceEngineConfig::default()).await;

        let result = fx
            .engine
            .convert(ConversionRequest::new(CatalogId::new(30), Currency::Eur))
            .await;

        assert!(matches!(result, Err(GameRateError::NotFound(_))));
        assert_eq!(fx.feed.calls(), 0);
        assert_eq!(fx.rates.calls(), 0);
        assert_eq!(fx.metrics.snapshot().locks_acquired, 0);
    }

    #[tokio::test]
    async fn test_unknown_pivot_rate_writes_nothing() {
        let fx = setup_engine(PriceEngineConfig::default()).await;
        let before = stored(&fx.store).await;
        fx.store
            .update_field(before.id, Currency::Usd.into(), 9.99)
            .await
            .unwrap();
        fx.rates.set_rate(RateSymbol::BtcUsd, 0.0);

        for target in [Currency::Eur, Currency::Gbp, Currency::Rub] {
            let result = fx
                .engine
                .convert(ConversionRequest::new(CatalogId::new(APP), target))
                .await;
            assert!(matches!(result, Err(GameRateError::UpstreamUnavailable(_))));
        }

        let after = stored(&fx.store).await;
        assert_price(after.usd, 9.99);
        assert_eq!((after.eur, after.gbp, after.rub), (0.0, 0.0, 0.0));
        assert_eq!(fx.feed.calls(), 0);
        assert_eq!(fx.metrics.snapshot().locks_active, 0);
    }

    #[tokio::test]
    async fn test_failed_conversion_leaves_unpriced_item_untouched() {
        let fx = setup_engine(PriceEngineConfig::default()).await;
        fx.rates.set_rate(RateSymbol::BtcUsd, 0.0);

        let result = fx
            .engine
            .convert(ConversionRequest::new(CatalogId::new(APP), Currency::Eur))
            .await;
        assert!(matches!(result, Err(GameRateError::UpstreamUnavailable(_))));
        assert_eq!(fx.feed.calls(), 1);

        let after = stored(&fx.store).await;
        assert_eq!((after.usd, after.eur), (0.0, 0.0));
    }

    #[tokio::test]
    async fn test_extreme_rates_fail_without_writes() {
        let fx = setup_engine(PriceEngineConfig::default()).await;
        fx.rates.set_rate(RateSymbol::BtcUsd, 1e-20);
        fx.rates.set_rate(RateSymbol::BtcEur, 1e10);

        let result = fx
            .engine
            .convert(ConversionRequest::new(CatalogId::new(APP), Currency::Eur))
            .await;
        assert!(matches!(result, Err(GameRateError::UpstreamUnavailable(_))));

        let snapshot = fx.metrics.snapshot();
        assert_eq!(snapshot.conversions_failed, 1);
        assert_eq!(snapshot.locks_active, 0);

        let after = stored(&fx.store).await;
        assert_eq!((after.usd, after.eur), (0.0, 0.0));
    }

    #[tokio::test]
    async fn test_unreachable_rate_source() {
        let fx = setup_engine(PriceEngineConfig::default()).await;
        fx.rates.fail(RateSymbol::BtcGbp);

        let result = fx
            .engine
            .convert(ConversionRequest::new(CatalogId::new(APP), Currency::Gbp))
            .await;

        assert!(matches!(result, Err(GameRateError::UpstreamUnavailable(_))));
        assert_eq!(stored(&fx.store).await.gbp, 0.0);
        assert_eq!(fx.metrics.snapshot().upstream_failures, 1);
    }

    #[tokio::test]
    async fn test_conversion_is_idempotent() {
        let fx = setup_engine(PriceEngineConfig::default()).await;
        let request = ConversionRequest::new(CatalogId::new(APP), Currency::Rub);

        let first = fx.engine.convert(request).await.unwrap();
        let second = fx.engine.convert(request).await.unwrap();

        assert_eq!(first.rub, second.rub);
        assert_price(second.rub, 899.1);
        assert_eq!(fx.feed.calls(), 1);
    }

    #[tokio::test]
    async fn test_forced_refresh_pulls_base_price() {
        let fx = setup_engine(PriceEngineConfig::default()).await;
        let id = CatalogId::new(APP);

        fx.engine
            .convert(ConversionRequest::new(id, Currency::Usd))
            .await
            .unwrap();
        fx.feed.set_price(id, 1999);

        let item = fx
            .engine
            .convert(ConversionRequest::new(id, Currency::Usd).with_refresh())
            .await
            .unwrap();

        assert_price(item.usd, 19.99);
        assert_eq!(fx.feed.calls(), 2);
        assert_eq!(fx.metrics.snapshot().base_price_fetches, 2);
    }

    #[tokio::test]
    async fn test_always_refresh_base() {
        let fx = setup_engine(PriceEngineConfig {
            always_refresh_base: true,
            ..Default::default()
        })
        .await;
        let request = ConversionRequest::new(CatalogId::new(APP), Currency::Eur);

        fx.engine.convert(request).await.unwrap();
        fx.engine.convert(request).await.unwrap();

        assert_eq!(fx.feed.calls(), 2);
    }

    #[tokio::test]
    async fn test_feed_failures_propagate() {
        let fx = setup_engine(PriceEngineConfig::default()).await;
        fx.feed
            .fail_with(GameRateError::ParseError("unexpected body".into()));

        let result = fx
            .engine
            .convert(ConversionRequest::new(CatalogId::new(APP), Currency::Eur))
            .await;

        assert!(matches!(result, Err(GameRateError::ParseError(_))));
        assert_eq!(stored(&fx.store).await.usd, 0.0);
        assert_eq!(fx.metrics.snapshot().locks_active, 0);
    }

    #[tokio::test]
    async fn test_concurrent_targets_on_same_item() {
        let fx = setup_engine(PriceEngineConfig::default()).await;
        let id = CatalogId::new(APP);

        let eur = {
            let engine = fx.engine.clone();
            tokio::spawn(async move { engine.convert(ConversionRequest::new(id, Currency::Eur)).await })
        };
        let gbp = {
            let engine = fx.engine.clone();
            tokio::spawn(async move { engine.convert(ConversionRequest::new(id, Currency::Gbp)).await })
        };

        assert!(eur.await.unwrap().is_ok());
        assert!(gbp.await.unwrap().is_ok());

        let item = stored(&fx.store).await;
        assert_price(item.eur, 8.99);
        assert_price(item.gbp, 7.79);
        // The second request found the base price already on record.
        assert_eq!(fx.feed.calls(), 1);
    }

    #[tokio::test]
    async fn test_item_read() {
        let fx = setup_engine(PriceEngineConfig::default()).await;

        let item = fx.engine.item(CatalogId::new(APP)).await.unwrap();
        assert_eq!(item.name, "Team Fortress Classic");

        assert!(matches!(
            fx.engine.item(CatalogId::new(30)).await,
            Err(GameRateError::NotFound(_))
        ));
        assert_eq!(fx.metrics.snapshot().locks_active, 0);
    }
}

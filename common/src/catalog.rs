//! Catalog records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::identifiers::{CatalogId, StorageId};
use crate::monetary::{to_cents, Currency};

/// Persisted price field of a catalog record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PriceField(Currency);

impl PriceField {
    /// Field name in the persisted layout.
    pub fn name(&self) -> &'static str {
        self.0.code()
    }

    /// Currency the field is denominated in.
    pub fn currency(&self) -> Currency {
        self.0
    }
}

impl From<Currency> for PriceField {
    fn from(currency: Currency) -> Self {
        Self(currency)
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One priced catalog entity (a game).
///
/// Every price is stored in whole units of its own currency. The name and
/// both identifiers never change after ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Storage-assigned identifier.
    pub id: StorageId,
    /// Externally assigned catalog identifier.
    pub appid: CatalogId,
    /// Display name.
    pub name: String,
    #[serde(rename = "USD")]
    pub usd: f64,
    #[serde(rename = "EUR")]
    pub eur: f64,
    #[serde(rename = "GBP")]
    pub gbp: f64,
    #[serde(rename = "RUB")]
    pub rub: f64,
    #[serde(rename = "BTC")]
    pub btc: f64,
}

impl CatalogItem {
    /// Create an unpriced record.
    pub fn new(appid: CatalogId, name: impl Into<String>) -> Self {
        Self {
            id: StorageId::new(),
            appid,
            name: name.into(),
            usd: 0.0,
            eur: 0.0,
            gbp: 0.0,
            rub: 0.0,
            btc: 0.0,
        }
    }

    /// Price in the given currency.
    pub fn price(&self, currency: Currency) -> f64 {
        match currency {
            Currency::Usd => self.usd,
            Currency::Eur => self.eur,
            Currency::Gbp => self.gbp,
            Currency::Rub => self.rub,
            Currency::Btc => self.btc,
        }
    }

    /// Overwrite the price in the given currency.
    pub fn set_price(&mut self, currency: Currency, value: f64) {
        match currency {
            Currency::Usd => self.usd = value,
            Currency::Eur => self.eur = value,
            Currency::Gbp => self.gbp = value,
            Currency::Rub => self.rub = value,
            Currency::Btc => self.btc = value,
        }
    }

    /// Whether a base price has been recorded.
    pub fn has_base_price(&self) -> bool {
        self.usd.is_finite() && self.usd > 0.0
    }

    /// Base (USD) price in cents.
    pub fn base_cost_cents(&self) -> Option<Decimal> {
        to_cents(self.usd)
    }
}

/// Catalog record as delivered by the storefront's app list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub appid: CatalogId,
    pub name: String,
}

impl CatalogEntry {
    /// Create a catalog entry.
    pub fn new(appid: CatalogId, name: impl Into<String>) -> Self {
        Self {
            appid,
            name: name.into(),
        }
    }

    /// Turn into a fresh record with every price zeroed.
    pub fn into_item(self) -> CatalogItem {
        CatalogItem::new(self.appid, self.name)
    }
}

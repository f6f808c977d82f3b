//! Pivot conversion arithmetic and conversion records.
//!
//! All pivot arithmetic runs in cents. Fiat results are rounded to two
//! places only when they are stored; BTC keeps full precision.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gamerate_common::{round_price, CatalogId, Currency, GameRateError, RateSymbol, Result};

/// Request to price an item in a target currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionRequest {
    /// Item to price.
    pub catalog_id: CatalogId,
    /// Currency to price it in.
    pub target: Currency,
    /// Pull the base price from the feed even when one is on record.
    pub force_refresh: bool,
}

impl ConversionRequest {
    /// Create a new conversion request.
    pub fn new(catalog_id: CatalogId, target: Currency) -> Self {
        Self {
            catalog_id,
            target,
            force_refresh: false,
        }
    }

    /// Force a base price refresh.
    pub fn with_refresh(mut self) -> Self {
        self.force_refresh = true;
        self
    }
}

/// Pivot rates consulted for one conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotQuote {
    /// BTC/USD ask.
    pub btc_usd: Option<Decimal>,
    /// BTC/target ask, for fiat targets other than USD.
    pub btc_target: Option<Decimal>,
}

/// Symbols whose asks a conversion to `target` needs, in lookup order.
pub fn required_symbols(target: Currency) -> Vec<RateSymbol> {
    match target {
        Currency::Usd => Vec::new(),
        Currency::Btc => vec![RateSymbol::BtcUsd],
        fiat => {
            let mut symbols = vec![RateSymbol::BtcUsd];
            symbols.extend(fiat.rate_symbol());
            symbols
        }
    }
}

fn out_of_range(symbol: RateSymbol) -> GameRateError {
    GameRateError::UpstreamUnavailable(format!("{} rate out of range", symbol))
}

/// Amount of BTC the base price buys, in BTC cents.
pub fn btc_amount(base_cents: Decimal, btc_usd: Decimal) -> Result<Decimal> {
    base_cents
        .checked_div(btc_usd)
        .ok_or_else(|| out_of_range(RateSymbol::BtcUsd))
}

/// Base price as stored in the USD field.
pub fn usd_price(base_cents: Decimal) -> Decimal {
    round_price(base_cents / Decimal::ONE_HUNDRED)
}

/// Price in whole BTC, unrounded.
pub fn btc_price(base_cents: Decimal, btc_usd: Decimal) -> Result<Decimal> {
    Ok(btc_amount(base_cents, btc_usd)? / Decimal::ONE_HUNDRED)
}

/// Price in a fiat currency quoted against BTC, rounded to cents.
pub fn fiat_price(
    base_cents: Decimal,
    btc_usd: Decimal,
    symbol: RateSymbol,
    btc_target: Decimal,
) -> Result<Decimal> {
    let result_cents = btc_amount(base_cents, btc_usd)?
        .checked_mul(btc_target)
        .ok_or_else(|| out_of_range(symbol))?;
    Ok(round_price(result_cents / Decimal::ONE_HUNDRED))
}

/// Convert a base price into `target` using the quoted pivot rates.
///
/// Rates must already be validated as positive. A rate the target needs
/// but the quote lacks, or one so extreme the result overflows, is
/// reported as an unavailable upstream.
pub fn convert(base_cents: Decimal, target: Currency, quote: &PivotQuote) -> Result<Decimal> {
    let btc_usd = || {
        quote
            .btc_usd
            .ok_or_else(|| GameRateError::UpstreamUnavailable("BTCUSD rate unknown".to_string()))
    };

    match target {
        Currency::Usd => Ok(usd_price(base_cents)),
        Currency::Btc => btc_price(base_cents, btc_usd()?),
        Currency::Eur | Currency::Gbp | Currency::Rub => {
            let btc_usd = btc_usd()?;
            let symbol = target.rate_symbol().ok_or_else(|| {
                GameRateError::InvalidInput(format!("{} has no BTC quote", target))
            })?;
            let btc_target = quote.btc_target.ok_or_else(|| {
                GameRateError::UpstreamUnavailable(format!("{} rate unknown", symbol))
            })?;
            fiat_price(base_cents, btc_usd, symbol, btc_target)
        }
    }
}

/// A completed conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceConversion {
    /// Unique conversion ID.
    pub id: Uuid,
    /// Item priced.
    pub catalog_id: CatalogId,
    /// Target currency.
    pub target: Currency,
    /// Base price used, in cents.
    pub base_cents: Decimal,
    /// Rates used.
    pub quote: PivotQuote,
    /// Value persisted in the target field.
    pub value: Decimal,
    /// When the conversion was executed.
    pub executed_at: DateTime<Utc>,
}

impl PriceConversion {
    /// Create a new conversion record.
    pub fn new(
        catalog_id: CatalogId,
        target: Currency,
        base_cents: Decimal,
        quote: PivotQuote,
        value: Decimal,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            catalog_id,
            target,
            base_cents,
            quote,
            value,
            executed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn quote(btc_usd: Decimal, btc_target: Decimal) -> PivotQuote {
        PivotQuote {
            btc_usd: Some(btc_usd),
            btc_target: Some(btc_target),
        }
    }

    #[test]
    fn test_eur_scenario() {
        let base = dec!(999);
        assert_eq!(btc_amount(base, dec!(50000)).unwrap(), dec!(0.01998));

        let eur = convert(base, Currency::Eur, &quote(dec!(50000), dec!(45000))).unwrap();
        assert_eq!(eur, dec!(8.99));
    }

    #[test]
    fn test_usd_is_identity() {
        let usd = convert(dec!(999), Currency::Usd, &PivotQuote::default()).unwrap();
        assert_eq!(usd, dec!(9.99));
    }

    #[test]
    fn test_btc_keeps_precision() {
        let btc = convert(
            dec!(999),
            Currency::Btc,
            &PivotQuote {
                btc_usd: Some(dec!(50000)),
                btc_target: None,
            },
        )
        .unwrap();
        assert_eq!(btc, dec!(0.0001998));
    }

    #[test]
    fn test_rounds_half_away_from_zero() {
        // 3 / 2 * 1 = 1.5 cents -> 0.015 -> 0.02
        let eur = RateSymbol::BtcEur;
        assert_eq!(fiat_price(dec!(3), dec!(2), eur, dec!(1)).unwrap(), dec!(0.02));
        // 1 / 1 * 0.5 = 0.5 cents -> 0.01
        assert_eq!(fiat_price(dec!(1), dec!(1), eur, dec!(0.5)).unwrap(), dec!(0.01));
    }

    #[test]
    fn test_missing_rate_is_unavailable() {
        let partial = PivotQuote {
            btc_usd: Some(dec!(50000)),
            btc_target: None,
        };
        let err = convert(dec!(999), Currency::Gbp, &partial).unwrap_err();
        assert!(matches!(err, GameRateError::UpstreamUnavailable(_)));

        assert!(convert(dec!(999), Currency::Btc, &PivotQuote::default()).is_err());
    }

    #[test]
    fn test_extreme_rates_are_unavailable() {
        let extreme = quote(dec!(0.00000000000000000001), dec!(10000000000));
        let err = convert(dec!(999), Currency::Eur, &extreme).unwrap_err();
        assert!(matches!(err, GameRateError::UpstreamUnavailable(_)));

        assert!(btc_amount(Decimal::MAX, dec!(0.5)).is_err());
    }

    #[test]
    fn test_required_symbols() {
        assert!(required_symbols(Currency::Usd).is_empty());
        assert_eq!(required_symbols(Currency::Btc), vec![RateSymbol::BtcUsd]);
        assert_eq!(
            required_symbols(Currency::Rub),
            vec![RateSymbol::BtcUsd, RateSymbol::BtcRub]
        );
    }

    proptest! {
        #[test]
        fn btc_round_trip_within_one_cent(
            cents in 0i64..10_000_000,
            rate_cents in 100i64..10_000_000_000,
        ) {
            let base = Decimal::from(cents);
            let btc_usd = Decimal::new(rate_cents, 2);

            let btc = btc_price(base, btc_usd).unwrap();
            let back = round_price(btc * btc_usd);

            prop_assert!((back - usd_price(base)).abs() <= dec!(0.01));
        }
    }
}

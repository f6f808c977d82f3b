//! Monetary types for the price-conversion pipeline.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GameRateError;

/// Decimal places kept when a fiat price is stored.
pub const PRICE_DECIMAL_PLACES: u32 = 2;

/// Currencies a catalog item is priced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// US dollar, the base reference currency.
    Usd,
    Eur,
    Gbp,
    Rub,
    /// Bitcoin, the pivot currency.
    Btc,
}

impl Currency {
    /// Every supported currency.
    pub const ALL: [Currency; 5] = [
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Rub,
        Currency::Btc,
    ];

    /// ISO-style currency code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Rub => "RUB",
            Currency::Btc => "BTC",
        }
    }

    /// The tracked pair quoting this currency against BTC.
    ///
    /// BTC itself has no quote pair.
    pub fn rate_symbol(&self) -> Option<RateSymbol> {
        match self {
            Currency::Usd => Some(RateSymbol::BtcUsd),
            Currency::Eur => Some(RateSymbol::BtcEur),
            Currency::Gbp => Some(RateSymbol::BtcGbp),
            Currency::Rub => Some(RateSymbol::BtcRub),
            Currency::Btc => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = GameRateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            "RUB" => Ok(Currency::Rub),
            "BTC" => Ok(Currency::Btc),
            _ => Err(GameRateError::InvalidInput(format!(
                "unsupported currency: {:?}",
                s
            ))),
        }
    }
}

/// A tracked currency pair, quoted as the price of one BTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RateSymbol {
    #[serde(rename = "BTCUSD")]
    BtcUsd,
    #[serde(rename = "BTCEUR")]
    BtcEur,
    #[serde(rename = "BTCGBP")]
    BtcGbp,
    #[serde(rename = "BTCRUB")]
    BtcRub,
}

impl RateSymbol {
    /// The fixed set of tracked symbols.
    pub const ALL: [RateSymbol; 4] = [
        RateSymbol::BtcUsd,
        RateSymbol::BtcEur,
        RateSymbol::BtcGbp,
        RateSymbol::BtcRub,
    ];

    /// Symbol code as used by the rate feed and as cache key.
    pub fn as_str(&self) -> &'static str {
        match self {
            RateSymbol::BtcUsd => "BTCUSD",
            RateSymbol::BtcEur => "BTCEUR",
            RateSymbol::BtcGbp => "BTCGBP",
            RateSymbol::BtcRub => "BTCRUB",
        }
    }

    /// The quote currency of the pair.
    pub fn quote(&self) -> Currency {
        match self {
            RateSymbol::BtcUsd => Currency::Usd,
            RateSymbol::BtcEur => Currency::Eur,
            RateSymbol::BtcGbp => Currency::Gbp,
            RateSymbol::BtcRub => Currency::Rub,
        }
    }
}

impl fmt::Display for RateSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RateSymbol {
    type Err = GameRateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RateSymbol::ALL
            .into_iter()
            .find(|symbol| symbol.as_str() == s)
            .ok_or_else(|| GameRateError::InvalidInput(format!("unknown currency symbol: {}", s)))
    }
}

/// Round a currency amount to two places, midpoint away from zero.
pub fn round_price(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PRICE_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Turn a quoted rate into a usable divisor/multiplier.
///
/// Zero is the cache's "unknown" sentinel and is rejected along with
/// negative and non-finite values.
pub fn rate_from_f64(rate: f64) -> Option<Decimal> {
    if !rate.is_finite() || rate <= 0.0 {
        return None;
    }
    decimal_from_f64(rate).filter(|d| d.is_sign_positive() && !d.is_zero())
}

/// Exact decimal form of the shortest representation of a float.
///
/// `9.99_f64` becomes `9.99`, not the binary expansion of the float.
pub fn decimal_from_f64(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_str(&value.to_string()).ok()
}

/// Convert a whole-currency amount to cents.
pub fn to_cents(amount: f64) -> Option<Decimal> {
    decimal_from_f64(amount).map(|d| d * Decimal::ONE_HUNDRED)
}

/// Convert a decimal amount back to the persisted float form.
///
/// Goes through the decimal string so `8.99` lands on the float nearest
/// to 8.99.
pub fn to_f64(value: Decimal) -> f64 {
    value
        .to_string()
        .parse::<f64>()
        .ok()
        .or_else(|| value.to_f64())
        .unwrap_or(0.0)
}

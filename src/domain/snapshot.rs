//! Per-security daily facts supplied by the market/reference-data feed.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

/// Reported unit of a buyback authorization amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuybackUnit {
    /// Amount is in millions of the reporting currency.
    CurrencyMillions,
    /// Amount is in millions of shares.
    ShareCountMillions,
    /// Amount is a percentage of shares outstanding.
    Percent,
    /// Anything the feed reports that we cannot normalize.
    Other(String),
}

impl FromStr for BuybackUnit {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unit = match s.trim() {
            "$M" | "currency-millions" => BuybackUnit::CurrencyMillions,
            "Mshares" | "share-count-millions" => BuybackUnit::ShareCountMillions,
            "%" | "percent" => BuybackUnit::Percent,
            other => BuybackUnit::Other(other.to_string()),
        };
        Ok(unit)
    }
}

impl fmt::Display for BuybackUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuybackUnit::CurrencyMillions => write!(f, "$M"),
            BuybackUnit::ShareCountMillions => write!(f, "Mshares"),
            BuybackUnit::Percent => write!(f, "%"),
            BuybackUnit::Other(s) => write!(f, "{s}"),
        }
    }
}

/// Business-day distances to/from the corporate events that drive timing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventDistances {
    pub days_until_earnings: Option<i64>,
    pub days_since_earnings: Option<i64>,
    pub days_since_buyback: Option<i64>,
}

/// Everything known about one security on one trading day. Any fact may be
/// missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailySnapshot {
    pub date: NaiveDate,
    pub sid: String,
    pub symbol: String,
    pub tradable: bool,
    pub close: Option<f64>,
    pub volume: Option<f64>,
    pub market_cap: Option<f64>,
    pub sector: Option<i64>,
    pub security_type: Option<String>,
    pub exchange: Option<String>,
    pub company_name: Option<String>,
    pub is_primary_share: Option<bool>,
    pub is_depositary_receipt: Option<bool>,
    pub limited_partnership: Option<String>,
    pub buyback_unit: Option<BuybackUnit>,
    pub buyback_amount: Option<f64>,
    pub events: EventDistances,
}

impl DailySnapshot {
    pub fn new(date: NaiveDate, sid: &str, symbol: &str) -> Self {
        DailySnapshot {
            date,
            sid: sid.to_string(),
            symbol: symbol.to_string(),
            ..Default::default()
        }
    }

    /// close × volume when both are known.
    pub fn dollar_volume(&self) -> Option<f64> {
        Some(self.close? * self.volume?)
    }
}

//! Universe screening and the buyback-to-earnings timing signal.
//!
//! The universe is a conjunction of independent acceptance predicates, each
//! evaluated on one security's snapshot plus its factors. Adding a predicate
//! can only shrink the passing set. A security missing the fact a predicate
//! needs fails that predicate; nothing is defaulted.

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::LazyLock;

use super::factor::SecurityFactors;
use super::snapshot::{DailySnapshot, EventDistances};

pub const COMMON_STOCK: &str = "ST00000001";
pub const OTC_PREFIX: &str = "OTC";
pub const WHEN_ISSUED_SUFFIX: &str = ".WI";

static LP_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.* L[. ]?P.?$").expect("limited partnership pattern"));

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenConfig {
    pub min_dollar_volume: f64,
    pub min_adjusted_dollar_volume: f64,
    pub min_market_cap: f64,
    pub max_liquidity_rank: usize,
    pub common_stock_code: String,
    /// Upper bound on days-since-buyback + days-until-earnings.
    pub max_event_window: i64,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        ScreenConfig {
            min_dollar_volume: 750_000.0,
            min_adjusted_dollar_volume: 250_000.0,
            min_market_cap: 300_000_000.0,
            max_liquidity_rank: 2_000,
            common_stock_code: COMMON_STOCK.to_string(),
            max_event_window: 15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Predicate {
    Liquidity,
    HasSector,
    PrimaryShare,
    MarketCap,
    NotDepositaryReceipt,
    CommonStock,
    NotOtc,
    NotWhenIssued,
    NotPartnershipName,
    NotPartnershipFiling,
    AdjustedLiquidity,
    LiquidityRank,
}

impl Predicate {
    pub const ALL: [Predicate; 12] = [
        Predicate::Liquidity,
        Predicate::HasSector,
        Predicate::PrimaryShare,
        Predicate::MarketCap,
        Predicate::NotDepositaryReceipt,
        Predicate::CommonStock,
        Predicate::NotOtc,
        Predicate::NotWhenIssued,
        Predicate::NotPartnershipName,
        Predicate::NotPartnershipFiling,
        Predicate::AdjustedLiquidity,
        Predicate::LiquidityRank,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Predicate::Liquidity => "liquidity",
            Predicate::HasSector => "has_sector",
            Predicate::PrimaryShare => "primary_share",
            Predicate::MarketCap => "market_cap",
            Predicate::NotDepositaryReceipt => "not_depositary_receipt",
            Predicate::CommonStock => "common_stock",
            Predicate::NotOtc => "not_otc",
            Predicate::NotWhenIssued => "not_when_issued",
            Predicate::NotPartnershipName => "not_lp_name",
            Predicate::NotPartnershipFiling => "not_lp_filing",
            Predicate::AdjustedLiquidity => "adjusted_liquidity",
            Predicate::LiquidityRank => "liquidity_rank",
        }
    }

    pub fn accepts(
        &self,
        config: &ScreenConfig,
        snap: &DailySnapshot,
        factors: &SecurityFactors,
    ) -> bool {
        match self {
            Predicate::Liquidity => above(factors.average_dollar_volume, config.min_dollar_volume),
            Predicate::HasSector => snap.sector.is_some(),
            Predicate::PrimaryShare => snap.is_primary_share == Some(true),
            Predicate::MarketCap => above(snap.market_cap, config.min_market_cap),
            Predicate::NotDepositaryReceipt => snap.is_depositary_receipt != Some(true),
            Predicate::CommonStock => {
                snap.security_type.as_deref() == Some(config.common_stock_code.as_str())
            }
            Predicate::NotOtc => snap
                .exchange
                .as_deref()
                .is_some_and(|e| !e.starts_with(OTC_PREFIX)),
            Predicate::NotWhenIssued => !snap.symbol.ends_with(WHEN_ISSUED_SUFFIX),
            Predicate::NotPartnershipName => snap
                .company_name
                .as_deref()
                .is_some_and(|name| !LP_NAME.is_match(name)),
            Predicate::NotPartnershipFiling => snap.limited_partnership.is_none(),
            Predicate::AdjustedLiquidity => above(
                factors.adjusted_dollar_volume,
                config.min_adjusted_dollar_volume,
            ),
            Predicate::LiquidityRank => factors
                .liquidity_rank
                .is_some_and(|rank| rank <= config.max_liquidity_rank),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn above(value: Option<f64>, threshold: f64) -> bool {
    value.is_some_and(|v| v > threshold)
}

/// True while the buyback-to-earnings window is at most `max_window`
/// business days. Both distances must be known.
pub fn timing_signal(events: &EventDistances, max_window: i64) -> bool {
    match (events.days_since_buyback, events.days_until_earnings) {
        (Some(since), Some(until)) => since + until <= max_window,
        _ => false,
    }
}

/// Outcome of screening one trading day.
#[derive(Debug, Clone, Default)]
pub struct ScreenResult {
    pub universe: BTreeSet<String>,
    /// Universe members whose timing signal is on.
    pub longs: BTreeSet<String>,
    /// Securities failing each predicate (a security can fail several).
    pub rejections: BTreeMap<Predicate, usize>,
}

#[derive(Debug, Clone)]
pub struct UniverseScreener {
    config: ScreenConfig,
    predicates: BTreeSet<Predicate>,
}

impl UniverseScreener {
    pub fn new(config: ScreenConfig) -> Self {
        Self::with_predicates(config, Predicate::ALL)
    }

    pub fn with_predicates(
        config: ScreenConfig,
        predicates: impl IntoIterator<Item = Predicate>,
    ) -> Self {
        UniverseScreener {
            config,
            predicates: predicates.into_iter().collect(),
        }
    }

    pub fn in_universe(&self, snap: &DailySnapshot, factors: &SecurityFactors) -> bool {
        self.predicates
            .iter()
            .all(|p| p.accepts(&self.config, snap, factors))
    }

    pub fn screen(
        &self,
        snapshots: &[DailySnapshot],
        factors: &HashMap<String, SecurityFactors>,
    ) -> ScreenResult {
        let mut result = ScreenResult::default();

        for snap in snapshots {
            let Some(f) = factors.get(&snap.sid) else {
                tracing::debug!(sid = %snap.sid, "no factors computed, skipping");
                continue;
            };

            let mut passed = true;
            for p in &self.predicates {
                if !p.accepts(&self.config, snap, f) {
                    *result.rejections.entry(*p).or_insert(0) += 1;
                    passed = false;
                }
            }
            if !passed {
                continue;
            }

            result.universe.insert(snap.sid.clone());
            if timing_signal(&f.events, self.config.max_event_window) {
                result.longs.insert(snap.sid.clone());
            }
        }

        result
    }
}

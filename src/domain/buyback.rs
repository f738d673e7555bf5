//! Buyback magnitude normalization and materiality filtering.

use std::collections::BTreeSet;

use super::snapshot::{BuybackUnit, DailySnapshot};

pub const DEFAULT_MATERIALITY_THRESHOLD: f64 = 0.05;

/// Normalize a reported buyback amount to a fraction of shares outstanding.
///
/// | unit | formula |
/// |---|---|
/// | currency millions | amount × 1e6 / market_cap |
/// | share count millions | amount / (market_cap / price) |
/// | percent | amount / 100 |
///
/// Any other unit, a missing input, or a zero denominator yields `None`.
pub fn percent_of_shares_outstanding(snap: &DailySnapshot) -> Option<f64> {
    let amount = snap.buyback_amount?;
    let value = match snap.buyback_unit.as_ref()? {
        BuybackUnit::CurrencyMillions => {
            let market_cap = nonzero(snap.market_cap?)?;
            amount * 1_000_000.0 / market_cap
        }
        BuybackUnit::ShareCountMillions => {
            let market_cap = nonzero(snap.market_cap?)?;
            let price = nonzero(snap.close?)?;
            amount / nonzero(market_cap / price)?
        }
        BuybackUnit::Percent => amount / 100.0,
        BuybackUnit::Other(_) => return None,
    };
    value.is_finite().then_some(value)
}

fn nonzero(v: f64) -> Option<f64> {
    (v != 0.0 && v.is_finite()).then_some(v)
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuybackSignalConverter {
    threshold: f64,
}

impl BuybackSignalConverter {
    pub fn new(threshold: f64) -> Self {
        BuybackSignalConverter { threshold }
    }

    pub fn is_material(&self, snap: &DailySnapshot) -> bool {
        percent_of_shares_outstanding(snap).is_some_and(|pct| pct > self.threshold)
    }

    /// Narrow the screened longs to securities with a material buyback.
    pub fn candidates<'a>(
        &self,
        snapshots: impl IntoIterator<Item = &'a DailySnapshot>,
        longs: &BTreeSet<String>,
    ) -> BTreeSet<String> {
        snapshots
            .into_iter()
            .filter(|s| longs.contains(&s.sid))
            .filter(|s| {
                let material = self.is_material(s);
                if !material {
                    tracing::debug!(
                        sid = %s.sid,
                        unit = ?s.buyback_unit,
                        amount = ?s.buyback_amount,
                        "buyback not material, dropping"
                    );
                }
                material
            })
            .map(|s| s.sid.clone())
            .collect()
    }
}

impl Default for BuybackSignalConverter {
    fn default() -> Self {
        BuybackSignalConverter::new(DEFAULT_MATERIALITY_THRESHOLD)
    }
}

//! Daily exit/entry procedure over the holding-duration ledger.
//!
//! Each trading day runs two passes, exits first so the weight they release
//! is redistributed to the entry pool:
//!
//! 1. Every security with a non-zero weight that can trade today is aged by a
//!    day. Reaching the holding period forces a liquidation and drops the
//!    ledger record. A position with no record (an earlier liquidation not yet
//!    flat) gets the liquidation re-issued.
//! 2. The entry pool is today's tradable candidates plus tradable securities
//!    still in the ledger. Every pool member gets weight `1 / pool size`;
//!    newcomers get a fresh record at zero days.
//!
//! Non-tradable securities are left alone for the day: no order, no ageing.

use std::collections::BTreeSet;
use std::fmt;

use super::ledger::PositionLedger;
use super::portfolio::PortfolioWeights;

pub const DEFAULT_HOLDING_PERIOD: u32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionReason {
    Enter,
    Hold,
    Exit,
    RetryLiquidation,
}

impl fmt::Display for InstructionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InstructionReason::Enter => "enter",
            InstructionReason::Hold => "hold",
            InstructionReason::Exit => "exit",
            InstructionReason::RetryLiquidation => "retry_liquidation",
        };
        f.write_str(s)
    }
}

/// Target weight for one security. Zero means liquidate.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetWeight {
    pub sid: String,
    pub weight: f64,
    pub reason: InstructionReason,
}

impl TargetWeight {
    fn liquidate(sid: &str, reason: InstructionReason) -> Self {
        TargetWeight {
            sid: sid.to_string(),
            weight: 0.0,
            reason,
        }
    }

    pub fn is_liquidation(&self) -> bool {
        self.weight == 0.0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RebalancePlan {
    /// Liquidations first, then pool weights in sid order.
    pub instructions: Vec<TargetWeight>,
    pub pool_size: usize,
}

impl RebalancePlan {
    pub fn count(&self, reason: InstructionReason) -> usize {
        self.instructions
            .iter()
            .filter(|i| i.reason == reason)
            .count()
    }

    pub fn weight_of(&self, sid: &str) -> Option<f64> {
        self.instructions
            .iter()
            .find(|i| i.sid == sid)
            .map(|i| i.weight)
    }
}

/// Compute one day's plan against `ledger` without touching it. Returns the
/// ledger as it should stand after the day together with the instructions.
pub fn plan_day<F>(
    ledger: &PositionLedger,
    holding_period: u32,
    portfolio: &PortfolioWeights,
    tradable: F,
    candidates: &BTreeSet<String>,
) -> (PositionLedger, RebalancePlan)
where
    F: Fn(&str) -> bool,
{
    let mut next = ledger.clone();
    let mut instructions = Vec::new();
    let mut liquidated: BTreeSet<&str> = BTreeSet::new();

    for sid in portfolio.sids() {
        if !tradable(sid) {
            continue;
        }
        match next.increment(sid) {
            Some(days) if days >= holding_period => {
                next.close(sid);
                tracing::debug!(sid, days, "holding period reached, exiting");
                instructions.push(TargetWeight::liquidate(sid, InstructionReason::Exit));
                liquidated.insert(sid);
            }
            Some(_) => {}
            None => {
                tracing::warn!(
                    sid,
                    weight = portfolio.weight(sid),
                    "position without ledger record, re-issuing liquidation"
                );
                instructions.push(TargetWeight::liquidate(
                    sid,
                    InstructionReason::RetryLiquidation,
                ));
                liquidated.insert(sid);
            }
        }
    }

    let pool: BTreeSet<String> = candidates
        .iter()
        .map(String::as_str)
        .chain(next.sids())
        .filter(|sid| tradable(*sid) && !liquidated.contains(sid))
        .filter(|sid| next.days_held(sid).is_none_or(|days| days <= holding_period))
        .map(str::to_string)
        .collect();

    let pool_size = pool.len();
    if pool_size > 0 {
        let weight = 1.0 / pool_size as f64;
        for sid in &pool {
            let reason = if next.is_held(sid) {
                InstructionReason::Hold
            } else {
                next.open(sid);
                InstructionReason::Enter
            };
            instructions.push(TargetWeight {
                sid: sid.clone(),
                weight,
                reason,
            });
        }
    }

    (
        next,
        RebalancePlan {
            instructions,
            pool_size,
        },
    )
}

/// Owns the ledger and applies one plan per trading day.
#[derive(Debug, Clone)]
pub struct Rebalancer {
    holding_period: u32,
    ledger: PositionLedger,
}

impl Rebalancer {
    pub fn new(holding_period: u32) -> Self {
        Rebalancer {
            holding_period,
            ledger: PositionLedger::new(),
        }
    }

    pub fn holding_period(&self) -> u32 {
        self.holding_period
    }

    pub fn ledger(&self) -> &PositionLedger {
        &self.ledger
    }

    /// Run the day's exit and entry passes. The ledger is replaced only once
    /// the full plan has been built.
    pub fn rebalance<F>(
        &mut self,
        portfolio: &PortfolioWeights,
        tradable: F,
        candidates: &BTreeSet<String>,
    ) -> RebalancePlan
    where
        F: Fn(&str) -> bool,
    {
        let (next, plan) = plan_day(
            &self.ledger,
            self.holding_period,
            portfolio,
            tradable,
            candidates,
        );
        self.ledger = next;
        plan
    }
}

impl Default for Rebalancer {
    fn default() -> Self {
        Rebalancer::new(DEFAULT_HOLDING_PERIOD)
    }
}

//! Daily scheduler loop for file-driven runs.
//!
//! Stands in for the external scheduler: one `setup`, then one
//! `on_trading_day` per trading day in `[start_date, end_date]`. Trading days
//! before `start_date` that the data feed knows about are fed to the factor
//! window as warm-up.

use chrono::NaiveDate;

use super::error::StrategyError;
use super::rebalance::InstructionReason;
use super::strategy::{BuybackStrategy, DayReport, Selection, StrategyConfig};
use crate::ports::execution_port::ExecutionPort;
use crate::ports::market_data_port::MarketDataPort;
use crate::ports::telemetry_port::TelemetryPort;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Default)]
pub struct SimulationSummary {
    pub warmup_days: usize,
    pub trading_days: usize,
    pub entries: usize,
    pub exits: usize,
    pub retried_liquidations: usize,
    pub max_positions: usize,
    pub final_positions: usize,
}

impl SimulationSummary {
    fn absorb(&mut self, report: &DayReport) {
        self.trading_days += 1;
        self.entries += report.plan.count(InstructionReason::Enter);
        self.exits += report.plan.count(InstructionReason::Exit);
        self.retried_liquidations += report.plan.count(InstructionReason::RetryLiquidation);
        self.max_positions = self.max_positions.max(report.telemetry.positions);
        self.final_positions = report.telemetry.positions;
    }
}

fn prepare(
    data: &dyn MarketDataPort,
    strategy_config: StrategyConfig,
) -> Result<BuybackStrategy, StrategyError> {
    Ok(BuybackStrategy::setup(strategy_config).with_calendar(data.event_calendar()?))
}

/// Feed up to one liquidity window of trading days strictly before `before`.
fn warm_up(
    strategy: &mut BuybackStrategy,
    data: &dyn MarketDataPort,
    before: NaiveDate,
) -> Result<usize, StrategyError> {
    let Some(last) = before.pred_opt() else {
        return Ok(0);
    };
    let days = data.trading_days(NaiveDate::MIN, last)?;
    let from = days.len().saturating_sub(strategy.config().liquidity_window);
    for &date in &days[from..] {
        let snapshots = data.snapshots(date)?;
        strategy.warm_up(date, &snapshots);
    }
    let count = days.len() - from;
    if count > 0 {
        tracing::info!(days = count, "factor window warmed up");
    }
    Ok(count)
}

pub fn run_simulation(
    data: &dyn MarketDataPort,
    execution: &mut dyn ExecutionPort,
    telemetry: &mut dyn TelemetryPort,
    strategy_config: StrategyConfig,
    sim: &SimulationConfig,
) -> Result<(BuybackStrategy, SimulationSummary), StrategyError> {
    let live = data.trading_days(sim.start_date, sim.end_date)?;
    if live.is_empty() {
        return Err(StrategyError::NoData {
            start: sim.start_date,
            end: sim.end_date,
        });
    }

    let mut strategy = prepare(data, strategy_config)?;
    let mut summary = SimulationSummary {
        warmup_days: warm_up(&mut strategy, data, sim.start_date)?,
        ..Default::default()
    };

    for date in live {
        let snapshots = data.snapshots(date)?;
        let report = strategy.on_trading_day(date, &snapshots, execution)?;
        telemetry.record(date, &report.telemetry)?;
        summary.absorb(&report);
    }

    Ok((strategy, summary))
}

/// Screening diagnostics for a single date, with the factor window warmed up
/// from the preceding days. No ledger is touched and no orders are placed.
pub fn screen_date(
    data: &dyn MarketDataPort,
    strategy_config: StrategyConfig,
    date: NaiveDate,
) -> Result<Selection, StrategyError> {
    if data.trading_days(date, date)?.is_empty() {
        return Err(StrategyError::NoData {
            start: date,
            end: date,
        });
    }
    let mut strategy = prepare(data, strategy_config)?;
    warm_up(&mut strategy, data, date)?;
    let snapshots = data.snapshots(date)?;
    Ok(strategy.select(date, &snapshots))
}

//! Daily orchestration: factors → screen → buyback conversion → rebalance.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::buyback::{BuybackSignalConverter, DEFAULT_MATERIALITY_THRESHOLD};
use super::calendar::EventCalendar;
use super::error::StrategyError;
use super::factor::{DEFAULT_EVENT_LOOKBACK, DEFAULT_LIQUIDITY_WINDOW, FactorEngine};
use super::ledger::PositionLedger;
use super::portfolio::Telemetry;
use super::rebalance::{DEFAULT_HOLDING_PERIOD, RebalancePlan, Rebalancer};
use super::screener::{Predicate, ScreenConfig, UniverseScreener};
use super::snapshot::DailySnapshot;
use crate::ports::execution_port::ExecutionPort;

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub name: String,
    pub holding_period: u32,
    pub liquidity_window: usize,
    pub event_lookback: i64,
    pub materiality_threshold: f64,
    pub screen: ScreenConfig,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig {
            name: "Buyback Drift".to_string(),
            holding_period: DEFAULT_HOLDING_PERIOD,
            liquidity_window: DEFAULT_LIQUIDITY_WINDOW,
            event_lookback: DEFAULT_EVENT_LOOKBACK,
            materiality_threshold: DEFAULT_MATERIALITY_THRESHOLD,
            screen: ScreenConfig::default(),
        }
    }
}

/// What the screening half of a day produced.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub screened: usize,
    pub universe: BTreeSet<String>,
    pub longs: BTreeSet<String>,
    pub candidates: BTreeSet<String>,
    pub rejections: BTreeMap<Predicate, usize>,
}

#[derive(Debug, Clone)]
pub struct DayReport {
    pub date: NaiveDate,
    pub selection: Selection,
    pub plan: RebalancePlan,
    pub telemetry: Telemetry,
}

#[derive(Debug)]
pub struct BuybackStrategy {
    config: StrategyConfig,
    factors: FactorEngine,
    screener: UniverseScreener,
    converter: BuybackSignalConverter,
    rebalancer: Rebalancer,
}

impl BuybackStrategy {
    /// Start-of-life setup: empty ledger, configured holding period.
    pub fn setup(config: StrategyConfig) -> Self {
        tracing::info!(
            name = %config.name,
            holding_period = config.holding_period,
            liquidity_window = config.liquidity_window,
            "strategy initialized"
        );
        BuybackStrategy {
            factors: FactorEngine::new(config.liquidity_window, config.event_lookback),
            screener: UniverseScreener::new(config.screen.clone()),
            converter: BuybackSignalConverter::new(config.materiality_threshold),
            rebalancer: Rebalancer::new(config.holding_period),
            config,
        }
    }

    pub fn with_calendar(mut self, calendar: EventCalendar) -> Self {
        self.factors = self.factors.with_calendar(calendar);
        self
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn ledger(&self) -> &PositionLedger {
        self.rebalancer.ledger()
    }

    /// Feed a pre-start day into the factor window without trading.
    pub fn warm_up(&mut self, date: NaiveDate, snapshots: &[DailySnapshot]) {
        self.factors.observe(date, snapshots);
    }

    /// Observe the day and run factors, screen and buyback conversion. Does not
    /// touch the ledger.
    pub fn select(&mut self, date: NaiveDate, snapshots: &[DailySnapshot]) -> Selection {
        self.factors.observe(date, snapshots);
        let factors = self.factors.compute(snapshots);
        let screen = self.screener.screen(snapshots, &factors);
        let candidates = self.converter.candidates(snapshots, &screen.longs);

        for (predicate, count) in &screen.rejections {
            tracing::debug!(%date, %predicate, count, "rejected by predicate");
        }

        Selection {
            screened: snapshots.len(),
            universe: screen.universe,
            longs: screen.longs,
            candidates,
            rejections: screen.rejections,
        }
    }

    /// One full daily tick. Instructions go to `execution` in plan order.
    pub fn on_trading_day(
        &mut self,
        date: NaiveDate,
        snapshots: &[DailySnapshot],
        execution: &mut dyn ExecutionPort,
    ) -> Result<DayReport, StrategyError> {
        let selection = self.select(date, snapshots);

        let tradable: HashSet<&str> = snapshots
            .iter()
            .filter(|s| s.tradable)
            .map(|s| s.sid.as_str())
            .collect();
        let portfolio = execution.current_weights();
        let plan = self.rebalancer.rebalance(
            &portfolio,
            |sid: &str| tradable.contains(sid),
            &selection.candidates,
        );

        for target in &plan.instructions {
            tracing::debug!(
                %date,
                sid = %target.sid,
                weight = target.weight,
                reason = %target.reason,
                "order target weight"
            );
            execution.order_target_weight(date, target)?;
        }

        let after = execution.current_weights();
        let telemetry = Telemetry {
            leverage: after.leverage(),
            positions: after.position_count(),
            ledger_size: self.ledger().len(),
            candidates: selection.candidates.len(),
        };

        tracing::info!(
            %date,
            screened = selection.screened,
            universe = selection.universe.len(),
            longs = selection.longs.len(),
            candidates = selection.candidates.len(),
            pool = plan.pool_size,
            instructions = plan.instructions.len(),
            leverage = telemetry.leverage,
            positions = telemetry.positions,
            "rebalanced"
        );

        Ok(DayReport {
            date,
            selection,
            plan,
            telemetry,
        })
    }
}

#![allow(dead_code)]

use buyback_drift::domain::calendar::EventCalendar;
use buyback_drift::domain::error::StrategyError;
use buyback_drift::domain::portfolio::{PortfolioWeights, Telemetry};
use buyback_drift::domain::rebalance::TargetWeight;
use buyback_drift::domain::screener::COMMON_STOCK;
pub use buyback_drift::domain::snapshot::{BuybackUnit, DailySnapshot, EventDistances};
use buyback_drift::ports::execution_port::ExecutionPort;
use buyback_drift::ports::market_data_port::MarketDataPort;
use buyback_drift::ports::telemetry_port::TelemetryPort;
use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::{BTreeMap, HashSet};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// `n` consecutive weekdays starting at `start` (inclusive if a weekday).
pub fn weekdays(start: NaiveDate, n: usize) -> Vec<NaiveDate> {
    start
        .iter_days()
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .take(n)
        .collect()
}

/// A snapshot that passes every universe predicate on its own.
pub fn eligible(sid: &str, date: NaiveDate) -> DailySnapshot {
    DailySnapshot {
        tradable: true,
        close: Some(50.0),
        volume: Some(2_000_000.0),
        market_cap: Some(5_000_000_000.0),
        sector: Some(311),
        security_type: Some(COMMON_STOCK.to_string()),
        exchange: Some("NYS".to_string()),
        company_name: Some(format!("{sid} Corp")),
        is_primary_share: Some(true),
        is_depositary_receipt: Some(false),
        ..DailySnapshot::new(date, sid, sid)
    }
}

/// An eligible snapshot with a material buyback inside the timing window.
pub fn candidate(sid: &str, date: NaiveDate) -> DailySnapshot {
    DailySnapshot {
        buyback_unit: Some(BuybackUnit::Percent),
        buyback_amount: Some(8.0),
        events: EventDistances {
            days_since_buyback: Some(2),
            days_until_earnings: Some(5),
            days_since_earnings: Some(55),
        },
        ..eligible(sid, date)
    }
}

pub fn halted(mut snap: DailySnapshot) -> DailySnapshot {
    snap.tradable = false;
    snap
}

#[derive(Default)]
pub struct MockMarketData {
    pub days: BTreeMap<NaiveDate, Vec<DailySnapshot>>,
    pub calendar: EventCalendar,
    pub errors: HashSet<NaiveDate>,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_day(mut self, date: NaiveDate, snapshots: Vec<DailySnapshot>) -> Self {
        self.days.insert(date, snapshots);
        self
    }

    /// Same securities every day, built by `make`.
    pub fn with_days<F>(mut self, dates: &[NaiveDate], make: F) -> Self
    where
        F: Fn(NaiveDate) -> Vec<DailySnapshot>,
    {
        for &d in dates {
            self.days.insert(d, make(d));
        }
        self
    }

    pub fn with_calendar(mut self, calendar: EventCalendar) -> Self {
        self.calendar = calendar;
        self
    }

    pub fn with_error(mut self, date: NaiveDate) -> Self {
        self.errors.insert(date);
        self
    }
}

impl MarketDataPort for MockMarketData {
    fn trading_days(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>, StrategyError> {
        if start > end {
            return Ok(Vec::new());
        }
        Ok(self.days.range(start..=end).map(|(d, _)| *d).collect())
    }

    fn snapshots(&self, date: NaiveDate) -> Result<Vec<DailySnapshot>, StrategyError> {
        if self.errors.contains(&date) {
            return Err(StrategyError::data("mock", format!("feed down on {date}")));
        }
        Ok(self.days.get(&date).cloned().unwrap_or_default())
    }

    fn event_calendar(&self) -> Result<EventCalendar, StrategyError> {
        Ok(self.calendar.clone())
    }
}

/// Execution double that records every order it receives.
#[derive(Default)]
pub struct RecordingBroker {
    pub weights: PortfolioWeights,
    pub orders: Vec<(NaiveDate, TargetWeight)>,
}

impl RecordingBroker {
    pub fn holding(weights: &[(&str, f64)]) -> Self {
        Self {
            weights: weights
                .iter()
                .map(|(sid, w)| (sid.to_string(), *w))
                .collect(),
            orders: Vec::new(),
        }
    }

    pub fn orders_on(&self, date: NaiveDate) -> Vec<&TargetWeight> {
        self.orders
            .iter()
            .filter(|(d, _)| *d == date)
            .map(|(_, t)| t)
            .collect()
    }
}

impl ExecutionPort for RecordingBroker {
    fn current_weights(&self) -> PortfolioWeights {
        self.weights.clone()
    }

    fn order_target_weight(
        &mut self,
        date: NaiveDate,
        target: &TargetWeight,
    ) -> Result<(), StrategyError> {
        self.weights.set(&target.sid, target.weight);
        self.orders.push((date, target.clone()));
        Ok(())
    }
}

#[derive(Default)]
pub struct TelemetryLog(pub Vec<(NaiveDate, Telemetry)>);

impl TelemetryPort for TelemetryLog {
    fn record(&mut self, date: NaiveDate, telemetry: &Telemetry) -> Result<(), StrategyError> {
        self.0.push((date, *telemetry));
        Ok(())
    }
}

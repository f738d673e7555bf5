//! CSV file market-data adapter.
//!
//! `snapshots.csv` carries one row per security per trading day; empty cells
//! are missing facts. An optional `events.csv` (`sid,kind,date`) feeds the
//! event calendar for snapshots that do not carry their own distances.

use crate::domain::calendar::{EventCalendar, EventKind};
use crate::domain::error::StrategyError;
use crate::domain::snapshot::{BuybackUnit, DailySnapshot, EventDistances};
use crate::ports::market_data_port::MarketDataPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct SnapshotRow {
    date: NaiveDate,
    sid: String,
    symbol: String,
    tradable: Option<bool>,
    close: Option<f64>,
    volume: Option<f64>,
    market_cap: Option<f64>,
    sector: Option<i64>,
    security_type: Option<String>,
    exchange: Option<String>,
    company_name: Option<String>,
    is_primary_share: Option<bool>,
    is_depositary_receipt: Option<bool>,
    limited_partnership: Option<String>,
    buyback_unit: Option<String>,
    buyback_amount: Option<f64>,
    days_until_earnings: Option<i64>,
    days_since_earnings: Option<i64>,
    days_since_buyback: Option<i64>,
}

impl From<SnapshotRow> for DailySnapshot {
    fn from(row: SnapshotRow) -> Self {
        DailySnapshot {
            date: row.date,
            sid: row.sid,
            symbol: row.symbol,
            tradable: row.tradable.unwrap_or(false),
            close: row.close,
            volume: row.volume,
            market_cap: row.market_cap,
            sector: row.sector,
            security_type: row.security_type,
            exchange: row.exchange,
            company_name: row.company_name,
            is_primary_share: row.is_primary_share,
            is_depositary_receipt: row.is_depositary_receipt,
            limited_partnership: row.limited_partnership,
            buyback_unit: row
                .buyback_unit
                .and_then(|u| u.parse::<BuybackUnit>().ok()),
            buyback_amount: row.buyback_amount,
            events: EventDistances {
                days_until_earnings: row.days_until_earnings,
                days_since_earnings: row.days_since_earnings,
                days_since_buyback: row.days_since_buyback,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct EventRow {
    sid: String,
    kind: String,
    date: NaiveDate,
}

/// Whole-file market data held in memory, keyed by trading day.
pub struct CsvMarketData {
    days: BTreeMap<NaiveDate, Vec<DailySnapshot>>,
    calendar: EventCalendar,
}

impl CsvMarketData {
    pub fn load(snapshots: &Path, events: Option<&Path>) -> Result<Self, StrategyError> {
        let days = Self::load_snapshots(snapshots)?;
        let calendar = match events {
            Some(path) => Self::load_events(path)?,
            None => EventCalendar::new(),
        };
        tracing::info!(
            path = %snapshots.display(),
            days = days.len(),
            "loaded snapshots"
        );
        Ok(Self { days, calendar })
    }

    fn read(path: &Path) -> Result<String, StrategyError> {
        fs::read_to_string(path).map_err(|e| {
            StrategyError::data(path.display().to_string(), format!("failed to read: {e}"))
        })
    }

    fn load_snapshots(path: &Path) -> Result<BTreeMap<NaiveDate, Vec<DailySnapshot>>, StrategyError> {
        let source = path.display().to_string();
        let content = Self::read(path)?;
        let mut rdr = csv::Reader::from_reader(content.as_bytes());

        let mut days: BTreeMap<NaiveDate, Vec<DailySnapshot>> = BTreeMap::new();
        let mut seen: HashSet<(NaiveDate, String)> = HashSet::new();

        for (line, result) in rdr.deserialize::<SnapshotRow>().enumerate() {
            let row = result
                .map_err(|e| StrategyError::data(&source, format!("CSV parse error: {e}")))?;
            if !seen.insert((row.date, row.sid.clone())) {
                return Err(StrategyError::data(
                    &source,
                    format!(
                        "duplicate row for {} on {} (record {})",
                        row.sid,
                        row.date,
                        line + 1
                    ),
                ));
            }
            let snapshot = DailySnapshot::from(row);
            days.entry(snapshot.date).or_default().push(snapshot);
        }

        for snaps in days.values_mut() {
            snaps.sort_by(|a, b| a.sid.cmp(&b.sid));
        }
        Ok(days)
    }

    fn load_events(path: &Path) -> Result<EventCalendar, StrategyError> {
        let source = path.display().to_string();
        let content = Self::read(path)?;
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut calendar = EventCalendar::new();

        for result in rdr.deserialize::<EventRow>() {
            let row = result
                .map_err(|e| StrategyError::data(&source, format!("CSV parse error: {e}")))?;
            let kind: EventKind = row
                .kind
                .parse()
                .map_err(|reason: String| StrategyError::data(&source, reason))?;
            calendar.add(&row.sid, kind, row.date);
        }
        Ok(calendar)
    }
}

impl MarketDataPort for CsvMarketData {
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
        Ok(self.days.get(&date).cloned().unwrap_or_default())
    }

    fn event_calendar(&self) -> Result<EventCalendar, StrategyError> {
        Ok(self.calendar.clone())
    }
}

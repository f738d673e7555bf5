//! Market and reference data port trait.

use crate::domain::calendar::EventCalendar;
use crate::domain::error::StrategyError;
use crate::domain::snapshot::DailySnapshot;
use chrono::NaiveDate;

pub trait MarketDataPort {
    /// Trading days with data in `[start, end]`, ascending.
    fn trading_days(&self, start: NaiveDate, end: NaiveDate)
    -> Result<Vec<NaiveDate>, StrategyError>;

    /// One snapshot per security known on `date`.
    fn snapshots(&self, date: NaiveDate) -> Result<Vec<DailySnapshot>, StrategyError>;

    /// Dated corporate events, used when snapshots do not carry distances.
    fn event_calendar(&self) -> Result<EventCalendar, StrategyError> {
        Ok(EventCalendar::new())
    }
}

//! Per-security daily factors: rolling dollar volume and event distances.
//!
//! The engine keeps a rolling window of observed trading days. Two liquidity
//! statistics are derived from it:
//!
//! - average dollar volume: mean of close × volume over the days where both
//!   facts are known (missing days are skipped);
//! - adjusted average dollar volume: the sum over the full configured window
//!   divided by its length. A day with no close contributes zero, and so does
//!   every slot not yet filled by an observed day. Securities without full
//!   history (recent listings) score low and fall out of any threshold or
//!   rank cut.

use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};

use super::calendar::EventCalendar;
use super::snapshot::{DailySnapshot, EventDistances};

pub const DEFAULT_LIQUIDITY_WINDOW: usize = 252;
pub const DEFAULT_EVENT_LOOKBACK: i64 = 252;

#[derive(Debug, Clone)]
struct DayColumn {
    date: NaiveDate,
    dollar_volume: HashMap<String, f64>,
}

/// Factor values for one security on one day.
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityFactors {
    pub average_dollar_volume: Option<f64>,
    pub adjusted_dollar_volume: Option<f64>,
    /// 1-based rank of `adjusted_dollar_volume`, largest first.
    pub liquidity_rank: Option<usize>,
    pub events: EventDistances,
}

#[derive(Debug, Clone)]
pub struct FactorEngine {
    window: usize,
    event_lookback: i64,
    days: VecDeque<DayColumn>,
    calendar: EventCalendar,
}

impl FactorEngine {
    pub fn new(window: usize, event_lookback: i64) -> Self {
        FactorEngine {
            window: window.max(1),
            event_lookback,
            days: VecDeque::with_capacity(window.max(1)),
            calendar: EventCalendar::new(),
        }
    }

    pub fn with_calendar(mut self, calendar: EventCalendar) -> Self {
        self.calendar = calendar;
        self
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn days_observed(&self) -> usize {
        self.days.len()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.days.back().map(|d| d.date)
    }

    /// Push one trading day into the rolling window. Re-observing the most
    /// recent date replaces it instead of appending a duplicate.
    pub fn observe(&mut self, date: NaiveDate, snapshots: &[DailySnapshot]) {
        let dollar_volume = snapshots
            .iter()
            .filter_map(|s| s.dollar_volume().map(|dv| (s.sid.clone(), dv)))
            .collect();
        let column = DayColumn {
            date,
            dollar_volume,
        };

        if self.last_date() == Some(date) {
            self.days.pop_back();
        }
        self.days.push_back(column);
        while self.days.len() > self.window {
            self.days.pop_front();
        }
    }

    pub fn average_dollar_volume(&self, sid: &str) -> Option<f64> {
        let (sum, count) = self
            .days
            .iter()
            .filter_map(|d| d.dollar_volume.get(sid))
            .fold((0.0, 0usize), |(sum, n), dv| (sum + dv, n + 1));
        (count > 0).then(|| sum / count as f64)
    }

    pub fn adjusted_dollar_volume(&self, sid: &str) -> Option<f64> {
        if self.days.is_empty() {
            return None;
        }
        let sum: f64 = self
            .days
            .iter()
            .map(|d| d.dollar_volume.get(sid).copied().unwrap_or(0.0))
            .sum();
        Some(sum / self.window as f64)
    }

    /// Merged field by field: a distance carried on the snapshot wins, a
    /// missing one is filled from the calendar.
    pub fn event_distances(&self, snapshot: &DailySnapshot) -> EventDistances {
        let own = snapshot.events;
        if self.calendar.is_empty() {
            return own;
        }
        let derived = self
            .calendar
            .distances(&snapshot.sid, snapshot.date, self.event_lookback);
        EventDistances {
            days_since_buyback: own.days_since_buyback.or(derived.days_since_buyback),
            days_until_earnings: own.days_until_earnings.or(derived.days_until_earnings),
            days_since_earnings: own.days_since_earnings.or(derived.days_since_earnings),
        }
    }

    /// Compute factors for every snapshot of the current day. The window must
    /// already include that day (see [`FactorEngine::observe`]).
    pub fn compute(&self, snapshots: &[DailySnapshot]) -> HashMap<String, SecurityFactors> {
        let mut factors: HashMap<String, SecurityFactors> = snapshots
            .iter()
            .map(|s| {
                (
                    s.sid.clone(),
                    SecurityFactors {
                        average_dollar_volume: self.average_dollar_volume(&s.sid),
                        adjusted_dollar_volume: self.adjusted_dollar_volume(&s.sid),
                        liquidity_rank: None,
                        events: self.event_distances(s),
                    },
                )
            })
            .collect();

        for (rank, sid) in rank_descending(&factors).into_iter().enumerate() {
            if let Some(f) = factors.get_mut(&sid) {
                f.liquidity_rank = Some(rank + 1);
            }
        }
        factors
    }
}

impl Default for FactorEngine {
    fn default() -> Self {
        FactorEngine::new(DEFAULT_LIQUIDITY_WINDOW, DEFAULT_EVENT_LOOKBACK)
    }
}

/// Sids with a defined adjusted dollar volume, largest first. Ties keep sid
/// order so ranks are deterministic.
fn rank_descending(factors: &HashMap<String, SecurityFactors>) -> Vec<String> {
    let mut ranked: Vec<(&String, f64)> = factors
        .iter()
        .filter_map(|(sid, f)| f.adjusted_dollar_volume.map(|v| (sid, v)))
        .collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    ranked.into_iter().map(|(sid, _)| sid.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::calendar::EventKind;
    use approx::assert_relative_eq;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn snap(day: u32, sid: &str, close: Option<f64>, volume: f64) -> DailySnapshot {
        snap_on(date(day), sid, close, volume)
    }

    fn snap_on(day: NaiveDate, sid: &str, close: Option<f64>, volume: f64) -> DailySnapshot {
        DailySnapshot {
            close,
            volume: Some(volume),
            ..DailySnapshot::new(day, sid, sid)
        }
    }

    fn weekdays(n: usize) -> Vec<NaiveDate> {
        date(4)
            .iter_days()
            .filter(|d| crate::domain::calendar::is_business_day(*d))
            .take(n)
            .collect()
    }

    #[test]
    fn adjusted_volume_zero_fills_missing_close() {
        let mut engine = FactorEngine::new(4, 252);
        engine.observe(date(4), &[snap(4, "A", None, 100.0)]);
        engine.observe(date(5), &[snap(5, "A", None, 100.0)]);
        engine.observe(date(6), &[snap(6, "A", Some(10.0), 100.0)]);
        engine.observe(date(7), &[snap(7, "A", Some(10.0), 100.0)]);

        assert_relative_eq!(engine.adjusted_dollar_volume("A").unwrap(), 500.0);
        assert_relative_eq!(engine.average_dollar_volume("A").unwrap(), 1000.0);
    }

    #[test]
    fn absent_days_count_against_recent_listing() {
        let mut engine = FactorEngine::new(4, 252);
        engine.observe(date(4), &[snap(4, "OLD", Some(10.0), 100.0)]);
        engine.observe(date(5), &[snap(5, "OLD", Some(10.0), 100.0)]);
        engine.observe(date(6), &[snap(6, "OLD", Some(10.0), 100.0)]);
        engine.observe(
            date(7),
            &[snap(7, "OLD", Some(10.0), 100.0), snap(7, "NEW", Some(10.0), 100.0)],
        );

        assert_relative_eq!(engine.adjusted_dollar_volume("OLD").unwrap(), 1000.0);
        assert_relative_eq!(engine.adjusted_dollar_volume("NEW").unwrap(), 250.0);
        assert_relative_eq!(engine.average_dollar_volume("NEW").unwrap(), 1000.0);
    }

    #[test]
    fn unfilled_window_slots_count_as_zero() {
        let mut engine = FactorEngine::new(252, 252);
        for day in weekdays(20) {
            engine.observe(day, &[snap_on(day, "NEW", Some(10.0), 100_000.0)]);
        }

        assert_eq!(engine.days_observed(), 20);
        let adjusted = engine.adjusted_dollar_volume("NEW").unwrap();
        assert_relative_eq!(adjusted, 20.0 * 1_000_000.0 / 252.0, epsilon = 1e-6);
        assert!(adjusted < 250_000.0);
        assert_relative_eq!(engine.average_dollar_volume("NEW").unwrap(), 1_000_000.0);
    }

    #[test]
    fn window_rolls_forward() {
        let mut engine = FactorEngine::new(2, 252);
        engine.observe(date(4), &[snap(4, "A", Some(1.0), 100.0)]);
        engine.observe(date(5), &[snap(5, "A", Some(2.0), 100.0)]);
        engine.observe(date(6), &[snap(6, "A", Some(3.0), 100.0)]);

        assert_eq!(engine.days_observed(), 2);
        assert_relative_eq!(engine.adjusted_dollar_volume("A").unwrap(), 250.0);
    }

    #[test]
    fn reobserving_same_date_replaces_it() {
        let mut engine = FactorEngine::new(5, 252);
        engine.observe(date(4), &[snap(4, "A", Some(1.0), 100.0)]);
        engine.observe(date(4), &[snap(4, "A", Some(3.0), 100.0)]);
        assert_eq!(engine.days_observed(), 1);
        assert_relative_eq!(engine.adjusted_dollar_volume("A").unwrap(), 60.0);
    }

    #[test]
    fn empty_engine_has_no_statistics() {
        let engine = FactorEngine::default();
        assert_eq!(engine.window(), DEFAULT_LIQUIDITY_WINDOW);
        assert_eq!(engine.adjusted_dollar_volume("A"), None);
        assert_eq!(engine.average_dollar_volume("A"), None);
    }

    #[test]
    fn average_skips_undefined_days_entirely() {
        let mut engine = FactorEngine::new(3, 252);
        engine.observe(date(4), &[snap(4, "A", None, 100.0)]);
        assert_eq!(engine.average_dollar_volume("A"), None);
        assert_relative_eq!(engine.adjusted_dollar_volume("A").unwrap(), 0.0);
    }

    #[test]
    fn compute_ranks_largest_first() {
        let day = [
            snap(4, "A", Some(1.0), 100.0),
            snap(4, "B", Some(5.0), 100.0),
            snap(4, "C", Some(3.0), 100.0),
        ];
        let mut engine = FactorEngine::new(10, 252);
        engine.observe(date(4), &day);
        let factors = engine.compute(&day);

        assert_eq!(factors["B"].liquidity_rank, Some(1));
        assert_eq!(factors["C"].liquidity_rank, Some(2));
        assert_eq!(factors["A"].liquidity_rank, Some(3));
    }

    #[test]
    fn ties_rank_by_sid() {
        let day = [snap(4, "B", Some(1.0), 100.0), snap(4, "A", Some(1.0), 100.0)];
        let mut engine = FactorEngine::new(10, 252);
        engine.observe(date(4), &day);
        let factors = engine.compute(&day);
        assert_eq!(factors["A"].liquidity_rank, Some(1));
        assert_eq!(factors["B"].liquidity_rank, Some(2));
    }

    #[test]
    fn snapshot_distances_take_precedence_over_calendar() {
        let mut calendar = EventCalendar::new();
        calendar.add("A", EventKind::BuybackAuthorization, date(1));
        let engine = FactorEngine::new(10, 252).with_calendar(calendar);

        let mut s = snap(8, "A", Some(1.0), 1.0);
        assert_eq!(engine.event_distances(&s).days_since_buyback, Some(5));

        s.events.days_since_buyback = Some(2);
        assert_eq!(engine.event_distances(&s).days_since_buyback, Some(2));
    }

    #[test]
    fn calendar_fills_only_the_missing_distances() {
        let mut calendar = EventCalendar::new();
        calendar.add("A", EventKind::BuybackAuthorization, date(1));
        calendar.add("A", EventKind::Earnings, date(12));
        let engine = FactorEngine::new(10, 252).with_calendar(calendar);

        let mut s = snap(8, "A", Some(1.0), 1.0);
        s.events.days_since_buyback = Some(2);
        let events = engine.event_distances(&s);
        assert_eq!(events.days_since_buyback, Some(2));
        assert_eq!(events.days_until_earnings, Some(2));
    }
}

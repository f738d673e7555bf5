//! Business-day arithmetic and the corporate-event calendar.

use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::HashMap;

use super::snapshot::EventDistances;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Earnings,
    BuybackAuthorization,
}

impl std::str::FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "earnings" => Ok(EventKind::Earnings),
            "buyback" | "buyback_authorization" => Ok(EventKind::BuybackAuthorization),
            other => Err(format!("unknown event kind '{other}'")),
        }
    }
}

pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Number of business days stepped over going from `from` to `to`.
///
/// Counts weekdays in `(from, to]`, so consecutive weekdays are 1 apart and
/// Friday → Monday is also 1. Negative when `to` precedes `from`.
pub fn business_days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    if to < from {
        return -business_days_between(to, from);
    }
    let total = (to - from).num_days();
    let full_weeks = total / 7;
    let mut count = full_weeks * 5;
    let mut day = from + chrono::Duration::days(full_weeks * 7);
    while day < to {
        day = day + chrono::Duration::days(1);
        if is_business_day(day) {
            count += 1;
        }
    }
    count
}

/// Known earnings announcements and buyback authorizations per security.
#[derive(Debug, Clone, Default)]
pub struct EventCalendar {
    earnings: HashMap<String, Vec<NaiveDate>>,
    buybacks: HashMap<String, Vec<NaiveDate>>,
}

impl EventCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, sid: &str, kind: EventKind, date: NaiveDate) {
        let map = match kind {
            EventKind::Earnings => &mut self.earnings,
            EventKind::BuybackAuthorization => &mut self.buybacks,
        };
        let dates = map.entry(sid.to_string()).or_default();
        if let Err(pos) = dates.binary_search(&date) {
            dates.insert(pos, date);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.earnings.is_empty() && self.buybacks.is_empty()
    }

    /// Distances from `today` to the nearest relevant events. An event further
    /// than `lookback` business days away is treated as unknown.
    pub fn distances(&self, sid: &str, today: NaiveDate, lookback: i64) -> EventDistances {
        let within = |d: i64| (d <= lookback).then_some(d);

        let days_until_earnings = self
            .earnings
            .get(sid)
            .and_then(|dates| dates.iter().find(|&&d| d >= today))
            .and_then(|&d| within(business_days_between(today, d)));

        let days_since_earnings = self
            .earnings
            .get(sid)
            .and_then(|dates| dates.iter().rev().find(|&&d| d < today))
            .and_then(|&d| within(business_days_between(d, today)));

        let days_since_buyback = self
            .buybacks
            .get(sid)
            .and_then(|dates| dates.iter().rev().find(|&&d| d <= today))
            .and_then(|&d| within(business_days_between(d, today)));

        EventDistances {
            days_until_earnings,
            days_since_earnings,
            days_since_buyback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn weekdays_are_business_days() {
        assert!(is_business_day(d(2024, 3, 4))); // Monday
        assert!(is_business_day(d(2024, 3, 8))); // Friday
        assert!(!is_business_day(d(2024, 3, 9)));
        assert!(!is_business_day(d(2024, 3, 10)));
    }

    #[test]
    fn business_days_within_week() {
        assert_eq!(business_days_between(d(2024, 3, 4), d(2024, 3, 4)), 0);
        assert_eq!(business_days_between(d(2024, 3, 4), d(2024, 3, 8)), 4);
    }

    #[test]
    fn business_days_skip_weekend() {
        // Friday -> Monday
        assert_eq!(business_days_between(d(2024, 3, 8), d(2024, 3, 11)), 1);
        // Monday -> Monday two weeks later
        assert_eq!(business_days_between(d(2024, 3, 4), d(2024, 3, 18)), 10);
        // Saturday -> Sunday
        assert_eq!(business_days_between(d(2024, 3, 9), d(2024, 3, 10)), 0);
    }

    #[test]
    fn business_days_negative_when_reversed() {
        assert_eq!(business_days_between(d(2024, 3, 8), d(2024, 3, 4)), -4);
    }

    #[test]
    fn distances_pick_nearest_events() {
        let mut cal = EventCalendar::new();
        cal.add("1", EventKind::Earnings, d(2024, 1, 25));
        cal.add("1", EventKind::Earnings, d(2024, 4, 25));
        cal.add("1", EventKind::BuybackAuthorization, d(2024, 3, 1));
        cal.add("1", EventKind::BuybackAuthorization, d(2023, 11, 1));

        let dist = cal.distances("1", d(2024, 3, 15), 252);
        assert_eq!(dist.days_since_buyback, Some(10));
        assert_eq!(dist.days_until_earnings, Some(29));
        assert_eq!(dist.days_since_earnings, Some(36));
    }

    #[test]
    fn distances_respect_lookback() {
        let mut cal = EventCalendar::new();
        cal.add("1", EventKind::BuybackAuthorization, d(2024, 1, 1));
        let dist = cal.distances("1", d(2024, 3, 15), 20);
        assert_eq!(dist.days_since_buyback, None);
    }

    #[test]
    fn unknown_security_has_no_distances() {
        let cal = EventCalendar::new();
        assert!(cal.distances("404", d(2024, 3, 15), 252).is_empty());
    }

    #[test]
    fn add_dedups_and_sorts() {
        let mut cal = EventCalendar::new();
        cal.add("1", EventKind::Earnings, d(2024, 4, 25));
        cal.add("1", EventKind::Earnings, d(2024, 1, 25));
        cal.add("1", EventKind::Earnings, d(2024, 1, 25));
        assert_eq!(cal.earnings["1"], vec![d(2024, 1, 25), d(2024, 4, 25)]);
    }
}

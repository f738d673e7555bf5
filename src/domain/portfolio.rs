//! Portfolio weights as reported by the execution side, plus telemetry.

use std::collections::BTreeMap;

/// Current fractional weight per security. Flat securities are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortfolioWeights {
    weights: BTreeMap<String, f64>,
}

impl PortfolioWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, sid: &str, weight: f64) {
        if weight == 0.0 {
            self.weights.remove(sid);
        } else {
            self.weights.insert(sid.to_string(), weight);
        }
    }

    pub fn weight(&self, sid: &str) -> f64 {
        self.weights.get(sid).copied().unwrap_or(0.0)
    }

    pub fn holds(&self, sid: &str) -> bool {
        self.weights.contains_key(sid)
    }

    pub fn position_count(&self) -> usize {
        self.weights.len()
    }

    pub fn sids(&self) -> impl Iterator<Item = &str> {
        self.weights.keys().map(String::as_str)
    }

    /// Sum of absolute weights.
    pub fn leverage(&self) -> f64 {
        self.weights.values().map(|w| w.abs()).sum()
    }
}

impl FromIterator<(String, f64)> for PortfolioWeights {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut p = PortfolioWeights::new();
        for (sid, w) in iter {
            p.set(&sid, w);
        }
        p
    }
}

/// Presentational per-day figures. Nothing in the strategy reads them back.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Telemetry {
    pub leverage: f64,
    pub positions: usize,
    pub ledger_size: usize,
    pub candidates: usize,
}

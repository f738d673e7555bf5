//! Holding-duration ledger.

use std::collections::BTreeMap;

/// Days each currently held security has been held. A security has at most
/// one record; absence means not held.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionLedger {
    days_held: BTreeMap<String, u32>,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, sid: &str) {
        self.days_held.entry(sid.to_string()).or_insert(0);
    }

    pub fn days_held(&self, sid: &str) -> Option<u32> {
        self.days_held.get(sid).copied()
    }

    pub fn is_held(&self, sid: &str) -> bool {
        self.days_held.contains_key(sid)
    }

    /// Advance a held security by one day, returning the new count.
    pub fn increment(&mut self, sid: &str) -> Option<u32> {
        let days = self.days_held.get_mut(sid)?;
        *days += 1;
        Some(*days)
    }

    pub fn close(&mut self, sid: &str) -> Option<u32> {
        self.days_held.remove(sid)
    }

    pub fn len(&self) -> usize {
        self.days_held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days_held.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.days_held.iter().map(|(sid, d)| (sid.as_str(), *d))
    }

    pub fn sids(&self) -> impl Iterator<Item = &str> {
        self.days_held.keys().map(String::as_str)
    }
}

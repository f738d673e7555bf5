//! Telemetry sink port trait.

use crate::domain::error::StrategyError;
use crate::domain::portfolio::Telemetry;
use chrono::NaiveDate;

pub trait TelemetryPort {
    fn record(&mut self, date: NaiveDate, telemetry: &Telemetry) -> Result<(), StrategyError>;
}

/// Discards everything.
pub struct NullTelemetry;

impl TelemetryPort for NullTelemetry {
    fn record(&mut self, _date: NaiveDate, _telemetry: &Telemetry) -> Result<(), StrategyError> {
        Ok(())
    }
}

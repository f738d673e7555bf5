//! CSV sinks for executed instructions and daily telemetry.

use crate::adapters::sim_broker::ExecutedInstruction;
use crate::domain::error::StrategyError;
use crate::domain::portfolio::Telemetry;
use crate::ports::telemetry_port::TelemetryPort;
use chrono::NaiveDate;
use serde::Serialize;
use std::fs::File;
use std::path::Path;

#[derive(Serialize)]
struct InstructionRow<'a> {
    date: NaiveDate,
    sid: &'a str,
    weight: f64,
    reason: String,
}

#[derive(Serialize)]
struct TelemetryRow {
    date: NaiveDate,
    leverage: f64,
    positions: usize,
    ledger_size: usize,
    candidates: usize,
}

fn csv_error(path: &Path, e: csv::Error) -> StrategyError {
    StrategyError::data(path.display().to_string(), format!("CSV write error: {e}"))
}

pub fn write_instructions(
    path: &Path,
    instructions: &[ExecutedInstruction],
) -> Result<(), StrategyError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
    for i in instructions {
        wtr.serialize(InstructionRow {
            date: i.date,
            sid: &i.sid,
            weight: i.weight,
            reason: i.reason.to_string(),
        })
        .map_err(|e| csv_error(path, e))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Streams one telemetry row per trading day.
pub struct CsvTelemetryWriter {
    path: String,
    writer: csv::Writer<File>,
}

impl CsvTelemetryWriter {
    pub fn create(path: &Path) -> Result<Self, StrategyError> {
        let writer = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
        Ok(Self {
            path: path.display().to_string(),
            writer,
        })
    }

    pub fn finish(mut self) -> Result<(), StrategyError> {
        self.writer.flush()?;
        Ok(())
    }
}

impl TelemetryPort for CsvTelemetryWriter {
    fn record(&mut self, date: NaiveDate, telemetry: &Telemetry) -> Result<(), StrategyError> {
        self.writer
            .serialize(TelemetryRow {
                date,
                leverage: telemetry.leverage,
                positions: telemetry.positions,
                ledger_size: telemetry.ledger_size,
                candidates: telemetry.candidates,
            })
            .map_err(|e| StrategyError::data(&self.path, format!("CSV write error: {e}")))
    }
}

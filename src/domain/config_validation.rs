//! Configuration validation.
//!
//! Checks every config value before a run starts so that a bad file fails
//! fast with the offending section and key.

use crate::domain::error::StrategyError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
pub const LOG_FORMATS: [&str; 2] = ["pretty", "json"];

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), StrategyError> {
    validate_holding_period(config)?;
    validate_thresholds(config)?;
    validate_rank(config)?;
    validate_windows(config)?;
    validate_materiality(config)?;
    Ok(())
}

pub fn validate_run_config(config: &dyn ConfigPort) -> Result<(), StrategyError> {
    validate_dates(config)?;
    config.require_string("data", "snapshots")?;
    config.require_string("output", "instructions")?;
    validate_logging_config(config)?;
    Ok(())
}

fn validate_holding_period(config: &dyn ConfigPort) -> Result<(), StrategyError> {
    let value = config.get_int("strategy", "holding_period", 25);
    if value < 1 || value > i64::from(u32::MAX) {
        return Err(StrategyError::config_invalid(
            "strategy",
            "holding_period",
            "holding_period must be a positive number of days",
        ));
    }
    Ok(())
}

fn validate_thresholds(config: &dyn ConfigPort) -> Result<(), StrategyError> {
    for key in [
        "min_dollar_volume",
        "min_adjusted_dollar_volume",
        "min_market_cap",
    ] {
        let value = config.get_double("universe", key, 0.0);
        if value < 0.0 || !value.is_finite() {
            return Err(StrategyError::config_invalid(
                "universe",
                key,
                format!("{key} must be non-negative"),
            ));
        }
    }
    Ok(())
}

fn validate_rank(config: &dyn ConfigPort) -> Result<(), StrategyError> {
    let value = config.get_int("universe", "max_liquidity_rank", 2_000);
    if value < 1 {
        return Err(StrategyError::config_invalid(
            "universe",
            "max_liquidity_rank",
            "max_liquidity_rank must be at least 1",
        ));
    }
    Ok(())
}

fn validate_windows(config: &dyn ConfigPort) -> Result<(), StrategyError> {
    if config.get_int("universe", "liquidity_window", 252) < 1 {
        return Err(StrategyError::config_invalid(
            "universe",
            "liquidity_window",
            "liquidity_window must be at least 1 day",
        ));
    }
    if config.get_int("signal", "max_event_window", 15) < 0 {
        return Err(StrategyError::config_invalid(
            "signal",
            "max_event_window",
            "max_event_window must be non-negative",
        ));
    }
    if config.get_int("signal", "event_lookback", 252) < 1 {
        return Err(StrategyError::config_invalid(
            "signal",
            "event_lookback",
            "event_lookback must be at least 1 day",
        ));
    }
    Ok(())
}

fn validate_materiality(config: &dyn ConfigPort) -> Result<(), StrategyError> {
    let value = config.get_double("signal", "materiality_threshold", 0.05);
    if !(0.0..1.0).contains(&value) {
        return Err(StrategyError::config_invalid(
            "signal",
            "materiality_threshold",
            "materiality_threshold must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), StrategyError> {
    let start_str = config.get_string("run", "start_date");
    let end_str = config.get_string("run", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date > end_date {
        return Err(StrategyError::config_invalid(
            "run",
            "start_date",
            "start_date must not be after end_date",
        ));
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, StrategyError> {
    match value {
        None => Err(StrategyError::config_missing("run", field)),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            StrategyError::config_invalid(
                "run",
                field,
                format!("invalid {field} format, expected YYYY-MM-DD"),
            )
        }),
    }
}

pub fn validate_logging_config(config: &dyn ConfigPort) -> Result<(), StrategyError> {
    if let Some(level) = config.get_string("logging", "level") {
        if !LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
            return Err(StrategyError::config_invalid(
                "logging",
                "level",
                format!("level must be one of {}", LOG_LEVELS.join(", ")),
            ));
        }
    }
    if let Some(format) = config.get_string("logging", "format") {
        if !LOG_FORMATS.contains(&format.to_lowercase().as_str()) {
            return Err(StrategyError::config_invalid(
                "logging",
                "format",
                format!("format must be one of {}", LOG_FORMATS.join(", ")),
            ));
        }
    }
    Ok(())
}

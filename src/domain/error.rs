//! Crate error type and exit-code mapping.

use chrono::NaiveDate;

/// Top-level error type for buyback-drift.
///
/// Only the shell around the strategy (config, data feeds, execution) can
/// fail. Screening, conversion and rebalancing never return errors; missing
/// facts degrade to "no action for that security".
#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error in {source_name}: {reason}")]
    Data { source_name: String, reason: String },

    #[error("no trading days between {start} and {end}")]
    NoData { start: NaiveDate, end: NaiveDate },

    #[error("execution error for {sid}: {reason}")]
    Execution { sid: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StrategyError {
    pub fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        StrategyError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn config_missing(section: &str, key: &str) -> Self {
        StrategyError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }

    pub fn data(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        StrategyError::Data {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}

impl From<&StrategyError> for std::process::ExitCode {
    fn from(err: &StrategyError) -> Self {
        let code: u8 = match err {
            StrategyError::Io(_) => 1,
            StrategyError::ConfigParse { .. }
            | StrategyError::ConfigMissing { .. }
            | StrategyError::ConfigInvalid { .. } => 2,
            StrategyError::Data { .. } => 3,
            StrategyError::NoData { .. } => 5,
            StrategyError::Execution { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_invalid_message() {
        let err = StrategyError::config_invalid("universe", "min_market_cap", "must be positive");
        assert_eq!(
            err.to_string(),
            "invalid config value [universe] min_market_cap: must be positive"
        );
    }

    #[test]
    fn config_missing_message() {
        let err = StrategyError::config_missing("data", "snapshots");
        assert_eq!(err.to_string(), "missing config key [data] snapshots");
    }

    #[test]
    fn data_error_message() {
        let err = StrategyError::data("snapshots.csv", "bad row");
        assert_eq!(err.to_string(), "data error in snapshots.csv: bad row");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: StrategyError = io.into();
        assert!(matches!(err, StrategyError::Io(_)));
    }
}

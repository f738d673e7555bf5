//! Configuration access port trait.

use crate::domain::error::StrategyError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;

    /// Non-blank string value, or `ConfigMissing`.
    fn require_string(&self, section: &str, key: &str) -> Result<String, StrategyError> {
        self.get_string(section, key)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| StrategyError::config_missing(section, key))
    }
}

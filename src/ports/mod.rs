//! Port traits the strategy core talks through.

pub mod config_port;
pub mod execution_port;
pub mod market_data_port;
pub mod telemetry_port;

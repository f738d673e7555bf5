//! Core domain types and logic.

pub mod buyback;
pub mod calendar;
pub mod config_validation;
pub mod error;
pub mod factor;
pub mod ledger;
pub mod portfolio;
pub mod rebalance;
pub mod screener;
pub mod simulation;
pub mod snapshot;
pub mod strategy;

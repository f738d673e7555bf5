//! Order execution port trait.

use crate::domain::error::StrategyError;
use crate::domain::portfolio::PortfolioWeights;
use crate::domain::rebalance::TargetWeight;
use chrono::NaiveDate;

/// The execution collaborator. It owns the actual positions; the strategy only
/// reads weights and submits targets.
pub trait ExecutionPort {
    fn current_weights(&self) -> PortfolioWeights;

    /// Submit a target weight. Repeated liquidations of an already flat
    /// security must be accepted.
    fn order_target_weight(
        &mut self,
        date: NaiveDate,
        target: &TargetWeight,
    ) -> Result<(), StrategyError>;
}

//! In-memory execution adapter for simulation runs.
//!
//! Fills every target weight immediately at the requested weight and keeps a
//! log of everything it was asked to do.

use crate::domain::error::StrategyError;
use crate::domain::portfolio::PortfolioWeights;
use crate::domain::rebalance::{InstructionReason, TargetWeight};
use crate::ports::execution_port::ExecutionPort;
use chrono::NaiveDate;

/// One accepted instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedInstruction {
    pub date: NaiveDate,
    pub sid: String,
    pub weight: f64,
    pub reason: InstructionReason,
    /// Whether the security was held when the instruction arrived.
    pub was_held: bool,
}

#[derive(Debug, Default)]
pub struct SimBroker {
    weights: PortfolioWeights,
    log: Vec<ExecutedInstruction>,
}

impl SimBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing holdings, e.g. positions carried in from elsewhere.
    pub fn with_weights(weights: PortfolioWeights) -> Self {
        Self {
            weights,
            log: Vec::new(),
        }
    }

    pub fn instructions(&self) -> &[ExecutedInstruction] {
        &self.log
    }
}

impl ExecutionPort for SimBroker {
    fn current_weights(&self) -> PortfolioWeights {
        self.weights.clone()
    }

    fn order_target_weight(
        &mut self,
        date: NaiveDate,
        target: &TargetWeight,
    ) -> Result<(), StrategyError> {
        if !target.weight.is_finite() || target.weight < 0.0 {
            return Err(StrategyError::Execution {
                sid: target.sid.clone(),
                reason: format!("invalid target weight {}", target.weight),
            });
        }

        let was_held = self.weights.holds(&target.sid);
        self.weights.set(&target.sid, target.weight);
        self.log.push(ExecutedInstruction {
            date,
            sid: target.sid.clone(),
            weight: target.weight,
            reason: target.reason,
            was_held,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
    }

    fn target(sid: &str, weight: f64, reason: InstructionReason) -> TargetWeight {
        TargetWeight {
            sid: sid.to_string(),
            weight,
            reason,
        }
    }

    #[test]
    fn applies_target_weights() {
        let mut broker = SimBroker::new();
        broker
            .order_target_weight(date(), &target("A", 0.5, InstructionReason::Enter))
            .unwrap();
        broker
            .order_target_weight(date(), &target("B", 0.5, InstructionReason::Enter))
            .unwrap();

        let w = broker.current_weights();
        assert_relative_eq!(w.leverage(), 1.0);
        assert_eq!(w.position_count(), 2);
        assert_eq!(broker.instructions().len(), 2);
    }

    #[test]
    fn liquidating_flat_security_is_accepted() {
        let mut broker = SimBroker::new();
        let order = target("A", 0.0, InstructionReason::RetryLiquidation);
        broker.order_target_weight(date(), &order).unwrap();
        broker.order_target_weight(date(), &order).unwrap();

        assert_eq!(broker.current_weights().position_count(), 0);
        assert!(broker.instructions().iter().all(|i| !i.was_held));
    }

    #[test]
    fn liquidation_removes_holding() {
        let weights: PortfolioWeights = vec![("A".to_string(), 1.0)].into_iter().collect();
        let mut broker = SimBroker::with_weights(weights);
        broker
            .order_target_weight(date(), &target("A", 0.0, InstructionReason::Exit))
            .unwrap();

        assert!(!broker.current_weights().holds("A"));
        assert!(broker.instructions()[0].was_held);
    }

    #[test]
    fn negative_weight_is_rejected() {
        let mut broker = SimBroker::new();
        let err = broker
            .order_target_weight(date(), &target("A", -0.1, InstructionReason::Enter))
            .unwrap_err();
        assert!(matches!(err, StrategyError::Execution { sid, .. } if sid == "A"));
        assert!(broker.instructions().is_empty());
    }
}

//! Stage 2: bound the gas a simulation may use.

use super::{Flow, Stage};
use crate::config::SimulationGasCeiling;
use crate::domain::context::Context;
use crate::domain::errors::AdmissionError;
use crate::domain::ordering::StageId;
use shared_types::Transaction;
use tracing::debug;

/// Rejects simulations declaring more gas than the ceiling, then caps the
/// meter at the ceiling.
///
/// The ceiling is the configured simulation limit, else the consensus max
/// block gas. Runs before any ledger access.
#[derive(Debug, Clone)]
pub struct LimitSimulationGasStage {
    ceiling: SimulationGasCeiling,
}

impl LimitSimulationGasStage {
    pub fn new(ceiling: SimulationGasCeiling) -> Self {
        Self { ceiling }
    }

    fn effective_ceiling(&self, ctx: &Context) -> Option<u64> {
        self.ceiling
            .simulation_gas_limit
            .or(ctx.max_block_gas.filter(|gas| *gas > 0))
    }
}

impl Stage for LimitSimulationGasStage {
    fn id(&self) -> StageId {
        StageId::LimitSimulationGas
    }

    fn run(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
    ) -> Result<Flow, AdmissionError> {
        if !simulate {
            return Ok(Flow::Continue);
        }
        let Some(ceiling) = self.effective_ceiling(ctx) else {
            return Ok(Flow::Continue);
        };

        if tx.gas() > ceiling {
            return Err(AdmissionError::GasCeilingExceeded {
                declared: tx.gas(),
                ceiling,
            });
        }

        debug!(ceiling, "[qc-18] Capping simulation gas");
        ctx.gas_meter = ctx.gas_meter.with_limit(ceiling);
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::test_helpers::check_ctx;

    fn tx_with_gas(gas: u64) -> Transaction {
        let mut tx = Transaction::default();
        tx.auth_info.fee.gas_limit = gas;
        tx
    }

    #[test]
    fn test_declared_gas_above_ceiling_rejected() {
        let stage = LimitSimulationGasStage::new(SimulationGasCeiling::new(Some(1_000)));
        let err = stage
            .run(&mut check_ctx(5), &tx_with_gas(1_001), true)
            .unwrap_err();
        assert_eq!(
            err,
            AdmissionError::GasCeilingExceeded {
                declared: 1_001,
                ceiling: 1_000
            }
        );
    }

    #[test]
    fn test_meter_capped_at_ceiling() {
        let stage = LimitSimulationGasStage::new(SimulationGasCeiling::new(Some(1_000)));
        let mut ctx = check_ctx(5);
        stage.run(&mut ctx, &tx_with_gas(0), true).unwrap();
        assert_eq!(ctx.gas_meter.limit(), Some(1_000));
    }

    #[test]
    fn test_falls_back_to_max_block_gas() {
        let stage = LimitSimulationGasStage::new(SimulationGasCeiling::new(None));
        let mut ctx = check_ctx(5).with_max_block_gas(500);
        assert!(matches!(
            stage.run(&mut ctx, &tx_with_gas(600), true),
            Err(AdmissionError::GasCeilingExceeded { ceiling: 500, .. })
        ));
    }

    #[test]
    fn test_ignored_outside_simulation() {
        let stage = LimitSimulationGasStage::new(SimulationGasCeiling::new(Some(1)));
        let mut ctx = check_ctx(5);
        assert_eq!(
            stage.run(&mut ctx, &tx_with_gas(1_000_000), false),
            Ok(Flow::Continue)
        );
        assert!(ctx.gas_meter.is_infinite());
    }
}

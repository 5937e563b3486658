//! Stage 1: fresh gas meter and a clean context.

use super::{Flow, Stage};
use crate::domain::context::Context;
use crate::domain::errors::AdmissionError;
use crate::domain::gas::GasMeter;
use crate::domain::ordering::StageId;
use shared_types::Transaction;

/// Installs the invocation's gas meter and clears leftover state.
///
/// The meter is infinite when simulating or at genesis, otherwise limited to
/// the declared gas. Never fails.
#[derive(Debug, Default)]
pub struct SetUpContextStage;

impl Stage for SetUpContextStage {
    fn id(&self) -> StageId {
        StageId::SetUpContext
    }

    fn run(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
    ) -> Result<Flow, AdmissionError> {
        let meter = if simulate || ctx.is_genesis() {
            GasMeter::infinite()
        } else {
            GasMeter::new(tx.gas())
        };
        ctx.reset(simulate, meter);
        Ok(Flow::Continue)
    }
}

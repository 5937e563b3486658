//! The composed handler.
//!
//! Stages are held as an ordered list and driven by one loop that returns
//! on the first failure. Gas charged before a failure stays on the caller's
//! context.

use crate::domain::context::Context;
use crate::domain::errors::StageError;
use crate::domain::ordering::StageId;
use crate::stages::{Admission, Flow, Stage};
use shared_types::Transaction;
use tracing::{debug, info, warn};

/// Runs a fixed sequence of admission stages.
pub struct AnteHandler {
    stages: Vec<Box<dyn Stage>>,
}

impl AnteHandler {
    pub(crate) fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Stage identifiers in execution order.
    pub fn stage_order(&self) -> Vec<StageId> {
        self.stages.iter().map(|stage| stage.id()).collect()
    }

    /// Admit `tx` against `ctx`.
    ///
    /// The context is left as the last stage to run wrote it, so gas used and
    /// priority are observable whether or not admission succeeded.
    pub fn handle(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
    ) -> Result<Admission, StageError> {
        for stage in &self.stages {
            let id = stage.id();
            match stage.run(ctx, tx, simulate) {
                Ok(Flow::Continue) => {
                    debug!(
                        stage = id.name(),
                        gas_used = ctx.gas_meter.consumed(),
                        "[qc-18] Stage passed"
                    );
                }
                Ok(Flow::Halt(admission)) => {
                    info!(
                        stage = id.name(),
                        gas_used = ctx.gas_meter.consumed(),
                        outcome = ?admission,
                        "[qc-18] Admission halted early"
                    );
                    return Ok(admission);
                }
                Err(source) => {
                    let err = StageError::new(id, source);
                    warn!(
                        stage = id.name(),
                        kind = ?err.kind(),
                        gas_used = ctx.gas_meter.consumed(),
                        simulate,
                        "[qc-18] Transaction rejected: {}",
                        err.source
                    );
                    return Err(err);
                }
            }
        }
        Ok(Admission::Accepted)
    }
}

impl std::fmt::Debug for AnteHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnteHandler")
            .field("stages", &self.stage_order())
            .finish()
    }
}

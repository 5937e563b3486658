//! Stage 14: replay protection.

use super::{Flow, Stage};
use crate::domain::context::Context;
use crate::domain::errors::AdmissionError;
use crate::domain::ordering::StageId;
use crate::ports::outbound::AccountLedger;
use shared_types::Transaction;
use std::sync::Arc;

/// Advances every signer's sequence by one. Skipped in simulation.
pub struct IncrementSequenceStage {
    accounts: Arc<dyn AccountLedger>,
}

impl IncrementSequenceStage {
    pub fn new(accounts: Arc<dyn AccountLedger>) -> Self {
        Self { accounts }
    }
}

impl Stage for IncrementSequenceStage {
    fn id(&self) -> StageId {
        StageId::IncrementSequence
    }

    fn run(
        &self,
        _ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
    ) -> Result<Flow, AdmissionError> {
        if simulate {
            return Ok(Flow::Continue);
        }
        for signer in tx.signers() {
            self.accounts.increment_sequence(&signer)?;
        }
        Ok(Flow::Continue)
    }
}

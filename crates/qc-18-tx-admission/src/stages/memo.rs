//! Stage 7: memo length.

use super::{Flow, Stage};
use crate::domain::context::Context;
use crate::domain::errors::AdmissionError;
use crate::domain::ordering::StageId;
use crate::ports::outbound::AccountLedger;
use shared_types::Transaction;
use std::sync::Arc;

/// Enforces `max_memo_characters` (in bytes) from the auth params.
pub struct ValidateMemoStage {
    accounts: Arc<dyn AccountLedger>,
}

impl ValidateMemoStage {
    pub fn new(accounts: Arc<dyn AccountLedger>) -> Self {
        Self { accounts }
    }
}

impl Stage for ValidateMemoStage {
    fn id(&self) -> StageId {
        StageId::ValidateMemo
    }

    fn run(
        &self,
        _ctx: &mut Context,
        tx: &Transaction,
        _simulate: bool,
    ) -> Result<Flow, AdmissionError> {
        let max = self.accounts.params().max_memo_characters;
        let length = tx.memo().len();
        if length as u64 > max {
            return Err(AdmissionError::MemoTooLong { length, max });
        }
        Ok(Flow::Continue)
    }
}

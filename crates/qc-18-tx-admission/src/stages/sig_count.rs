//! Stage 11: bound the number of signatures.

use super::{signer_meta, Flow, Stage};
use crate::domain::context::Context;
use crate::domain::errors::AdmissionError;
use crate::domain::ordering::StageId;
use crate::ports::outbound::AccountLedger;
use shared_types::Transaction;
use std::sync::Arc;

/// Rejects transactions whose signers hold more leaf keys than
/// `tx_sig_limit`. Multisig keys count every sub-key.
pub struct ValidateSigCountStage {
    accounts: Arc<dyn AccountLedger>,
}

impl ValidateSigCountStage {
    pub fn new(accounts: Arc<dyn AccountLedger>) -> Self {
        Self { accounts }
    }
}

impl Stage for ValidateSigCountStage {
    fn id(&self) -> StageId {
        StageId::ValidateSigCount
    }

    fn run(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
    ) -> Result<Flow, AdmissionError> {
        let limit = self.accounts.params().tx_sig_limit;
        let mut count = 0u64;
        for (index, address) in tx.signers().into_iter().enumerate() {
            let meta = signer_meta(ctx, self.accounts.as_ref(), tx, index, address, simulate)?;
            count = count.saturating_add(meta.pub_key.sub_key_count() as u64);
            if count > limit {
                return Err(AdmissionError::TooManySignatures { count, limit });
            }
        }
        Ok(Flow::Continue)
    }
}

//! Stage 12: pre-pay signature verification.

use super::{signature_data, signer_meta, Flow, Stage};
use crate::domain::context::Context;
use crate::domain::errors::AdmissionError;
use crate::domain::ordering::StageId;
use crate::domain::signing::{default_sig_verification_gas_consumer, SignatureGasConsumer};
use crate::ports::outbound::AccountLedger;
use shared_types::Transaction;
use std::sync::Arc;

/// Charges each signer's verification cost before any signature is checked.
pub struct SigGasConsumeStage {
    accounts: Arc<dyn AccountLedger>,
    consumer: SignatureGasConsumer,
}

impl SigGasConsumeStage {
    pub fn new(accounts: Arc<dyn AccountLedger>, consumer: Option<SignatureGasConsumer>) -> Self {
        Self {
            accounts,
            consumer: consumer.unwrap_or_else(|| Arc::new(default_sig_verification_gas_consumer)),
        }
    }
}

impl Stage for SigGasConsumeStage {
    fn id(&self) -> StageId {
        StageId::SigGasConsume
    }

    fn run(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
    ) -> Result<Flow, AdmissionError> {
        let params = self.accounts.params();
        for (index, address) in tx.signers().into_iter().enumerate() {
            let meta = signer_meta(ctx, self.accounts.as_ref(), tx, index, address, simulate)?;
            let data = signature_data(tx, index, address, simulate)?;
            (self.consumer)(&mut ctx.gas_meter, &data, &meta.pub_key, &params)?;
        }
        Ok(Flow::Continue)
    }
}

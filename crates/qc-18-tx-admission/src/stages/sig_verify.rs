//! Stage 13: sequence check and signature verification.

use super::{signature_data, signer_meta, Flow, Stage};
use crate::domain::context::Context;
use crate::domain::errors::AdmissionError;
use crate::domain::ordering::StageId;
use crate::domain::signing::{verify_signature, SignatureError};
use crate::ports::outbound::{AccountLedger, SignModeHandler, SignerData};
use shared_types::Transaction;
use std::sync::Arc;

/// Checks every signer's declared sequence, then verifies its signature over
/// the canonical sign bytes.
///
/// Sequences are checked in every mode. Signatures are not verified in
/// simulation or on re-check. The account number is zero at genesis.
pub struct SigVerificationStage {
    accounts: Arc<dyn AccountLedger>,
    sign_mode: Arc<dyn SignModeHandler>,
}

impl SigVerificationStage {
    pub fn new(accounts: Arc<dyn AccountLedger>, sign_mode: Arc<dyn SignModeHandler>) -> Self {
        Self {
            accounts,
            sign_mode,
        }
    }
}

impl Stage for SigVerificationStage {
    fn id(&self) -> StageId {
        StageId::SigVerification
    }

    fn run(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
    ) -> Result<Flow, AdmissionError> {
        let signers = tx.signers();
        if signers.len() != tx.signatures.len() {
            return Err(AdmissionError::StructuralInvalid(format!(
                "invalid number of signers; expected {}, got {}",
                signers.len(),
                tx.signatures.len()
            )));
        }

        for (index, address) in signers.into_iter().enumerate() {
            let meta = signer_meta(ctx, self.accounts.as_ref(), tx, index, address, simulate)?;
            let info = tx.auth_info.signer_infos.get(index).ok_or_else(|| {
                AdmissionError::StructuralInvalid(format!("missing signer info for signer {index}"))
            })?;

            if info.sequence != meta.sequence {
                return Err(AdmissionError::SequenceMismatch {
                    signer: address,
                    expected: meta.sequence,
                    got: info.sequence,
                });
            }

            if simulate || ctx.is_recheck_tx() {
                continue;
            }

            let signer_data = SignerData {
                address,
                chain_id: ctx.chain_id.clone(),
                account_number: if ctx.is_genesis() { 0 } else { meta.account_number },
                sequence: meta.sequence,
                pub_key: meta.pub_key.clone(),
            };
            let data = signature_data(tx, index, address, false)?;
            let mut sign_bytes = |mode| {
                self.sign_mode
                    .get_sign_bytes(mode, &signer_data, tx)
                    .map_err(|e| SignatureError::SignBytes(e.to_string()))
            };

            verify_signature(&meta.pub_key, &data, &mut sign_bytes).map_err(|e| {
                AdmissionError::InvalidSignature {
                    signer: address,
                    reason: e.to_string(),
                }
            })?;
        }
        Ok(Flow::Continue)
    }
}

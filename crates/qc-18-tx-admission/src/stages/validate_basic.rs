//! Stage 5: stateless structural validation.

use super::{Flow, Stage};
use crate::domain::context::Context;
use crate::domain::errors::AdmissionError;
use crate::domain::ordering::StageId;
use shared_types::Transaction;

/// Largest gas limit a transaction may declare.
pub const MAX_GAS_WANTED: u64 = (1 << 63) - 1;

/// Runs transaction-level checks and every message's own validation.
///
/// Skipped on re-check: the transaction passed it when first admitted.
#[derive(Debug, Default)]
pub struct ValidateBasicStage;

impl ValidateBasicStage {
    fn validate(tx: &Transaction) -> Result<(), AdmissionError> {
        let invalid = |reason: String| Err(AdmissionError::StructuralInvalid(reason));

        if tx.messages().is_empty() {
            return invalid("must contain at least one message".into());
        }
        if tx.signatures.is_empty() {
            return invalid("no signatures supplied".into());
        }
        if tx.gas() > MAX_GAS_WANTED {
            return invalid(format!(
                "invalid gas supplied; {} > {}",
                tx.gas(),
                MAX_GAS_WANTED
            ));
        }
        if let Err(e) = tx.fee().validate() {
            return invalid(format!("invalid fee amount: {e}"));
        }

        let signers = tx.signers();
        if signers.len() != tx.signatures.len() {
            return invalid(format!(
                "wrong number of signatures; expected {}, got {}",
                signers.len(),
                tx.signatures.len()
            ));
        }
        if signers.len() != tx.auth_info.signer_infos.len() {
            return invalid(format!(
                "wrong number of signer infos; expected {}, got {}",
                signers.len(),
                tx.auth_info.signer_infos.len()
            ));
        }

        for (index, msg) in tx.messages().iter().enumerate() {
            msg.validate_basic()
                .map_err(|source| AdmissionError::InvalidMessage { index, source })?;
        }
        Ok(())
    }
}

impl Stage for ValidateBasicStage {
    fn id(&self) -> StageId {
        StageId::ValidateBasic
    }

    fn run(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        _simulate: bool,
    ) -> Result<Flow, AdmissionError> {
        if ctx.is_recheck_tx() {
            return Ok(Flow::Continue);
        }
        Self::validate(tx)?;
        Ok(Flow::Continue)
    }
}

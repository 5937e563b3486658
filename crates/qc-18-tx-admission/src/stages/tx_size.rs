//! Stage 8: gas proportional to transaction size.

use super::{Flow, Stage};
use crate::domain::context::Context;
use crate::domain::errors::AdmissionError;
use crate::domain::ordering::StageId;
use crate::domain::signing::{SIGNATURE_LEN, SIMULATION_PUBKEY};
use crate::ports::outbound::AccountLedger;
use shared_types::{PublicKey, Transaction};
use std::sync::Arc;

/// Per-signature encoding overhead charged for simulated signatures.
const SIMULATED_SIG_OVERHEAD: u64 = 6;

/// Charges `tx_size_cost_per_byte` for every byte of the encoded transaction.
///
/// In simulation, signers whose signature is still empty are charged as if a
/// signature and key were present, so the estimate covers the signed size.
pub struct ConsumeTxSizeGasStage {
    accounts: Arc<dyn AccountLedger>,
}

impl ConsumeTxSizeGasStage {
    pub fn new(accounts: Arc<dyn AccountLedger>) -> Self {
        Self { accounts }
    }

    fn simulated_signature_bytes(
        &self,
        tx: &Transaction,
        tx_sig_limit: u64,
    ) -> Result<u64, AdmissionError> {
        let mut total = 0u64;
        for (index, signer) in tx.signers().iter().enumerate() {
            let signed = tx.signatures.get(index).is_some_and(|sig| !sig.is_empty());
            if signed {
                continue;
            }
            let pub_key = self
                .accounts
                .account(signer)?
                .and_then(|account| account.pub_key)
                .unwrap_or(SIMULATION_PUBKEY);

            let mut cost = SIGNATURE_LEN as u64 + pub_key.encoded_len() as u64 + SIMULATED_SIG_OVERHEAD;
            if matches!(pub_key, PublicKey::Multisig { .. }) {
                cost = cost.saturating_mul(tx_sig_limit);
            }
            total = total.saturating_add(cost);
        }
        Ok(total)
    }
}

impl Stage for ConsumeTxSizeGasStage {
    fn id(&self) -> StageId {
        StageId::ConsumeGasForTxSize
    }

    fn run(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
    ) -> Result<Flow, AdmissionError> {
        let params = self.accounts.params();

        // raw bytes as received when the caller has them, else our encoding
        let size = if ctx.tx_bytes.is_empty() {
            tx.encode()
                .map_err(|e| AdmissionError::StructuralInvalid(format!("cannot encode tx: {e}")))?
                .len() as u64
        } else {
            ctx.tx_bytes.len() as u64
        };
        ctx.gas_meter
            .consume(params.tx_size_cost_per_byte.saturating_mul(size), "txSize")?;

        if simulate {
            let extra = self.simulated_signature_bytes(tx, params.tx_sig_limit)?;
            ctx.gas_meter
                .consume(params.tx_size_cost_per_byte.saturating_mul(extra), "txSize")?;
        }
        Ok(Flow::Continue)
    }
}

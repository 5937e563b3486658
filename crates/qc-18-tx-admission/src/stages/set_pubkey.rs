//! Stage 10: resolve and cache every signer's public key.

use super::{resolve_signer, Flow, Stage};
use crate::domain::context::Context;
use crate::domain::errors::AdmissionError;
use crate::domain::ordering::StageId;
use crate::ports::outbound::AccountLedger;
use shared_types::Transaction;
use std::sync::Arc;

/// Resolves each signer from the account ledger and the transaction.
///
/// A provided key must derive the signer's address. It is stored on the
/// account when the account has none yet. The resolved metadata is cached in
/// the context for the signature stages.
pub struct SetPubKeyStage {
    accounts: Arc<dyn AccountLedger>,
}

impl SetPubKeyStage {
    pub fn new(accounts: Arc<dyn AccountLedger>) -> Self {
        Self { accounts }
    }
}

impl Stage for SetPubKeyStage {
    fn id(&self) -> StageId {
        StageId::SetPubKey
    }

    fn run(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
    ) -> Result<Flow, AdmissionError> {
        let mut resolved = Vec::new();

        for (index, address) in tx.signers().into_iter().enumerate() {
            let provided = tx
                .auth_info
                .signer_infos
                .get(index)
                .and_then(|info| info.public_key.as_ref());

            if let Some(key) = provided {
                if !simulate && key.address() != address {
                    return Err(AdmissionError::InvalidPubKey {
                        address,
                        reason: "public key does not match signer address".into(),
                    });
                }
            }

            let meta = resolve_signer(self.accounts.as_ref(), tx, index, address, simulate)?;

            if !simulate {
                if let Some(key) = provided {
                    let stored = self
                        .accounts
                        .account(&address)?
                        .and_then(|account| account.pub_key);
                    if stored.is_none() {
                        self.accounts.set_pub_key(&address, key.clone())?;
                    }
                }
            }
            resolved.push(meta);
        }

        ctx.signers = resolved;
        Ok(Flow::Continue)
    }
}

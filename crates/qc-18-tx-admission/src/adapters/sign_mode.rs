//! Default sign-mode resolver.
//!
//! | Mode | Sign bytes |
//! |------|------------|
//! | `Direct` | bincode of `SignDoc { body_bytes, auth_info_bytes, chain_id, account_number }` |
//! | `LegacyAminoJson` | sorted-key JSON of the legacy std sign doc |
//!
//! Direct mode signs the sequence and fee through the encoded auth info. The
//! legacy document carries them as explicit fields.

use crate::ports::outbound::{SignModeError, SignModeHandler, SignerData};
use serde::Serialize;
use serde_json::{json, Value};
use shared_types::{SignMode, Transaction};

const SUPPORTED_MODES: [SignMode; 2] = [SignMode::Direct, SignMode::LegacyAminoJson];

#[derive(Serialize)]
struct SignDoc<'a> {
    body_bytes: Vec<u8>,
    auth_info_bytes: Vec<u8>,
    chain_id: &'a str,
    account_number: u64,
}

/// Resolver for `Direct` and `LegacyAminoJson`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSignModeHandler;

impl DefaultSignModeHandler {
    pub fn new() -> Self {
        Self
    }

    fn direct(signer: &SignerData, tx: &Transaction) -> Result<Vec<u8>, SignModeError> {
        let encoding = |e: bincode::Error| SignModeError::Encoding(e.to_string());
        let doc = SignDoc {
            body_bytes: bincode::serialize(&tx.body).map_err(encoding)?,
            auth_info_bytes: bincode::serialize(&tx.auth_info).map_err(encoding)?,
            chain_id: &signer.chain_id,
            account_number: signer.account_number,
        };
        bincode::serialize(&doc).map_err(encoding)
    }

    fn legacy_amino_json(signer: &SignerData, tx: &Transaction) -> Result<Vec<u8>, SignModeError> {
        let encoding = |e: serde_json::Error| SignModeError::Encoding(e.to_string());

        let msgs = tx
            .messages()
            .iter()
            .map(|msg| {
                Ok(json!({
                    "type": msg.type_url(),
                    "value": serde_json::to_value(msg).map_err(encoding)?,
                }))
            })
            .collect::<Result<Vec<Value>, SignModeError>>()?;

        let fee = &tx.auth_info.fee;
        let mut fee_doc = json!({
            "amount": serde_json::to_value(&fee.amount).map_err(encoding)?,
            "gas": fee.gas_limit.to_string(),
        });
        if let Some(payer) = fee.payer {
            fee_doc["payer"] = Value::String(hex::encode(payer));
        }
        if let Some(granter) = fee.granter {
            fee_doc["granter"] = Value::String(hex::encode(granter));
        }

        let doc = json!({
            "account_number": signer.account_number.to_string(),
            "chain_id": signer.chain_id,
            "fee": fee_doc,
            "memo": tx.memo(),
            "msgs": msgs,
            "sequence": signer.sequence.to_string(),
            "timeout_height": tx.timeout_height().to_string(),
        });
        // serde_json maps are ordered by key, so the output is canonical
        serde_json::to_vec(&doc).map_err(encoding)
    }
}

impl SignModeHandler for DefaultSignModeHandler {
    fn default_mode(&self) -> SignMode {
        SignMode::Direct
    }

    fn modes(&self) -> &[SignMode] {
        &SUPPORTED_MODES
    }

    fn get_sign_bytes(
        &self,
        mode: SignMode,
        signer: &SignerData,
        tx: &Transaction,
    ) -> Result<Vec<u8>, SignModeError> {
        match mode {
            SignMode::Direct => Self::direct(signer, tx),
            SignMode::LegacyAminoJson => Self::legacy_amino_json(signer, tx),
        }
    }
}

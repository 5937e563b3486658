//! # Transaction
//!
//! The decoded transaction handed to the admission pipeline.
//!
//! ```text
//! Transaction
//! ├── body        messages, memo, timeout height, extension options
//! ├── auth_info   signer infos (key, sign mode, sequence), fee
//! └── signatures  one entry per signer, order-aligned with `signers()`
//! ```
//!
//! Signers are the ordered, de-duplicated union of every message's signers.
//! The fee payer defaults to the first signer.

use crate::entities::{Address, Coins, Hash};
use crate::keys::PublicKey;
use crate::messages::Msg;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// An opaque extension option.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Any {
    pub type_url: String,
    pub value: Vec<u8>,
}

/// The part of the transaction that carries intent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxBody {
    pub messages: Vec<Msg>,
    pub memo: String,
    /// Block height after which the transaction is no longer valid (0 = none).
    pub timeout_height: u64,
    /// Options the node must understand to accept the transaction.
    pub extension_options: Vec<Any>,
    /// Options the node may ignore.
    pub non_critical_extension_options: Vec<Any>,
}

/// Fee declared by the transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    pub amount: Coins,
    pub gas_limit: u64,
    /// Explicit payer; defaults to the first signer.
    pub payer: Option<Address>,
    /// Account paying on the payer's behalf through a fee grant.
    pub granter: Option<Address>,
}

/// Signing mode used by one signer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignMode {
    /// Sign over the encoded body and auth info.
    Direct,
    /// Sign over the canonical (sorted-key) JSON sign document.
    LegacyAminoJson,
}

/// How a signer's signature bytes are to be interpreted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModeInfo {
    /// A single key signed with `mode`.
    Single { mode: SignMode },
    /// A threshold key; `bitarray[i]` marks whether sub-key `i` signed and
    /// `mode_infos` holds one entry per set bit.
    Multi {
        bitarray: Vec<bool>,
        mode_infos: Vec<ModeInfo>,
    },
}

/// Per-signer metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerInfo {
    /// Omitted once the key is stored on the account.
    pub public_key: Option<PublicKey>,
    pub mode_info: ModeInfo,
    pub sequence: u64,
}

/// Authorization data: who signs and who pays.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthInfo {
    pub signer_infos: Vec<SignerInfo>,
    pub fee: Fee,
}

/// A decoded transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub body: TxBody,
    pub auth_info: AuthInfo,
    pub signatures: Vec<Vec<u8>>,
}

impl Transaction {
    /// Messages in declaration order.
    pub fn messages(&self) -> &[Msg] {
        &self.body.messages
    }

    /// Ordered, de-duplicated signers of all messages.
    pub fn signers(&self) -> Vec<Address> {
        let mut signers: Vec<Address> = Vec::new();
        for msg in &self.body.messages {
            for signer in msg.signers() {
                if !signers.contains(&signer) {
                    signers.push(signer);
                }
            }
        }
        signers
    }

    /// Declared gas limit.
    pub fn gas(&self) -> u64 {
        self.auth_info.fee.gas_limit
    }

    /// Declared fee amount.
    pub fn fee(&self) -> &Coins {
        &self.auth_info.fee.amount
    }

    /// Account the fee is charged to (before fee-grant delegation).
    pub fn fee_payer(&self) -> Option<Address> {
        self.auth_info
            .fee
            .payer
            .or_else(|| self.signers().first().copied())
    }

    /// Account paying through a fee grant, if any.
    pub fn fee_granter(&self) -> Option<Address> {
        self.auth_info.fee.granter
    }

    /// Memo text.
    pub fn memo(&self) -> &str {
        &self.body.memo
    }

    /// Timeout height (0 = none).
    pub fn timeout_height(&self) -> u64 {
        self.body.timeout_height
    }

    /// Wire encoding (bincode).
    pub fn encode(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Decode from the wire encoding.
    pub fn decode(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }

    /// SHA-256 of the wire encoding.
    pub fn hash(&self) -> Result<Hash, bincode::Error> {
        let bytes = self.encode()?;
        Ok(Sha256::digest(&bytes).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{MsgExecuteContract, MsgSend};

    fn send(from: u8, to: u8) -> Msg {
        Msg::Send(MsgSend {
            from_address: [from; 20],
            to_address: [to; 20],
            amount: Coins::single("stake", 1).unwrap(),
        })
    }

    #[test]
    fn test_signers_are_deduplicated_in_order() {
        let tx = Transaction {
            body: TxBody {
                messages: vec![
                    send(2, 9),
                    send(1, 9),
                    Msg::ExecuteContract(MsgExecuteContract {
                        sender: [2; 20],
                        contract: [8; 20],
                        msg: b"{}".to_vec(),
                        funds: Coins::empty(),
                    }),
                ],
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(tx.signers(), vec![[2; 20], [1; 20]]);
    }

    #[test]
    fn test_fee_payer_defaults_to_first_signer() {
        let mut tx = Transaction {
            body: TxBody {
                messages: vec![send(5, 9)],
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(tx.fee_payer(), Some([5; 20]));

        tx.auth_info.fee.payer = Some([7; 20]);
        assert_eq!(tx.fee_payer(), Some([7; 20]));
    }

    #[test]
    fn test_encode_decode_preserves_transaction() {
        let tx = Transaction {
            body: TxBody {
                messages: vec![send(1, 2)],
                memo: "hello".into(),
                timeout_height: 42,
                ..Default::default()
            },
            auth_info: AuthInfo {
                signer_infos: vec![SignerInfo {
                    public_key: Some(PublicKey::Secp256k1([2; 33])),
                    mode_info: ModeInfo::Single {
                        mode: SignMode::Direct,
                    },
                    sequence: 3,
                }],
                fee: Fee {
                    amount: Coins::single("stake", 500).unwrap(),
                    gas_limit: 200_000,
                    payer: None,
                    granter: None,
                },
            },
            signatures: vec![vec![0xAB; 64]],
        };
        let bytes = tx.encode().unwrap();
        assert_eq!(Transaction::decode(&bytes).unwrap(), tx);
        assert_eq!(tx.hash().unwrap(), tx.hash().unwrap());
    }
}

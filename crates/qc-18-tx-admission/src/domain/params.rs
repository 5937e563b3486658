//! # Auth Parameters and Accounts
//!
//! Governance-controlled auth parameters read from the account ledger, and the
//! account record the ledger resolves addresses to.

use serde::{Deserialize, Serialize};
use shared_types::{Address, PublicKey};

/// Auth module parameters consulted by the pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthParams {
    /// Maximum memo length in bytes.
    pub max_memo_characters: u64,
    /// Maximum number of leaf keys across all signers.
    pub tx_sig_limit: u64,
    /// Gas charged per byte of encoded transaction.
    pub tx_size_cost_per_byte: u64,
    pub sig_verify_cost_ed25519: u64,
    pub sig_verify_cost_secp256k1: u64,
}

impl Default for AuthParams {
    fn default() -> Self {
        Self {
            max_memo_characters: 256,
            tx_sig_limit: 7,
            tx_size_cost_per_byte: 10,
            sig_verify_cost_ed25519: 590,
            sig_verify_cost_secp256k1: 1000,
        }
    }
}

/// An account as seen by the pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: Address,
    pub account_number: u64,
    pub sequence: u64,
    /// Unset until the account's first signed transaction.
    pub pub_key: Option<PublicKey>,
}

impl Account {
    pub fn new(address: Address, account_number: u64) -> Self {
        Self {
            address,
            account_number,
            sequence: 0,
            pub_key: None,
        }
    }
}

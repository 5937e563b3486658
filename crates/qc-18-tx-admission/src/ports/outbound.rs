//! # Outbound Ports (Driven Ports)
//!
//! Capabilities the admission pipeline consumes. The pipeline never
//! constructs them; the node wires concrete providers in through
//! `PipelineOptions`.
//!
//! Providers are the synchronization boundary between concurrent
//! invocations: every method takes `&self` and implementations must
//! serialize conflicting mutations themselves.

use crate::domain::errors::AdmissionError;
use crate::domain::params::{Account, AuthParams};
use shared_types::{Address, Coins, Msg, PacketId, PublicKey, RelayAction, SignMode, Transaction};
use thiserror::Error;

// =============================================================================
// PORT ERRORS
// =============================================================================

/// Backend failure of the account ledger, relay registry or tx-count store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Account {} not found", hex::encode(.0))]
    AccountNotFound(Address),

    #[error("Store error: {0}")]
    Store(String),
}

/// Fee ledger failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeeLedgerError {
    #[error("Insufficient funds in {denom}: required {required}, available {available}")]
    InsufficientFunds {
        denom: String,
        required: u128,
        available: u128,
    },

    #[error("Store error: {0}")]
    Store(String),
}

/// Fee grant failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeeGrantError {
    #[error("No allowance")]
    NoAllowance,

    #[error("Allowance exceeded: {0}")]
    AllowanceExceeded(String),

    #[error("Allowance expired")]
    Expired,

    #[error("Store error: {0}")]
    Store(String),
}

/// Sign-mode resolver failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignModeError {
    #[error("Unsupported sign mode {0:?}")]
    Unsupported(SignMode),

    #[error("Cannot encode sign document: {0}")]
    Encoding(String),
}

impl From<LedgerError> for AdmissionError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::AccountNotFound(address) => AdmissionError::UnknownAccount(address),
            LedgerError::Store(reason) => AdmissionError::Ledger(reason),
        }
    }
}

impl From<FeeLedgerError> for AdmissionError {
    fn from(err: FeeLedgerError) -> Self {
        match err {
            FeeLedgerError::InsufficientFunds {
                denom,
                required,
                available,
            } => AdmissionError::InsufficientFunds {
                denom,
                required,
                available,
            },
            FeeLedgerError::Store(reason) => AdmissionError::Ledger(reason),
        }
    }
}

// =============================================================================
// CAPABILITIES
// =============================================================================

/// Account ledger: address → account, plus the two mutations admission makes.
pub trait AccountLedger: Send + Sync {
    /// Current auth parameters.
    fn params(&self) -> AuthParams;

    /// Resolve an account, `None` if it does not exist.
    fn account(&self, address: &Address) -> Result<Option<Account>, LedgerError>;

    /// Address of a named module account (e.g. the fee collector).
    fn module_address(&self, name: &str) -> Address;

    /// Store the account's public key.
    fn set_pub_key(&self, address: &Address, pub_key: PublicKey) -> Result<(), LedgerError>;

    /// Advance the account's sequence by one, returning the new sequence.
    fn increment_sequence(&self, address: &Address) -> Result<u64, LedgerError>;
}

/// Fee / balance ledger.
pub trait FeeLedger: Send + Sync {
    /// Spendable balance of `denom`.
    fn spendable(&self, address: &Address, denom: &str) -> Result<u128, LedgerError>;

    /// Move `fee` from `payer` to `collector`. All or nothing.
    fn deduct_fee(&self, payer: &Address, collector: &Address, fee: &Coins)
        -> Result<(), FeeLedgerError>;

    /// Check `payer` could cover `fee` without moving funds.
    fn ensure_spendable(&self, payer: &Address, fee: &Coins) -> Result<(), FeeLedgerError> {
        for coin in fee {
            let available = self
                .spendable(payer, &coin.denom)
                .map_err(|e| FeeLedgerError::Store(e.to_string()))?;
            if available < coin.amount {
                return Err(FeeLedgerError::InsufficientFunds {
                    denom: coin.denom.clone(),
                    required: coin.amount,
                    available,
                });
            }
        }
        Ok(())
    }
}

/// Fee-grant registry: may `granter` pay `grantee`'s fee?
pub trait FeeGrantRegistry: Send + Sync {
    /// Authorize without consuming the allowance.
    fn check_allowance(
        &self,
        granter: &Address,
        grantee: &Address,
        fee: &Coins,
        msgs: &[Msg],
    ) -> Result<(), FeeGrantError>;

    /// Authorize and consume the allowance.
    fn use_granted_fees(
        &self,
        granter: &Address,
        grantee: &Address,
        fee: &Coins,
        msgs: &[Msg],
    ) -> Result<(), FeeGrantError>;
}

/// Signer metadata fed to the sign-mode resolver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignerData {
    pub address: Address,
    pub chain_id: String,
    pub account_number: u64,
    pub sequence: u64,
    pub pub_key: PublicKey,
}

/// Signature-mode resolver: produces the canonical bytes a signer signed.
pub trait SignModeHandler: Send + Sync {
    /// Mode used when a signer does not state one.
    fn default_mode(&self) -> SignMode;

    /// Modes this resolver can produce bytes for.
    fn modes(&self) -> &[SignMode];

    /// Canonical sign bytes for `signer` under `mode`.
    fn get_sign_bytes(
        &self,
        mode: SignMode,
        signer: &SignerData,
        tx: &Transaction,
    ) -> Result<Vec<u8>, SignModeError>;
}

/// Cross-chain relay registry.
pub trait RelayRegistry: Send + Sync {
    /// Returns true if `action` on `packet` was already applied (receipt
    /// written, or commitment cleared by an acknowledgement or timeout).
    fn is_processed(&self, action: RelayAction, packet: &PacketId) -> Result<bool, LedgerError>;
}

/// Per-block transaction counter.
pub trait TxCountStore: Send + Sync {
    /// Count one transaction at `height`, tallying each message type URL.
    ///
    /// Returns the transaction's index within the block (the count before
    /// this call). The counter restarts at zero on a new height.
    fn increment(&self, height: u64, msg_type_urls: &[&'static str]) -> Result<u32, LedgerError>;
}

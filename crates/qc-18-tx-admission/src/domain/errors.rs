//! # Admission Errors
//!
//! Every failure a stage can raise, the kind taxonomy callers branch on, and
//! construction-time errors of the pipeline builder.
//!
//! All admission errors are per-transaction outcomes. None of them is fatal to
//! the node.

use crate::domain::gas::GasError;
use crate::domain::ordering::StageId;
use shared_types::{Address, Coins, ValidationError};
use std::fmt;
use thiserror::Error;

/// Kind of an admission outcome, independent of payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingCapability,
    GasCeilingExceeded,
    StructuralInvalid,
    TimeoutExpired,
    MemoTooLong,
    InsufficientFee,
    InsufficientFunds,
    UnknownSigner,
    TooManySignatures,
    InvalidSignature,
    SequenceMismatch,
    /// Successful short-circuit, never carried by an `Err`.
    RedundantRelay,
    OutOfGas,
    InvalidGasLimit,
    InvalidPubKey,
    UnknownAccount,
    FeeGrantDenied,
    Ledger,
}

impl ErrorKind {
    /// Returns true if resubmitting a corrected transaction can succeed.
    pub fn is_caller_fixable(&self) -> bool {
        !matches!(self, Self::MissingCapability | Self::Ledger)
    }
}

/// Per-transaction admission failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdmissionError {
    /// Simulation declared more gas than the configured ceiling.
    #[error("Simulation gas limit exceeded: declared {declared}, ceiling {ceiling}")]
    GasCeilingExceeded { declared: u64, ceiling: u64 },

    /// Transaction-level structure is malformed.
    #[error("Invalid transaction: {0}")]
    StructuralInvalid(String),

    /// A message failed its own validation.
    #[error("Invalid message at index {index}: {source}")]
    InvalidMessage {
        index: usize,
        #[source]
        source: ValidationError,
    },

    /// Block height is past the declared timeout height.
    #[error("Transaction timed out: timeout height {timeout}, current height {height}")]
    TimeoutExpired { timeout: u64, height: u64 },

    /// Memo exceeds the byte limit.
    #[error("Memo too long: {length} > {max}")]
    MemoTooLong { length: usize, max: u64 },

    /// Fee is below the node's minimum gas price floor.
    #[error("Insufficient fee: got {provided}, required {required}")]
    InsufficientFee { provided: Coins, required: Coins },

    /// Paying account cannot cover the fee.
    #[error("Insufficient funds in {denom}: required {required}, available {available}")]
    InsufficientFunds {
        denom: String,
        required: u128,
        available: u128,
    },

    /// Signer account or key cannot be resolved.
    #[error("Unknown signer {}: {}", hex::encode(.address), .reason)]
    UnknownSigner { address: Address, reason: String },

    /// Signature count exceeds the configured limit.
    #[error("Too many signatures: {count} > {limit}")]
    TooManySignatures { count: u64, limit: u64 },

    /// A signature does not verify.
    #[error("Invalid signature for {}: {}", hex::encode(.signer), .reason)]
    InvalidSignature { signer: Address, reason: String },

    /// Declared sequence differs from the account's sequence.
    #[error("Account sequence mismatch for {}: expected {}, got {}", hex::encode(.signer), .expected, .got)]
    SequenceMismatch {
        signer: Address,
        expected: u64,
        got: u64,
    },

    /// Gas meter exhausted.
    #[error(transparent)]
    OutOfGas(#[from] GasError),

    /// Zero gas declared outside simulation and genesis.
    #[error("Must provide positive gas")]
    InvalidGasLimit,

    /// Public key is unusable for the signer.
    #[error("Invalid public key for {}: {}", hex::encode(.address), .reason)]
    InvalidPubKey { address: Address, reason: String },

    /// An account the fee path needs does not exist.
    #[error("Unknown account {}", hex::encode(.0))]
    UnknownAccount(Address),

    /// Fee grant missing, exhausted or not enabled.
    #[error("Fee grant from {} to {} denied: {}", hex::encode(.granter), hex::encode(.grantee), .reason)]
    FeeGrantDenied {
        granter: Address,
        grantee: Address,
        reason: String,
    },

    /// A capability backend failed.
    #[error("Ledger error: {0}")]
    Ledger(String),
}

impl AdmissionError {
    /// Kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::GasCeilingExceeded { .. } => ErrorKind::GasCeilingExceeded,
            Self::StructuralInvalid(_) | Self::InvalidMessage { .. } => ErrorKind::StructuralInvalid,
            Self::TimeoutExpired { .. } => ErrorKind::TimeoutExpired,
            Self::MemoTooLong { .. } => ErrorKind::MemoTooLong,
            Self::InsufficientFee { .. } => ErrorKind::InsufficientFee,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::UnknownSigner { .. } => ErrorKind::UnknownSigner,
            Self::TooManySignatures { .. } => ErrorKind::TooManySignatures,
            Self::InvalidSignature { .. } => ErrorKind::InvalidSignature,
            Self::SequenceMismatch { .. } => ErrorKind::SequenceMismatch,
            Self::OutOfGas(_) => ErrorKind::OutOfGas,
            Self::InvalidGasLimit => ErrorKind::InvalidGasLimit,
            Self::InvalidPubKey { .. } => ErrorKind::InvalidPubKey,
            Self::UnknownAccount(_) => ErrorKind::UnknownAccount,
            Self::FeeGrantDenied { .. } => ErrorKind::FeeGrantDenied,
            Self::Ledger(_) => ErrorKind::Ledger,
        }
    }
}

/// An admission failure annotated with the stage that raised it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{stage}: {source}")]
pub struct StageError {
    pub stage: StageId,
    #[source]
    pub source: AdmissionError,
}

impl StageError {
    pub fn new(stage: StageId, source: AdmissionError) -> Self {
        Self { stage, source }
    }

    /// Kind of the underlying error.
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}

/// Capabilities the builder requires before producing a handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    AccountLedger,
    FeeLedger,
    SignModeHandler,
    SimulationGasCeiling,
    TxCountStore,
}

impl Capability {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AccountLedger => "account ledger",
            Self::FeeLedger => "fee ledger",
            Self::SignModeHandler => "sign mode handler",
            Self::SimulationGasCeiling => "simulation gas ceiling",
            Self::TxCountStore => "tx count store",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pipeline construction failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuildError {
    /// Every required capability that was absent, in declaration order.
    #[error("Missing required capabilities: {}", join_capabilities(.0))]
    MissingCapabilities(Vec<Capability>),

    /// A custom stage order is unusable.
    #[error("Invalid stage order: {0}")]
    InvalidStageOrder(String),
}

impl BuildError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCapabilities(_) => ErrorKind::MissingCapability,
            Self::InvalidStageOrder(_) => ErrorKind::StructuralInvalid,
        }
    }
}

fn join_capabilities(capabilities: &[Capability]) -> String {
    capabilities
        .iter()
        .map(Capability::name)
        .collect::<Vec<_>>()
        .join(", ")
}

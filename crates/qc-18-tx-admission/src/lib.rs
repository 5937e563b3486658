//! # QC-18: Transaction Admission Subsystem
//!
//! The ordered gate every transaction passes before it may mutate ledger
//! state or consume execution resources. Fifteen independent stages run in a
//! fixed order; the first failure aborts the invocation and gas charged up
//! to that point stays charged.
//!
//! ## Architecture
//!
//! - **Domain**: Context, gas meter, stage ordering, fee and signature rules
//! - **Stages**: One module per admission check
//! - **Pipeline**: Capability validation, stage materialization, composed handler
//! - **Ports**: Inbound (AdmissionApi) and Outbound (AccountLedger, FeeLedger,
//!   FeeGrantRegistry, SignModeHandler, RelayRegistry, TxCountStore)
//! - **Adapters**: In-memory capability providers and the default sign-mode handler
//!
//! ## Canonical Order
//!
//! | # | Stage | Rejects with |
//! |---|-------|--------------|
//! | 1 | SetUpContext | never |
//! | 2 | LimitSimulationGas | GasCeilingExceeded |
//! | 3 | CountTx | Ledger |
//! | 4 | ExtensionOptions | StructuralInvalid |
//! | 5 | ValidateBasic | StructuralInvalid |
//! | 6 | TxTimeoutHeight | TimeoutExpired |
//! | 7 | ValidateMemo | MemoTooLong |
//! | 8 | ConsumeGasForTxSize | OutOfGas |
//! | 9 | DeductFee | InsufficientFee, InsufficientFunds |
//! | 10 | SetPubKey | UnknownSigner, InvalidPubKey |
//! | 11 | ValidateSigCount | TooManySignatures |
//! | 12 | SigGasConsume | OutOfGas |
//! | 13 | SigVerification | SequenceMismatch, InvalidSignature |
//! | 14 | IncrementSequence | Ledger |
//! | 15 | RedundantRelay | never (halts with `Admission::RedundantRelay`) |
//!
//! Fees are deducted before signatures are verified: a transaction that
//! cannot pay never costs the node a signature check.
//!
//! ## Isolation
//!
//! The pipeline does not roll back capability writes made before a failing
//! stage. Callers wrap each invocation in a revertible state scope.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod pipeline;
pub mod ports;
pub mod stages;

pub use adapters::{
    DefaultSignModeHandler, InMemoryAccountLedger, InMemoryBank, InMemoryFeeGrants,
    InMemoryRelayRegistry, InMemoryTxCounter,
};
pub use config::{AdmissionConfig, SimulationGasCeiling, FEE_COLLECTOR_NAME};
pub use domain::context::{Context, ExecMode, SignerMeta};
pub use domain::errors::{AdmissionError, BuildError, Capability, ErrorKind, StageError};
pub use domain::fees::{check_tx_fee_with_min_gas_prices, TxFeeChecker};
pub use domain::gas::{Gas, GasError, GasMeter};
pub use domain::ordering::{StageId, CANONICAL_ORDER};
pub use domain::params::{Account, AuthParams};
pub use domain::signing::{SignatureData, SignatureError, SignatureGasConsumer};
pub use pipeline::{AnteHandler, PipelineOptions};
pub use ports::inbound::AdmissionApi;
pub use ports::outbound::{
    AccountLedger, FeeGrantError, FeeGrantRegistry, FeeLedger, FeeLedgerError, LedgerError,
    RelayRegistry, SignModeError, SignModeHandler, SignerData, TxCountStore,
};
pub use stages::ext_options::{accept_type_urls, reject_all_extension_options, ExtensionOptionChecker};
pub use stages::{Admission, Flow, Stage};

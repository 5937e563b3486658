//! # Shared Types Crate
//!
//! This crate contains the transaction data model that crosses the boundary
//! between the consensus engine, the admission pipeline (QC-18) and the
//! ledger modules.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Every type a capability provider and the
//!   admission pipeline must agree on is defined here.
//! - **Immutable Input**: A decoded [`Transaction`] is never mutated by the
//!   pipeline; all per-invocation state lives in the pipeline's context.
//! - **Self-Validating Messages**: Every [`Msg`] knows its own structural rules
//!   (`validate_basic`), its type URL and its signers.
//!
//! ## Clusters
//!
//! | Module | Contents |
//! |--------|----------|
//! | `entities` | `Address`, `Hash`, `Coin`, `Coins`, `Dec`, `DecCoin` |
//! | `keys` | `PublicKey` (secp256k1, ed25519, threshold multisig) |
//! | `messages` | `Msg` and the bank / contract / relay message payloads |
//! | `transaction` | `Transaction`, `TxBody`, `AuthInfo`, `Fee`, `SignerInfo` |
//! | `errors` | `ValidationError`, `CoinError` |

pub mod entities;
pub mod errors;
pub mod keys;
pub mod messages;
pub mod transaction;

pub use entities::*;
pub use errors::*;
pub use keys::*;
pub use messages::*;
pub use transaction::*;

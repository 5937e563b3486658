//! # Adapters Layer
//!
//! Concrete capability providers: in-memory ledgers and registries, and the
//! default sign-mode resolver.

pub mod memory;
pub mod sign_mode;

pub use memory::{
    InMemoryAccountLedger, InMemoryBank, InMemoryFeeGrants, InMemoryRelayRegistry,
    InMemoryTxCounter,
};
pub use sign_mode::DefaultSignModeHandler;

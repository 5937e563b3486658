//! # Stage Ordering
//!
//! Stage identifiers and the canonical admission order.
//!
//! The position of each stage is load-bearing: later stages read context
//! written by earlier ones (the signer cache written by `SetPubKey` is read by
//! every signature stage) and the economic guarantees depend on gas being
//! charged before the work it pays for.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one admission stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StageId {
    SetUpContext,
    LimitSimulationGas,
    CountTx,
    ExtensionOptions,
    ValidateBasic,
    TxTimeoutHeight,
    ValidateMemo,
    ConsumeGasForTxSize,
    DeductFee,
    SetPubKey,
    ValidateSigCount,
    SigGasConsume,
    SigVerification,
    IncrementSequence,
    RedundantRelay,
}

/// The canonical admission order.
pub const CANONICAL_ORDER: [StageId; 15] = [
    StageId::SetUpContext,
    StageId::LimitSimulationGas,
    StageId::CountTx,
    StageId::ExtensionOptions,
    StageId::ValidateBasic,
    StageId::TxTimeoutHeight,
    StageId::ValidateMemo,
    StageId::ConsumeGasForTxSize,
    StageId::DeductFee,
    StageId::SetPubKey,
    StageId::ValidateSigCount,
    StageId::SigGasConsume,
    StageId::SigVerification,
    StageId::IncrementSequence,
    StageId::RedundantRelay,
];

impl StageId {
    /// Stable name used in logs and error annotations.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetUpContext => "set_up_context",
            Self::LimitSimulationGas => "limit_simulation_gas",
            Self::CountTx => "count_tx",
            Self::ExtensionOptions => "extension_options",
            Self::ValidateBasic => "validate_basic",
            Self::TxTimeoutHeight => "tx_timeout_height",
            Self::ValidateMemo => "validate_memo",
            Self::ConsumeGasForTxSize => "consume_gas_for_tx_size",
            Self::DeductFee => "deduct_fee",
            Self::SetPubKey => "set_pub_key",
            Self::ValidateSigCount => "validate_sig_count",
            Self::SigGasConsume => "sig_gas_consume",
            Self::SigVerification => "sig_verification",
            Self::IncrementSequence => "increment_sequence",
            Self::RedundantRelay => "redundant_relay",
        }
    }

    /// Position in the canonical order.
    pub fn canonical_position(&self) -> usize {
        // CANONICAL_ORDER lists the variants in declaration order
        *self as usize
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_order_matches_declaration_order() {
        for (position, stage) in CANONICAL_ORDER.iter().enumerate() {
            assert_eq!(stage.canonical_position(), position);
        }
    }

    #[test]
    fn test_fee_deduction_precedes_signature_stages() {
        let fee = StageId::DeductFee.canonical_position();
        assert!(fee < StageId::SetPubKey.canonical_position());
        assert!(fee < StageId::SigVerification.canonical_position());
        assert!(
            StageId::SigGasConsume.canonical_position()
                < StageId::SigVerification.canonical_position()
        );
        assert_eq!(CANONICAL_ORDER[0], StageId::SetUpContext);
        assert_eq!(CANONICAL_ORDER[14], StageId::RedundantRelay);
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = CANONICAL_ORDER.iter().map(StageId::name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), CANONICAL_ORDER.len());
    }
}

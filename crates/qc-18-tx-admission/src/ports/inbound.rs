//! # Inbound Ports (Driving Ports / API)
//!
//! Entry points the consensus engine uses, one per execution intensity.

use crate::domain::context::{Context, ExecMode};
use crate::domain::errors::StageError;
use crate::pipeline::AnteHandler;
use crate::stages::Admission;
use shared_types::Transaction;

/// Primary Transaction Admission API.
///
/// Each method sets the execution mode on the caller's context and runs the
/// full stage list. The context stays with the caller so gas consumption
/// and priority are readable afterwards.
pub trait AdmissionApi: Send + Sync {
    /// Full-intensity check before a transaction enters the mempool.
    fn check_tx(&self, ctx: &mut Context, tx: &Transaction) -> Result<Admission, StageError>;

    /// Lightweight re-check of a mempool transaction after a block commit.
    ///
    /// Structural validation and signature verification are skipped.
    fn recheck_tx(&self, ctx: &mut Context, tx: &Transaction) -> Result<Admission, StageError>;

    /// Admission during block execution.
    fn deliver_tx(&self, ctx: &mut Context, tx: &Transaction) -> Result<Admission, StageError>;

    /// Dry run for gas estimation. Never mutates capability state.
    ///
    /// Runs outside check mode, so the minimum-gas-price floor and the
    /// redundant relay short-circuit do not apply.
    fn simulate_tx(&self, ctx: &mut Context, tx: &Transaction) -> Result<Admission, StageError>;
}

impl AdmissionApi for AnteHandler {
    fn check_tx(&self, ctx: &mut Context, tx: &Transaction) -> Result<Admission, StageError> {
        ctx.exec_mode = ExecMode::Check;
        self.handle(ctx, tx, false)
    }

    fn recheck_tx(&self, ctx: &mut Context, tx: &Transaction) -> Result<Admission, StageError> {
        ctx.exec_mode = ExecMode::ReCheck;
        self.handle(ctx, tx, false)
    }

    fn deliver_tx(&self, ctx: &mut Context, tx: &Transaction) -> Result<Admission, StageError> {
        ctx.exec_mode = ExecMode::Deliver;
        self.handle(ctx, tx, false)
    }

    fn simulate_tx(&self, ctx: &mut Context, tx: &Transaction) -> Result<Admission, StageError> {
        ctx.exec_mode = ExecMode::Deliver;
        self.handle(ctx, tx, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ErrorKind;
    use crate::domain::signing::test_helpers::Secp256k1Signer;
    use crate::stages::test_helpers::{deliver_ctx, send_msg, signed_send, unsigned_tx, TestChain};
    use shared_types::DecCoin;

    #[test]
    fn test_entry_points_set_exec_mode() {
        let chain = TestChain::new();
        let signer = Secp256k1Signer::generate();
        chain.fund(&signer, 0, 1_000_000);
        let api: Box<dyn AdmissionApi> = Box::new(chain.options().build().unwrap());

        let tx = signed_send(&chain, &signer, 0, 2_000, 200_000);
        let mut ctx = deliver_ctx(3);
        assert!(api.check_tx(&mut ctx, &tx).is_ok());
        assert_eq!(ctx.exec_mode, ExecMode::Check);

        let tx = signed_send(&chain, &signer, 1, 2_000, 200_000);
        assert!(api.recheck_tx(&mut ctx, &tx).is_ok());
        assert_eq!(ctx.exec_mode, ExecMode::ReCheck);

        let tx = signed_send(&chain, &signer, 2, 2_000, 200_000);
        assert!(api.deliver_tx(&mut ctx, &tx).is_ok());
        assert_eq!(ctx.exec_mode, ExecMode::Deliver);
        assert_eq!(ctx.tx_counter, Some(2));
    }

    #[test]
    fn test_simulate_ignores_fee_floor_and_keeps_state() {
        let chain = TestChain::new();
        let signer = Secp256k1Signer::generate();
        let address = chain.fund(&signer, 0, 1_000_000);
        let handler = chain.options().build().unwrap();

        let floor: DecCoin = "10stake".parse().unwrap();
        let tx = unsigned_tx(vec![send_msg(address, 1)], &signer.public_key, 0, 1, 100_000);
        let mut ctx = deliver_ctx(3).with_min_gas_prices(vec![floor]);

        assert_eq!(handler.simulate_tx(&mut ctx, &tx), Ok(Admission::Accepted));
        assert!(ctx.simulate);
        assert!(ctx.gas_meter.consumed() > 0);

        let err = handler.check_tx(&mut ctx, &tx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFee);
    }
}

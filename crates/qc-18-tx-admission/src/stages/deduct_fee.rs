//! Stage 9: fee check and deduction.
//!
//! Runs before any signature stage: an unauthenticated transaction can make
//! the node attempt a deduction, but only a funded, existing account can
//! make it succeed.

use super::{Flow, Stage};
use crate::domain::context::Context;
use crate::domain::errors::AdmissionError;
use crate::domain::fees::{check_tx_fee_with_min_gas_prices, TxFeeChecker};
use crate::domain::ordering::StageId;
use crate::ports::outbound::{AccountLedger, FeeGrantError, FeeGrantRegistry, FeeLedger};
use shared_types::{Address, Coins, Transaction};
use std::sync::Arc;
use tracing::debug;

/// Computes the fee and priority, then debits the payer (or fee granter).
///
/// In simulation the fee checker is skipped, grants are checked but not
/// consumed, and funds are checked but not moved.
pub struct DeductFeeStage {
    accounts: Arc<dyn AccountLedger>,
    bank: Arc<dyn FeeLedger>,
    fee_grants: Option<Arc<dyn FeeGrantRegistry>>,
    fee_checker: Option<TxFeeChecker>,
    fee_collector: String,
}

impl DeductFeeStage {
    pub fn new(
        accounts: Arc<dyn AccountLedger>,
        bank: Arc<dyn FeeLedger>,
        fee_grants: Option<Arc<dyn FeeGrantRegistry>>,
        fee_checker: Option<TxFeeChecker>,
        fee_collector: impl Into<String>,
    ) -> Self {
        Self {
            accounts,
            bank,
            fee_grants,
            fee_checker,
            fee_collector: fee_collector.into(),
        }
    }

    fn check_deduct_fee(
        &self,
        tx: &Transaction,
        fee: &Coins,
        simulate: bool,
    ) -> Result<(), AdmissionError> {
        let collector = self.accounts.module_address(&self.fee_collector);
        if self.accounts.account(&collector)?.is_none() {
            return Err(AdmissionError::UnknownAccount(collector));
        }

        let payer = tx
            .fee_payer()
            .ok_or_else(|| AdmissionError::StructuralInvalid("no fee payer".into()))?;

        let deduct_from = match tx.fee_granter() {
            Some(granter) if granter != payer => {
                self.apply_grant(&granter, &payer, fee, tx, simulate)?;
                granter
            }
            _ => payer,
        };

        if self.accounts.account(&deduct_from)?.is_none() {
            return Err(AdmissionError::UnknownAccount(deduct_from));
        }

        if fee.is_zero() {
            return Ok(());
        }
        if simulate {
            self.bank.ensure_spendable(&deduct_from, fee)?;
        } else {
            self.bank.deduct_fee(&deduct_from, &collector, fee)?;
            debug!(
                payer = %hex::encode(deduct_from),
                fee = %fee,
                "[qc-18] Fee deducted"
            );
        }
        Ok(())
    }

    fn apply_grant(
        &self,
        granter: &Address,
        grantee: &Address,
        fee: &Coins,
        tx: &Transaction,
        simulate: bool,
    ) -> Result<(), AdmissionError> {
        let denied = |reason: String| AdmissionError::FeeGrantDenied {
            granter: *granter,
            grantee: *grantee,
            reason,
        };
        let Some(registry) = &self.fee_grants else {
            return Err(denied("fee grants are not enabled".into()));
        };

        let result = if simulate {
            registry.check_allowance(granter, grantee, fee, tx.messages())
        } else {
            registry.use_granted_fees(granter, grantee, fee, tx.messages())
        };
        result.map_err(|e| match e {
            FeeGrantError::Store(reason) => AdmissionError::Ledger(reason),
            other => denied(other.to_string()),
        })
    }
}

impl Stage for DeductFeeStage {
    fn id(&self) -> StageId {
        StageId::DeductFee
    }

    fn run(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
    ) -> Result<Flow, AdmissionError> {
        if !simulate && !ctx.is_genesis() && tx.gas() == 0 {
            return Err(AdmissionError::InvalidGasLimit);
        }

        let (fee, priority) = if simulate {
            (tx.fee().clone(), 0)
        } else {
            match &self.fee_checker {
                Some(checker) => checker(ctx, tx)?,
                None => check_tx_fee_with_min_gas_prices(ctx, tx)?,
            }
        };

        self.check_deduct_fee(tx, &fee, simulate)?;
        ctx.priority = priority;
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signing::test_helpers::Secp256k1Signer;
    use crate::stages::test_helpers::{
        check_ctx, deliver_ctx, send_msg, unsigned_tx, TestChain, DENOM,
    };

    fn stage(chain: &TestChain) -> DeductFeeStage {
        DeductFeeStage::new(
            chain.accounts.clone(),
            chain.bank.clone(),
            Some(chain.fee_grants.clone()),
            None,
            chain.config.fee_collector.clone(),
        )
    }

    fn fee_tx(chain: &TestChain, balance: u128, fee: u128, gas: u64) -> (Address, Transaction) {
        let signer = Secp256k1Signer::generate();
        let address = chain.fund(&signer, 0, balance);
        let tx = unsigned_tx(vec![send_msg(address, 1)], &signer.public_key, 0, fee, gas);
        (address, tx)
    }

    #[test]
    fn test_fee_moves_to_collector() {
        let chain = TestChain::new();
        let (payer, tx) = fee_tx(&chain, 1_000, 250, 100_000);
        let collector = chain.accounts.module_address(&chain.config.fee_collector);

        stage(&chain).run(&mut deliver_ctx(5), &tx, false).unwrap();

        assert_eq!(chain.bank.spendable(&payer, DENOM).unwrap(), 750);
        assert_eq!(chain.bank.spendable(&collector, DENOM).unwrap(), 250);
    }

    #[test]
    fn test_insufficient_funds() {
        let chain = TestChain::new();
        let (payer, tx) = fee_tx(&chain, 100, 250, 100_000);
        assert_eq!(
            stage(&chain).run(&mut deliver_ctx(5), &tx, false),
            Err(AdmissionError::InsufficientFunds {
                denom: DENOM.into(),
                required: 250,
                available: 100
            })
        );
        assert_eq!(chain.bank.spendable(&payer, DENOM).unwrap(), 100);
    }

    #[test]
    fn test_zero_gas_rejected_after_genesis() {
        let chain = TestChain::new();
        let (_, tx) = fee_tx(&chain, 1_000, 0, 0);
        assert_eq!(
            stage(&chain).run(&mut deliver_ctx(5), &tx, false),
            Err(AdmissionError::InvalidGasLimit)
        );
        assert!(stage(&chain).run(&mut deliver_ctx(0), &tx, false).is_ok());
    }

    #[test]
    fn test_min_gas_price_sets_priority() {
        let chain = TestChain::new();
        let (_, tx) = fee_tx(&chain, 10_000, 5_000, 1_000);
        let mut ctx = check_ctx(5).with_min_gas_prices(vec!["1stake".parse().unwrap()]);
        stage(&chain).run(&mut ctx, &tx, false).unwrap();
        assert_eq!(ctx.priority, 5);

        let (_, cheap) = fee_tx(&chain, 10_000, 999, 1_000);
        assert!(matches!(
            stage(&chain).run(&mut ctx, &cheap, false),
            Err(AdmissionError::InsufficientFee { .. })
        ));
    }

    #[test]
    fn test_custom_fee_checker_overrides_default() {
        let chain = TestChain::new();
        let (payer, tx) = fee_tx(&chain, 1_000, 250, 100);
        let checker: TxFeeChecker = Arc::new(|_, _| Ok((Coins::single(DENOM, 10).unwrap(), 77)));
        let stage = DeductFeeStage::new(
            chain.accounts.clone(),
            chain.bank.clone(),
            None,
            Some(checker),
            chain.config.fee_collector.clone(),
        );
        let mut ctx = deliver_ctx(5);
        stage.run(&mut ctx, &tx, false).unwrap();
        assert_eq!(ctx.priority, 77);
        assert_eq!(chain.bank.spendable(&payer, DENOM).unwrap(), 990);
    }

    #[test]
    fn test_fee_grant_pays_for_grantee() {
        let chain = TestChain::new();
        let (grantee, mut tx) = fee_tx(&chain, 0, 300, 1_000);
        let granter_signer = Secp256k1Signer::generate();
        let granter = chain.fund(&granter_signer, 0, 1_000);
        tx.auth_info.fee.granter = Some(granter);
        chain.fee_grants.grant(granter, grantee, Coins::single(DENOM, 500).unwrap());

        stage(&chain).run(&mut deliver_ctx(5), &tx, false).unwrap();

        assert_eq!(chain.bank.spendable(&granter, DENOM).unwrap(), 700);
        assert_eq!(
            chain
                .fee_grants
                .remaining(&granter, &grantee)
                .map(|left| left.amount_of(DENOM)),
            Some(200)
        );
    }

    #[test]
    fn test_missing_grant_denied() {
        let chain = TestChain::new();
        let (_, mut tx) = fee_tx(&chain, 0, 300, 1_000);
        tx.auth_info.fee.granter = Some([0x42; 20]);
        assert!(matches!(
            stage(&chain).run(&mut deliver_ctx(5), &tx, false),
            Err(AdmissionError::FeeGrantDenied { .. })
        ));
    }

    #[test]
    fn test_simulation_checks_funds_without_debit() {
        let chain = TestChain::new();
        let (payer, tx) = fee_tx(&chain, 1_000, 250, 100_000);
        stage(&chain).run(&mut deliver_ctx(5), &tx, true).unwrap();
        assert_eq!(chain.bank.spendable(&payer, DENOM).unwrap(), 1_000);

        let (_, broke) = fee_tx(&chain, 10, 250, 100_000);
        assert!(matches!(
            stage(&chain).run(&mut deliver_ctx(5), &broke, true),
            Err(AdmissionError::InsufficientFunds { .. })
        ));
    }

    #[test]
    fn test_unknown_payer() {
        let chain = TestChain::new();
        let signer = Secp256k1Signer::generate();
        let address = signer.public_key.address();
        let tx = unsigned_tx(vec![send_msg(address, 1)], &signer.public_key, 0, 10, 100);
        assert_eq!(
            stage(&chain).run(&mut deliver_ctx(5), &tx, false),
            Err(AdmissionError::UnknownAccount(address))
        );
    }
}

//! # Fee Checking
//!
//! The default fee checker: a node-local minimum gas price floor applied in
//! `Check` and `ReCheck` mode, plus fee-per-gas priority. Re-applying the
//! floor on re-check evicts pooled transactions once a node raises its prices.
//!
//! ## Algorithm
//!
//! ```text
//! required[denom] = ceil(min_gas_price[denom] × gas_limit)
//! accept if fee[denom] >= required[denom] for ANY denom
//! priority = min over fee coins of floor(amount / gas_limit)
//! ```
//!
//! The product is computed in `U256` so an 18-decimal price times a 64-bit gas
//! limit never overflows.

use crate::domain::context::Context;
use crate::domain::errors::AdmissionError;
use primitive_types::U256;
use shared_types::{Coin, Coins, Dec, DecCoin, Transaction};
use std::sync::Arc;

/// Computes the fee to deduct and the transaction's priority.
pub type TxFeeChecker =
    Arc<dyn Fn(&Context, &Transaction) -> Result<(Coins, i64), AdmissionError> + Send + Sync>;

/// Default checker: minimum gas price floor in check modes, priority always.
pub fn check_tx_fee_with_min_gas_prices(
    ctx: &Context,
    tx: &Transaction,
) -> Result<(Coins, i64), AdmissionError> {
    let fee = tx.fee();
    let gas = tx.gas();

    if ctx.is_check_tx() && !ctx.min_gas_prices.is_empty() {
        let required = required_fees(&ctx.min_gas_prices, gas)?;
        if !required.is_empty() && !fee.is_any_gte(&required) {
            return Err(AdmissionError::InsufficientFee {
                provided: fee.clone(),
                required,
            });
        }
    }

    Ok((fee.clone(), tx_priority(fee, gas)))
}

/// `ceil(price × gas)` per non-zero price.
pub fn required_fees(min_gas_prices: &[DecCoin], gas: u64) -> Result<Coins, AdmissionError> {
    let coins: Vec<Coin> = min_gas_prices
        .iter()
        .filter(|price| !price.amount.is_zero())
        .map(|price| Coin::new(price.denom.clone(), ceil_mul(price.amount, gas)))
        .filter(|coin| !coin.is_zero())
        .collect();

    Coins::new(coins).map_err(|e| AdmissionError::Ledger(format!("invalid min gas prices: {e}")))
}

/// Minimum fee-per-gas over the fee's denoms, capped at `i64::MAX`.
pub fn tx_priority(fee: &Coins, gas: u64) -> i64 {
    if gas == 0 {
        return 0;
    }
    fee.iter()
        .map(|coin| coin.amount / u128::from(gas))
        .min()
        .map(|p| i64::try_from(p).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

fn ceil_mul(price: Dec, gas: u64) -> u128 {
    let one = U256::from(Dec::ONE_RAW);
    let product = U256::from(price.raw()) * U256::from(gas);
    let ceiled = (product + one - U256::one()) / one;
    if ceiled > U256::from(u128::MAX) {
        u128::MAX
    } else {
        ceiled.as_u128()
    }
}

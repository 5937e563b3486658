//! # Gas Meter
//!
//! Per-invocation gas accounting.
//!
//! ## Invariants
//!
//! - `consumed` only ever increases within one invocation.
//! - A failed `consume` still records the charge: gas used before an abort is
//!   never refunded.

use thiserror::Error;

/// Gas units.
pub type Gas = u64;

/// Gas accounting failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GasError {
    /// Consumption pushed the meter past its limit.
    #[error("Out of gas in {descriptor}: limit {limit}, consumed {consumed}")]
    OutOfGas {
        descriptor: &'static str,
        limit: Gas,
        consumed: Gas,
    },

    /// Consumption overflowed `u64`.
    #[error("Gas overflow in {descriptor}")]
    Overflow { descriptor: &'static str },
}

/// Tracks gas consumed against an optional limit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GasMeter {
    limit: Option<Gas>,
    consumed: Gas,
}

impl GasMeter {
    /// A meter that fails once `limit` is exceeded.
    pub fn new(limit: Gas) -> Self {
        Self {
            limit: Some(limit),
            consumed: 0,
        }
    }

    /// A meter without a limit (simulation, genesis).
    pub fn infinite() -> Self {
        Self {
            limit: None,
            consumed: 0,
        }
    }

    /// Replace the limit, keeping what was already consumed.
    pub fn with_limit(&self, limit: Gas) -> Self {
        Self {
            limit: Some(limit),
            consumed: self.consumed,
        }
    }

    /// The limit, `None` for an infinite meter.
    pub fn limit(&self) -> Option<Gas> {
        self.limit
    }

    /// Gas consumed so far.
    pub fn consumed(&self) -> Gas {
        self.consumed
    }

    /// Gas left before the limit, `None` for an infinite meter.
    pub fn remaining(&self) -> Option<Gas> {
        self.limit.map(|l| l.saturating_sub(self.consumed))
    }

    /// Returns true if the meter has no limit.
    pub fn is_infinite(&self) -> bool {
        self.limit.is_none()
    }

    /// Charge `amount` gas.
    ///
    /// # Errors
    /// - `GasError::Overflow` if the total overflows (consumed saturates)
    /// - `GasError::OutOfGas` if the total exceeds the limit (charge is kept)
    pub fn consume(&mut self, amount: Gas, descriptor: &'static str) -> Result<(), GasError> {
        self.consumed = match self.consumed.checked_add(amount) {
            Some(total) => total,
            None => {
                self.consumed = Gas::MAX;
                return Err(GasError::Overflow { descriptor });
            }
        };

        match self.limit {
            Some(limit) if self.consumed > limit => Err(GasError::OutOfGas {
                descriptor,
                limit,
                consumed: self.consumed,
            }),
            _ => Ok(()),
        }
    }
}

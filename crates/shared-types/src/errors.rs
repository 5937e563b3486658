//! # Error Types
//!
//! Structural errors raised by the shared data model. These never depend on
//! ledger state; they are the outcome of a message's own `validate_basic`.

use thiserror::Error;

/// Errors in coin and decimal construction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoinError {
    /// Denom does not match `[a-zA-Z][a-zA-Z0-9/:._-]{2,127}`.
    #[error("Invalid denom: {0}")]
    InvalidDenom(String),

    /// A coin set holds a zero amount.
    #[error("Zero amount for denom {0}")]
    ZeroAmount(String),

    /// A coin set holds the same denom twice.
    #[error("Duplicate denom: {0}")]
    DuplicateDenom(String),

    /// A coin set is not sorted by denom.
    #[error("Coins are not sorted by denom")]
    Unsorted,

    /// Decimal string could not be parsed.
    #[error("Invalid decimal: {0}")]
    InvalidDecimal(String),
}

/// Errors raised by message self-validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// An address field is empty (all zero).
    #[error("Invalid {field} address")]
    InvalidAddress { field: &'static str },

    /// A coin field is malformed.
    #[error("Invalid {field}: {source}")]
    InvalidCoins {
        field: &'static str,
        #[source]
        source: CoinError,
    },

    /// A required field is empty.
    #[error("Empty {0}")]
    EmptyField(&'static str),

    /// A field exceeds its size limit.
    #[error("{field} too large: {size} > {max}")]
    TooLarge {
        field: &'static str,
        size: usize,
        max: usize,
    },

    /// A numeric field must be non-zero.
    #[error("{0} must be non-zero")]
    ZeroValue(&'static str),

    /// A relay identifier (port, channel, client) is malformed.
    #[error("Invalid {field} identifier: {value}")]
    InvalidIdentifier { field: &'static str, value: String },

    /// A contract message is not valid JSON.
    #[error("Invalid JSON in {field}: {reason}")]
    InvalidJson { field: &'static str, reason: String },

    /// Packet carries neither a timeout height nor a timeout timestamp.
    #[error("Packet timeout height and timestamp cannot both be zero")]
    MissingPacketTimeout,
}

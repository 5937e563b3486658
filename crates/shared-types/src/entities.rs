//! # Core Domain Entities
//!
//! Value types shared by every transaction: addresses, hashes and the coin
//! arithmetic used for fees and balances.
//!
//! ## Invariants
//!
//! - `Coins` is sorted by denom, denom-unique and holds only positive amounts
//!   once it has passed [`Coins::new`] or [`Coins::validate`].
//! - `Dec` is a fixed-point decimal with [`Dec::PRECISION`] fractional digits.

use crate::errors::CoinError;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use std::fmt;
use std::str::FromStr;

/// A 32-byte hash (SHA-256).
pub type Hash = [u8; 32];

/// A 20-byte account address.
///
/// Derived from a public key, see [`crate::PublicKey::address`].
pub type Address = [u8; 20];

/// The all-zero address. Never a valid signer or recipient.
pub const ZERO_ADDRESS: Address = [0u8; 20];

/// Minimum and maximum denom length (inclusive).
const DENOM_MIN_LEN: usize = 3;
const DENOM_MAX_LEN: usize = 128;

/// Validate a coin denomination: `[a-zA-Z][a-zA-Z0-9/:._-]{2,127}`.
pub fn validate_denom(denom: &str) -> Result<(), CoinError> {
    let bytes = denom.as_bytes();
    if bytes.len() < DENOM_MIN_LEN || bytes.len() > DENOM_MAX_LEN {
        return Err(CoinError::InvalidDenom(denom.to_string()));
    }
    if !bytes[0].is_ascii_alphabetic() {
        return Err(CoinError::InvalidDenom(denom.to_string()));
    }
    let valid_tail = bytes[1..]
        .iter()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'/' | b':' | b'.' | b'_' | b'-'));
    if !valid_tail {
        return Err(CoinError::InvalidDenom(denom.to_string()));
    }
    Ok(())
}

// =============================================================================
// COINS
// =============================================================================

/// A single amount of one denomination.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    /// Denomination, e.g. `ustake`.
    pub denom: String,
    /// Amount in base units. Encoded as a decimal string.
    #[serde_as(as = "DisplayFromStr")]
    pub amount: u128,
}

impl Coin {
    /// Create a new coin.
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    /// Validate denom and amount (zero is allowed for a single coin).
    pub fn validate(&self) -> Result<(), CoinError> {
        validate_denom(&self.denom)
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// A set of coins, sorted by denom.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coins(Vec<Coin>);

impl Coins {
    /// Build a coin set, sorting by denom and validating every entry.
    ///
    /// # Errors
    /// - `CoinError::InvalidDenom` for a malformed denom
    /// - `CoinError::ZeroAmount` for a zero amount
    /// - `CoinError::DuplicateDenom` when a denom appears twice
    pub fn new(mut coins: Vec<Coin>) -> Result<Self, CoinError> {
        coins.sort_by(|a, b| a.denom.cmp(&b.denom));
        let coins = Self(coins);
        coins.validate()?;
        Ok(coins)
    }

    /// An empty coin set.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Convenience constructor for a single-denom set.
    pub fn single(denom: impl Into<String>, amount: u128) -> Result<Self, CoinError> {
        Self::new(vec![Coin::new(denom, amount)])
    }

    /// Validate the sorted, unique, positive invariant.
    pub fn validate(&self) -> Result<(), CoinError> {
        for (i, coin) in self.0.iter().enumerate() {
            coin.validate()?;
            if coin.is_zero() {
                return Err(CoinError::ZeroAmount(coin.denom.clone()));
            }
            if i > 0 {
                let prev = &self.0[i - 1];
                if prev.denom == coin.denom {
                    return Err(CoinError::DuplicateDenom(coin.denom.clone()));
                }
                if prev.denom > coin.denom {
                    return Err(CoinError::Unsorted);
                }
            }
        }
        Ok(())
    }

    /// Returns true if the set holds no coins (or only zero amounts).
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(Coin::is_zero)
    }

    /// Number of denominations.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the coins in denom order.
    pub fn iter(&self) -> std::slice::Iter<'_, Coin> {
        self.0.iter()
    }

    /// Amount held for `denom`, zero when absent.
    pub fn amount_of(&self, denom: &str) -> u128 {
        self.0
            .iter()
            .find(|c| c.denom == denom)
            .map(|c| c.amount)
            .unwrap_or(0)
    }

    /// Returns true if, for any coin in `other`, this set holds at least that
    /// amount of the same denom. An empty `other` yields false.
    pub fn is_any_gte(&self, other: &Coins) -> bool {
        other
            .iter()
            .any(|required| self.amount_of(&required.denom) >= required.amount)
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join(","))
    }
}

impl<'a> IntoIterator for &'a Coins {
    type Item = &'a Coin;
    type IntoIter = std::slice::Iter<'a, Coin>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// =============================================================================
// DECIMALS
// =============================================================================

/// Fixed-point decimal with 18 fractional digits.
///
/// Used for gas prices, where sub-unit precision matters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Dec(u128);

impl Dec {
    /// Number of fractional digits.
    pub const PRECISION: u32 = 18;

    /// `10^PRECISION`.
    pub const ONE_RAW: u128 = 1_000_000_000_000_000_000;

    /// Zero.
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Construct from a raw scaled value (`raw / 10^18`).
    pub const fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    /// Construct an integer decimal.
    pub fn from_int(value: u64) -> Self {
        Self(u128::from(value) * Self::ONE_RAW)
    }

    /// The raw scaled value.
    pub const fn raw(&self) -> u128 {
        self.0
    }

    /// Returns true for zero.
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl FromStr for Dec {
    type Err = CoinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoinError::InvalidDecimal(s.to_string());
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        if int_part.is_empty() || frac_part.len() > Self::PRECISION as usize {
            return Err(invalid());
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let int: u128 = int_part.parse().map_err(|_| invalid())?;
        let mut frac: u128 = if frac_part.is_empty() {
            0
        } else {
            frac_part.parse().map_err(|_| invalid())?
        };
        frac *= 10u128.pow(Self::PRECISION - frac_part.len() as u32);

        int.checked_mul(Self::ONE_RAW)
            .and_then(|v| v.checked_add(frac))
            .map(Self)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:018}",
            self.0 / Self::ONE_RAW,
            self.0 % Self::ONE_RAW
        )
    }
}

impl Serialize for Dec {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Dec {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A decimal amount of one denomination (gas prices).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecCoin {
    /// Denomination.
    pub denom: String,
    /// Decimal amount per gas unit.
    pub amount: Dec,
}

impl DecCoin {
    /// Create a new decimal coin.
    pub fn new(denom: impl Into<String>, amount: Dec) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }
}

impl FromStr for DecCoin {
    type Err = CoinError;

    /// Parse `"0.025ustake"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let split = s
            .find(|c: char| c.is_ascii_alphabetic())
            .ok_or_else(|| CoinError::InvalidDecimal(s.to_string()))?;
        let (amount, denom) = s.split_at(split);
        validate_denom(denom)?;
        Ok(Self::new(denom, amount.trim().parse()?))
    }
}

impl fmt::Display for DecCoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

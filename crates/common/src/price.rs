//! Price values
//!
//! A price is either a limit price in integer cents or the market-price
//! sentinel ("trade at whatever the opposite side offers"). Limit prices
//! are plain `Copy` values with derived equality and hashing, so they are
//! as cheap to key a book on as the interned objects they replace.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

/// Error raised when arithmetic or ordering is attempted with a market price
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The operation is undefined for market prices
    #[error("cannot {0} a market price")]
    MarketOperand(&'static str),
}

/// A price used throughout the exchange
///
/// Negative limit values are legal; they arise from subtraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Price {
    /// A limit price, in cents
    Limit(i64),
    /// The market-price sentinel
    Market,
}

impl Price {
    /// Create a limit price from a value in cents
    pub fn limit(cents: i64) -> Self {
        Price::Limit(cents)
    }

    /// The market-price sentinel
    pub fn market() -> Self {
        Price::Market
    }

    /// Returns true if this is the market-price sentinel
    pub fn is_market(&self) -> bool {
        matches!(self, Price::Market)
    }

    /// Returns true if this is a limit price below zero
    pub fn is_negative(&self) -> bool {
        matches!(self, Price::Limit(cents) if *cents < 0)
    }

    /// The value in cents, or `None` for the market sentinel
    pub fn cents(&self) -> Option<i64> {
        match self {
            Price::Limit(cents) => Some(*cents),
            Price::Market => None,
        }
    }

    /// Add two limit prices
    pub fn add(&self, other: &Price) -> Result<Price, PriceError> {
        match (self, other) {
            (Price::Limit(a), Price::Limit(b)) => Ok(Price::Limit(a + b)),
            _ => Err(PriceError::MarketOperand("add")),
        }
    }

    /// Subtract a limit price from this one
    pub fn sub(&self, other: &Price) -> Result<Price, PriceError> {
        match (self, other) {
            (Price::Limit(a), Price::Limit(b)) => Ok(Price::Limit(a - b)),
            _ => Err(PriceError::MarketOperand("subtract")),
        }
    }

    /// Multiply a limit price by an integer factor
    pub fn mul(&self, factor: i32) -> Result<Price, PriceError> {
        match self {
            Price::Limit(cents) => Ok(Price::Limit(cents * i64::from(factor))),
            Price::Market => Err(PriceError::MarketOperand("multiply")),
        }
    }

    /// Numeric ordering among limit prices; `None` if either is market
    pub fn cmp_limits(&self, other: &Price) -> Option<Ordering> {
        match (self.cents(), other.cents()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => None,
        }
    }

    /// Strictly greater than; false whenever either side is market
    pub fn greater_than(&self, other: &Price) -> bool {
        self.cmp_limits(other) == Some(Ordering::Greater)
    }

    /// Greater than or equal; false whenever either side is market
    pub fn greater_or_equal(&self, other: &Price) -> bool {
        matches!(
            self.cmp_limits(other),
            Some(Ordering::Greater) | Some(Ordering::Equal)
        )
    }

    /// Strictly less than; false whenever either side is market
    pub fn less_than(&self, other: &Price) -> bool {
        self.cmp_limits(other) == Some(Ordering::Less)
    }

    /// Less than or equal; false whenever either side is market
    pub fn less_or_equal(&self, other: &Price) -> bool {
        matches!(
            self.cmp_limits(other),
            Some(Ordering::Less) | Some(Ordering::Equal)
        )
    }

    /// Value equality among limit prices; false whenever either side is market
    pub fn same_value(&self, other: &Price) -> bool {
        self.cmp_limits(other) == Some(Ordering::Equal)
    }
}

impl std::fmt::Display for Price {
    /// Market prices render as `MKT`; limit prices as a locale-independent
    /// currency form, `$d.dd` with negative values as `$-d.dd`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Price::Market => write!(f, "MKT"),
            Price::Limit(cents) => {
                let sign = if *cents < 0 { "-" } else { "" };
                let abs = cents.unsigned_abs();
                write!(f, "${}{}.{:02}", sign, abs / 100, abs % 100)
            }
        }
    }
}

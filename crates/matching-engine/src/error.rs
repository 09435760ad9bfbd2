//! Matching engine error types

use common::{MarketState, PriceError};
use thiserror::Error;

/// Errors that can occur inside the matching engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Empty, zero or otherwise malformed input
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Price arithmetic or ordering undefined for the operands
    #[error(transparent)]
    InvalidPriceOperation(#[from] PriceError),

    /// Quote constraints violated
    #[error("data validation failed: {0}")]
    DataValidation(String),

    /// Operation not allowed in the current market state
    #[error("invalid market state: {0}")]
    InvalidMarketState(String),

    /// Requested transition is not in the allowed cycle
    #[error("invalid market state transition from {from} to {to}")]
    InvalidMarketStateTransition { from: MarketState, to: MarketState },

    /// Product is not registered
    #[error("no such product: {0}")]
    NoSuchProduct(String),

    /// Product is already registered
    #[error("product already exists: {0}")]
    ProductAlreadyExists(String),

    /// Cancel target does not exist in the active book or the archive
    #[error("order not found: {0}")]
    OrderNotFound(String),
}

/// Result type for matching engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

//! Market data error types

use thiserror::Error;

/// Errors raised by the publishers and their subscription tables
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketDataError {
    /// The product topic is unknown to this publisher
    #[error("unknown product topic: {0}")]
    InvalidStock(String),

    /// The user is already subscribed to this product topic
    #[error("user {user} is already subscribed to {product}")]
    AlreadySubscribed { user: String, product: String },

    /// The user is not subscribed to this product topic
    #[error("user {user} is not subscribed to {product}")]
    NotSubscribed { user: String, product: String },
}

/// Result type for market data operations
pub type Result<T> = std::result::Result<T, MarketDataError>;

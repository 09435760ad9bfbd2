//! Session layer error types

use market_data::MarketDataError;
use matching_engine::EngineError;
use thiserror::Error;

/// Errors raised by the session layer or forwarded from the engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Empty or otherwise malformed input
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// The user has no active session
    #[error("user {0} is not connected")]
    UserNotConnected(String),

    /// The connection id does not match the user's session
    #[error("connection id {connection_id} does not match the session for {user}")]
    InvalidConnectionId { user: String, connection_id: u64 },

    /// The user already has an active session
    #[error("user {0} is already connected")]
    AlreadyConnected(String),

    /// Forwarded matching engine error
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Forwarded subscription error
    #[error(transparent)]
    MarketData(#[from] MarketDataError),
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

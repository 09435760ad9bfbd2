//! Shared domain types
//!
//! The BUY/SELL book side and the process-wide market lifecycle state.

use serde::{Deserialize, Serialize};

/// The side of the book an entry rests on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy side
    Buy,
    /// Sell side
    Sell,
}

impl Side {
    /// Returns the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Returns true if this is the buy side
    pub fn is_buy(&self) -> bool {
        matches!(self, Side::Buy)
    }

    /// Returns true if this is the sell side
    pub fn is_sell(&self) -> bool {
        matches!(self, Side::Sell)
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// The market lifecycle state
///
/// The market moves through a fixed cycle: CLOSED → PREOPEN → OPEN → CLOSED.
/// Every other transition is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarketState {
    /// No trading; submissions and cancels are rejected
    Closed,
    /// Orders and quotes rest without trading
    Preopen,
    /// Continuous trading
    Open,
}

impl MarketState {
    /// Returns true if the transition to `next` is in the allowed cycle
    pub fn can_transition_to(&self, next: MarketState) -> bool {
        matches!(
            (self, next),
            (MarketState::Closed, MarketState::Preopen)
                | (MarketState::Preopen, MarketState::Open)
                | (MarketState::Open, MarketState::Closed)
        )
    }
}

impl std::fmt::Display for MarketState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketState::Closed => write!(f, "CLOSED"),
            MarketState::Preopen => write!(f, "PREOPEN"),
            MarketState::Open => write!(f, "OPEN"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
        assert!(Side::Buy.is_buy());
        assert!(Side::Sell.is_sell());
    }

    #[test]
    fn test_side_display() {
        assert_eq!(Side::Buy.to_string(), "BUY");
        assert_eq!(Side::Sell.to_string(), "SELL");
    }

    #[test]
    fn test_market_state_cycle() {
        assert!(MarketState::Closed.can_transition_to(MarketState::Preopen));
        assert!(MarketState::Preopen.can_transition_to(MarketState::Open));
        assert!(MarketState::Open.can_transition_to(MarketState::Closed));
    }

    #[test]
    fn test_market_state_rejects_shortcuts() {
        assert!(!MarketState::Closed.can_transition_to(MarketState::Open));
        assert!(!MarketState::Open.can_transition_to(MarketState::Preopen));
        assert!(!MarketState::Preopen.can_transition_to(MarketState::Closed));
        assert!(!MarketState::Open.can_transition_to(MarketState::Open));
    }

    #[test]
    fn test_market_state_display() {
        assert_eq!(MarketState::Closed.to_string(), "CLOSED");
        assert_eq!(MarketState::Preopen.to_string(), "PREOPEN");
        assert_eq!(MarketState::Open.to_string(), "OPEN");
    }
}

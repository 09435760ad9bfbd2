//! Market data message types
//!
//! Immutable value records delivered to subscribers: the current-market
//! snapshot, fill and cancel receipts, and the ticker direction.

use common::{Price, Side};
use serde::{Deserialize, Serialize};

/// Best buy and sell prices and volumes for one product
///
/// A side with no resting entries is reported at $0.00 with zero volume,
/// so consumers always see a well-defined price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Product this snapshot refers to
    pub product: String,
    /// Best buy price
    pub buy_price: Price,
    /// Volume resting at the best buy price
    pub buy_volume: u32,
    /// Best sell price
    pub sell_price: Price,
    /// Volume resting at the best sell price
    pub sell_volume: u32,
}

impl std::fmt::Display for MarketSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}@{} x {}@{}",
            self.product, self.buy_volume, self.buy_price, self.sell_volume, self.sell_price
        )
    }
}

/// Receipt generated when an order or quote side trades
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillMessage {
    /// User the receipt belongs to
    pub user: String,
    /// Product that traded
    pub product: String,
    /// Effective execution price
    pub price: Price,
    /// Shares traded
    pub volume: u32,
    /// Human-readable remainder note ("leaving N")
    pub details: String,
    /// Side of the filled entry
    pub side: Side,
    /// Id of the filled entry
    pub id: String,
}

impl std::fmt::Display for FillMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "User: {}, Product: {}, Price: {}, Volume: {}, Details: {}, Side: {}",
            self.user, self.product, self.price, self.volume, self.details, self.side
        )
    }
}

/// Receipt generated when an order or quote side is cancelled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelMessage {
    /// User the receipt belongs to
    pub user: String,
    /// Product the cancelled entry was booked on
    pub product: String,
    /// Price of the cancelled entry
    pub price: Price,
    /// Shares cancelled
    pub volume: u32,
    /// Reason for the cancel
    pub details: String,
    /// Side of the cancelled entry
    pub side: Side,
    /// Id of the cancelled entry
    pub id: String,
}

impl std::fmt::Display for CancelMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "User: {}, Product: {}, Price: {}, Volume: {}, Details: {}, Side: {}",
            self.user, self.product, self.price, self.volume, self.details, self.side
        )
    }
}

/// Direction of a ticker price relative to the previous publication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Price moved up since the last publication
    Up,
    /// Price moved down since the last publication
    Down,
    /// Price is unchanged
    Unchanged,
    /// First publication for this product
    First,
}

impl Direction {
    /// The single-character ticker arrow
    pub fn as_char(&self) -> char {
        match self {
            Direction::Up => '\u{2191}',
            Direction::Down => '\u{2193}',
            Direction::Unchanged => '=',
            Direction::First => ' ',
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

//! Tradable entries
//!
//! An order or one side of a quote, as booked by the engine. Identity is
//! immutable after construction; only the volume accounting mutates, and
//! always under the invariant
//! `remaining + cancelled + traded == original`.

use crate::error::{EngineError, Result};
use common::{Price, Side};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide sequence feeding entry id generation
static ENTRY_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_entry_id(user: &str, product: &str, price: &Price) -> String {
    let seq = ENTRY_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{user}{product}{price}#{seq}")
}

/// Whether an entry is a standalone order or one side of a quote
///
/// Matching treats both identically; the tag decides whether cancellation
/// goes by id (orders) or by user (quote sides).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradableKind {
    /// A standalone buy or sell order
    Order,
    /// One side of a two-sided quote
    QuoteSide,
}

/// A buy or sell intent booked against a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tradable {
    id: String,
    user: String,
    product: String,
    price: Price,
    side: Side,
    kind: TradableKind,
    original_volume: u32,
    remaining_volume: u32,
    cancelled_volume: u32,
}

impl Tradable {
    /// Create a standalone order
    ///
    /// The id is synthesized from user, product, price and a process-wide
    /// monotonic sequence, so it is unique for the process lifetime.
    pub fn order(
        user: impl Into<String>,
        product: impl Into<String>,
        price: Price,
        volume: u32,
        side: Side,
    ) -> Result<Self> {
        Self::new(user.into(), product.into(), price, volume, side, TradableKind::Order)
    }

    /// Create one side of a quote
    pub fn quote_side(
        user: impl Into<String>,
        product: impl Into<String>,
        price: Price,
        volume: u32,
        side: Side,
    ) -> Result<Self> {
        Self::new(
            user.into(),
            product.into(),
            price,
            volume,
            side,
            TradableKind::QuoteSide,
        )
    }

    fn new(
        user: String,
        product: String,
        price: Price,
        volume: u32,
        side: Side,
        kind: TradableKind,
    ) -> Result<Self> {
        if user.is_empty() {
            return Err(EngineError::InvalidData("user cannot be empty".to_string()));
        }
        if product.is_empty() {
            return Err(EngineError::InvalidData("product cannot be empty".to_string()));
        }
        if volume == 0 {
            return Err(EngineError::InvalidData(format!(
                "original volume must be positive, got {volume}"
            )));
        }
        if let Some(cents) = price.cents() {
            if cents <= 0 {
                return Err(EngineError::InvalidData(format!(
                    "limit price must be positive, got {price}"
                )));
            }
        }
        let id = next_entry_id(&user, &product, &price);
        Ok(Self {
            id,
            user,
            product,
            price,
            side,
            kind,
            original_volume: volume,
            remaining_volume: volume,
            cancelled_volume: 0,
        })
    }

    /// The entry's process-unique id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The user who submitted the entry
    pub fn user(&self) -> &str {
        &self.user
    }

    /// The product the entry is booked on
    pub fn product(&self) -> &str {
        &self.product
    }

    /// The entry's price
    pub fn price(&self) -> Price {
        self.price
    }

    /// The entry's book side
    pub fn side(&self) -> Side {
        self.side
    }

    /// Returns true if the entry is one side of a quote
    pub fn is_quote(&self) -> bool {
        matches!(self.kind, TradableKind::QuoteSide)
    }

    /// The volume the entry was submitted with
    pub fn original_volume(&self) -> u32 {
        self.original_volume
    }

    /// The volume still available to trade
    pub fn remaining_volume(&self) -> u32 {
        self.remaining_volume
    }

    /// The volume cancelled so far
    pub fn cancelled_volume(&self) -> u32 {
        self.cancelled_volume
    }

    /// The volume traded so far
    pub fn traded_volume(&self) -> u32 {
        self.original_volume - self.remaining_volume - self.cancelled_volume
    }

    /// Set the remaining volume
    ///
    /// Fails when the new value plus the cancelled volume would exceed the
    /// original volume.
    pub fn set_remaining_volume(&mut self, volume: u32) -> Result<()> {
        if volume + self.cancelled_volume > self.original_volume {
            return Err(EngineError::InvalidData(format!(
                "remaining volume {volume} plus cancelled volume {} would exceed original volume {}",
                self.cancelled_volume, self.original_volume
            )));
        }
        self.remaining_volume = volume;
        Ok(())
    }

    /// Set the cancelled volume
    ///
    /// Fails when the new value plus the current cancelled volume would
    /// exceed the original volume.
    pub fn set_cancelled_volume(&mut self, volume: u32) -> Result<()> {
        if volume + self.cancelled_volume > self.original_volume {
            return Err(EngineError::InvalidData(format!(
                "requested cancelled volume {volume} plus cancelled volume {} would exceed original volume {}",
                self.cancelled_volume, self.original_volume
            )));
        }
        self.cancelled_volume = volume;
        Ok(())
    }

    /// A snapshot of the entry's current state
    pub fn snapshot(&self) -> TradableSnapshot {
        TradableSnapshot {
            product: self.product.clone(),
            price: self.price,
            original_volume: self.original_volume,
            remaining_volume: self.remaining_volume,
            cancelled_volume: self.cancelled_volume,
            user: self.user.clone(),
            side: self.side,
            is_quote: self.is_quote(),
            id: self.id.clone(),
        }
    }
}

impl std::fmt::Display for Tradable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} {} at {} (original {}, cancelled {}) [{}]",
            self.user,
            self.side,
            self.remaining_volume,
            self.product,
            self.price,
            self.original_volume,
            self.cancelled_volume,
            self.id
        )
    }
}

/// A two-sided liquidity posting: one BUY and one SELL side built
/// atomically for a single user and product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    user: String,
    product: String,
    buy: Tradable,
    sell: Tradable,
}

impl Quote {
    /// Build a quote, validating the price and volume constraints
    ///
    /// The sell price must be strictly above the buy price, both prices
    /// must be above $0.00 and both volumes positive; violations fail
    /// with `DataValidation`.
    pub fn new(
        user: impl Into<String>,
        product: impl Into<String>,
        buy_price: Price,
        buy_volume: u32,
        sell_price: Price,
        sell_volume: u32,
    ) -> Result<Self> {
        let user = user.into();
        let product = product.into();
        if sell_price.less_or_equal(&buy_price) {
            return Err(EngineError::DataValidation(format!(
                "sell price {sell_price} cannot be less than or equal to buy price {buy_price}"
            )));
        }
        let zero = Price::limit(0);
        if buy_price.less_or_equal(&zero) || sell_price.less_or_equal(&zero) {
            return Err(EngineError::DataValidation(format!(
                "quote prices must be above $0.00, got buy {buy_price} and sell {sell_price}"
            )));
        }
        if buy_volume == 0 || sell_volume == 0 {
            return Err(EngineError::DataValidation(format!(
                "quote volumes must be positive, got buy {buy_volume} and sell {sell_volume}"
            )));
        }
        let buy = Tradable::quote_side(user.clone(), product.clone(), buy_price, buy_volume, Side::Buy)?;
        let sell =
            Tradable::quote_side(user.clone(), product.clone(), sell_price, sell_volume, Side::Sell)?;
        Ok(Self {
            user,
            product,
            buy,
            sell,
        })
    }

    /// The quoting user
    pub fn user(&self) -> &str {
        &self.user
    }

    /// The quoted product
    pub fn product(&self) -> &str {
        &self.product
    }

    /// Consume the quote into its BUY and SELL sides
    pub fn into_sides(self) -> (Tradable, Tradable) {
        (self.buy, self.sell)
    }
}

/// Immutable view of a tradable entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradableSnapshot {
    pub product: String,
    pub price: Price,
    pub original_volume: u32,
    pub remaining_volume: u32,
    pub cancelled_volume: u32,
    pub user: String,
    pub side: Side,
    pub is_quote: bool,
    pub id: String,
}

impl std::fmt::Display for TradableSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Product: {}, Price: {}, OriginalVolume: {}, RemainingVolume: {}, CancelledVolume: {}, User: {}, Side: {}, IsQuote: {}, Id: {}",
            self.product,
            self.price,
            self.original_volume,
            self.remaining_volume,
            self.cancelled_volume,
            self.user,
            self.side,
            self.is_quote,
            self.id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_construction() {
        let order = Tradable::order("REX", "IBM", Price::limit(1000), 100, Side::Buy).unwrap();
        assert_eq!(order.user(), "REX");
        assert_eq!(order.product(), "IBM");
        assert_eq!(order.original_volume(), 100);
        assert_eq!(order.remaining_volume(), 100);
        assert_eq!(order.cancelled_volume(), 0);
        assert_eq!(order.traded_volume(), 0);
        assert!(!order.is_quote());
    }

    #[test]
    fn test_order_ids_are_unique() {
        let a = Tradable::order("REX", "IBM", Price::limit(1000), 100, Side::Buy).unwrap();
        let b = Tradable::order("REX", "IBM", Price::limit(1000), 100, Side::Buy).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_order_rejects_bad_input() {
        assert!(Tradable::order("", "IBM", Price::limit(1000), 100, Side::Buy).is_err());
        assert!(Tradable::order("REX", "", Price::limit(1000), 100, Side::Buy).is_err());
        assert!(Tradable::order("REX", "IBM", Price::limit(1000), 0, Side::Buy).is_err());
        assert!(Tradable::order("REX", "IBM", Price::limit(0), 100, Side::Buy).is_err());
        assert!(Tradable::order("REX", "IBM", Price::limit(-100), 100, Side::Buy).is_err());
    }

    #[test]
    fn test_market_priced_order_is_legal() {
        let order = Tradable::order("REX", "IBM", Price::market(), 100, Side::Buy).unwrap();
        assert!(order.price().is_market());
    }

    #[test]
    fn test_volume_accounting_invariant() {
        let mut order = Tradable::order("REX", "IBM", Price::limit(1000), 100, Side::Buy).unwrap();
        order.set_remaining_volume(40).unwrap();
        assert_eq!(order.traded_volume(), 60);

        order.set_cancelled_volume(40).unwrap();
        order.set_remaining_volume(0).unwrap();
        assert_eq!(order.traded_volume(), 60);
        assert_eq!(
            order.remaining_volume() + order.cancelled_volume() + order.traded_volume(),
            order.original_volume()
        );
    }

    #[test]
    fn test_volume_setters_reject_overflow() {
        let mut order = Tradable::order("REX", "IBM", Price::limit(1000), 100, Side::Buy).unwrap();
        order.set_cancelled_volume(60).unwrap();
        assert!(order.set_remaining_volume(50).is_err());
        assert!(order.set_cancelled_volume(50).is_err());
    }

    #[test]
    fn test_quote_builds_both_sides() {
        let quote = Quote::new("REX", "IBM", Price::limit(1000), 100, Price::limit(1010), 100).unwrap();
        let (buy, sell) = quote.into_sides();
        assert_eq!(buy.side(), Side::Buy);
        assert_eq!(sell.side(), Side::Sell);
        assert!(buy.is_quote());
        assert!(sell.is_quote());
        assert_ne!(buy.id(), sell.id());
    }

    #[test]
    fn test_quote_rejects_crossed_prices() {
        let err = Quote::new("REX", "IBM", Price::limit(1010), 100, Price::limit(1000), 100)
            .unwrap_err();
        assert!(matches!(err, EngineError::DataValidation(_)));

        let err = Quote::new("REX", "IBM", Price::limit(1010), 100, Price::limit(1010), 100)
            .unwrap_err();
        assert!(matches!(err, EngineError::DataValidation(_)));
    }

    #[test]
    fn test_quote_rejects_non_positive_prices_and_volumes() {
        assert!(Quote::new("REX", "IBM", Price::limit(0), 100, Price::limit(1010), 100).is_err());
        assert!(Quote::new("REX", "IBM", Price::limit(1000), 0, Price::limit(1010), 100).is_err());
        assert!(Quote::new("REX", "IBM", Price::limit(1000), 100, Price::limit(1010), 0).is_err());
    }
}

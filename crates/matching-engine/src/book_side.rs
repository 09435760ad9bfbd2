//! One side of a product book
//!
//! Price-keyed FIFO queues plus the price-time matcher that executes an
//! aggressor against them. A price key is present exactly while its queue
//! is non-empty. The matcher only mutates this side; consumed entries are
//! handed back to the product book for archiving.

use crate::domain::{Tradable, TradableSnapshot};
use crate::error::Result;
use common::{Price, Side};
use market_data::{CancelMessage, FillMessage};
use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// Merge key for the outgoing fill stream: counterparty user, entry id
/// and effective price
type FillKey = (String, String, Price);

/// Result of running an aggressor against one side of the book
#[derive(Debug, Default)]
pub struct TradeOutcome {
    /// Merged fill stream for both parties of every execution
    pub fills: Vec<FillMessage>,
    /// Resting entries consumed out of this side
    pub archived: Vec<Tradable>,
    /// True when the aggressor was exhausted against a larger resting
    /// entry and should itself be archived
    pub archive_aggressor: bool,
}

/// The BUY or SELL half of one product's book
pub struct BookSide {
    side: Side,
    entries: HashMap<Price, VecDeque<Tradable>>,
}

impl BookSide {
    /// Create an empty book side
    pub fn new(side: Side) -> Self {
        Self {
            side,
            entries: HashMap::new(),
        }
    }

    /// The side of the book this half represents
    pub fn side(&self) -> Side {
        self.side
    }

    /// Returns true when no entries rest on this side
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an entry to the queue at its price, without trading
    pub fn add_entry(&mut self, entry: Tradable) {
        self.entries
            .entry(entry.price())
            .or_default()
            .push_back(entry);
    }

    /// Best-first ordering of two prices on this side
    ///
    /// The market sentinel outranks every limit; limits order descending
    /// on the BUY side and ascending on the SELL side.
    fn rank(&self, a: &Price, b: &Price) -> Ordering {
        match (a, b) {
            (Price::Market, Price::Market) => Ordering::Equal,
            (Price::Market, _) => Ordering::Less,
            (_, Price::Market) => Ordering::Greater,
            (Price::Limit(x), Price::Limit(y)) => match self.side {
                Side::Buy => y.cmp(x),
                Side::Sell => x.cmp(y),
            },
        }
    }

    /// Price keys in best-first order
    fn sorted_prices(&self) -> Vec<Price> {
        let mut prices: Vec<Price> = self.entries.keys().copied().collect();
        prices.sort_by(|a, b| self.rank(a, b));
        prices
    }

    /// The best price on this side, if any
    pub fn top_of_book_price(&self) -> Option<Price> {
        self.entries
            .keys()
            .min_by(|a, b| self.rank(a, b))
            .copied()
    }

    /// Total remaining volume resting at the best price
    pub fn top_of_book_volume(&self) -> u32 {
        self.top_of_book_price()
            .and_then(|top| self.entries.get(&top))
            .map(|queue| queue.iter().map(Tradable::remaining_volume).sum())
            .unwrap_or(0)
    }

    /// Remove and return the queue at a price, leaving the key absent
    pub(crate) fn take_queue(&mut self, price: &Price) -> VecDeque<Tradable> {
        self.entries.remove(price).unwrap_or_default()
    }

    /// True while the top of this side is marketable for the aggressor
    fn crosses(&self, aggressor: &Tradable) -> bool {
        let Some(top) = self.top_of_book_price() else {
            return false;
        };
        if aggressor.price().is_market() || top.is_market() {
            return true;
        }
        match self.side {
            // A SELL aggressor hits the BUY side at or below the top bid.
            Side::Buy => aggressor.price().less_or_equal(&top),
            // A BUY aggressor hits the SELL side at or above the top offer.
            Side::Sell => aggressor.price().greater_or_equal(&top),
        }
    }

    /// Run the aggressor against this side using price-time priority
    ///
    /// Executes one pass per marketable top-of-book price until the
    /// aggressor is exhausted or the top is no longer marketable.
    /// `fallback_price` resolves the effective price when both parties
    /// are market-priced, which can only happen during the opening cross.
    pub fn try_trade(
        &mut self,
        aggressor: &mut Tradable,
        fallback_price: Price,
    ) -> Result<TradeOutcome> {
        let mut fills: HashMap<FillKey, FillMessage> = HashMap::new();
        let mut outcome = TradeOutcome::default();
        while aggressor.remaining_volume() > 0 && self.crosses(aggressor) {
            let spent = self.trade_at_top(aggressor, fallback_price, &mut fills, &mut outcome.archived)?;
            outcome.archive_aggressor |= spent;
        }
        outcome.fills = fills.into_values().collect();
        Ok(outcome)
    }

    /// One pass across the FIFO queue at the current top of book
    ///
    /// Returns true when the aggressor was consumed by a larger resting
    /// entry.
    fn trade_at_top(
        &mut self,
        aggressor: &mut Tradable,
        fallback_price: Price,
        fills: &mut HashMap<FillKey, FillMessage>,
        archived: &mut Vec<Tradable>,
    ) -> Result<bool> {
        let Some(top) = self.top_of_book_price() else {
            return Ok(false);
        };
        let Some(queue) = self.entries.get_mut(&top) else {
            return Ok(false);
        };
        let mut aggressor_spent = false;
        while let Some(rest) = queue.front_mut() {
            if aggressor.remaining_volume() == 0 {
                break;
            }
            let effective = if rest.price().is_market() {
                if aggressor.price().is_market() {
                    fallback_price
                } else {
                    aggressor.price()
                }
            } else {
                rest.price()
            };
            if aggressor.remaining_volume() >= rest.remaining_volume() {
                // The resting entry is consumed whole.
                let volume = rest.remaining_volume();
                let left = aggressor.remaining_volume() - volume;
                debug!(price = %effective, volume, rest = %rest.id(), aggressor = %aggressor.id(), "trade");
                merge_fill(fills, make_fill(rest, effective, volume, "leaving 0".to_string()));
                merge_fill(
                    fills,
                    make_fill(aggressor, effective, volume, format!("leaving {left}")),
                );
                aggressor.set_remaining_volume(left)?;
                rest.set_remaining_volume(0)?;
                if let Some(done) = queue.pop_front() {
                    archived.push(done);
                }
            } else {
                // The aggressor is consumed whole; the resting entry stays.
                let volume = aggressor.remaining_volume();
                let remainder = rest.remaining_volume() - volume;
                debug!(price = %effective, volume, rest = %rest.id(), aggressor = %aggressor.id(), "trade");
                merge_fill(
                    fills,
                    make_fill(rest, effective, volume, format!("leaving {remainder}")),
                );
                merge_fill(
                    fills,
                    make_fill(aggressor, effective, volume, "leaving 0".to_string()),
                );
                rest.set_remaining_volume(remainder)?;
                aggressor.set_remaining_volume(0)?;
                aggressor_spent = true;
                break;
            }
        }
        if queue.is_empty() {
            self.entries.remove(&top);
        }
        Ok(aggressor_spent)
    }

    /// Cancel the non-quote entry with the given id
    ///
    /// Returns the cancel receipt and the removed entry, or `None` when no
    /// active order matches (the product book then consults its archive).
    pub fn cancel_order(&mut self, order_id: &str) -> Option<(CancelMessage, Tradable)> {
        let prices: Vec<Price> = self.entries.keys().copied().collect();
        for price in prices {
            let Some(queue) = self.entries.get_mut(&price) else {
                continue;
            };
            if let Some(pos) = queue
                .iter()
                .position(|entry| entry.id() == order_id && !entry.is_quote())
            {
                let entry = queue.remove(pos)?;
                if queue.is_empty() {
                    self.entries.remove(&price);
                }
                let message = cancel_message(&entry, format!("{} Order Cancelled", entry.side()));
                return Some((message, entry));
            }
        }
        None
    }

    /// Remove the user's quote side from the book without a receipt
    ///
    /// Used by quote replacement; at most one quote side per user rests on
    /// a side.
    pub fn remove_quote(&mut self, user: &str) -> Option<Tradable> {
        let prices: Vec<Price> = self.entries.keys().copied().collect();
        for price in prices {
            let Some(queue) = self.entries.get_mut(&price) else {
                continue;
            };
            if let Some(pos) = queue
                .iter()
                .position(|entry| entry.is_quote() && entry.user() == user)
            {
                let entry = queue.remove(pos)?;
                if queue.is_empty() {
                    self.entries.remove(&price);
                }
                return Some(entry);
            }
        }
        None
    }

    /// Cancel the user's quote side, producing a receipt
    ///
    /// Silent no-op when the user has no quote side resting here.
    pub fn cancel_quote(&mut self, user: &str) -> Option<(CancelMessage, Tradable)> {
        let entry = self.remove_quote(user)?;
        let message = cancel_message(&entry, format!("Quote {}-Side Cancelled", entry.side()));
        Some((message, entry))
    }

    /// Cancel every entry on this side, quote sides by user and orders by
    /// id
    pub fn cancel_all(&mut self) -> Vec<(CancelMessage, Tradable)> {
        // Collect targets first; cancelling mutates the queues.
        let mut targets: Vec<(bool, String)> = Vec::new();
        for queue in self.entries.values() {
            for entry in queue {
                let key = if entry.is_quote() {
                    entry.user().to_string()
                } else {
                    entry.id().to_string()
                };
                targets.push((entry.is_quote(), key));
            }
        }
        let mut cancelled = Vec::new();
        for (is_quote, key) in targets {
            let result = if is_quote {
                self.cancel_quote(&key)
            } else {
                self.cancel_order(&key)
            };
            if let Some(pair) = result {
                cancelled.push(pair);
            }
        }
        cancelled
    }

    /// One `"<price> x <volume>"` line per price level, best first
    pub fn book_depth(&self) -> Vec<String> {
        if self.is_empty() {
            return vec!["<Empty>".to_string()];
        }
        self.sorted_prices()
            .into_iter()
            .map(|price| {
                let volume: u32 = self
                    .entries
                    .get(&price)
                    .map(|queue| queue.iter().map(Tradable::remaining_volume).sum())
                    .unwrap_or(0);
                format!("{price} x {volume}")
            })
            .collect()
    }

    /// Snapshots of the user's unfilled entries in best-first order
    pub fn orders_with_remaining_qty(&self, user: &str) -> Vec<TradableSnapshot> {
        let mut snapshots = Vec::new();
        for price in self.sorted_prices() {
            if let Some(queue) = self.entries.get(&price) {
                for entry in queue {
                    if entry.user() == user && entry.remaining_volume() > 0 {
                        snapshots.push(entry.snapshot());
                    }
                }
            }
        }
        snapshots
    }
}

fn make_fill(entry: &Tradable, price: Price, volume: u32, details: String) -> FillMessage {
    FillMessage {
        user: entry.user().to_string(),
        product: entry.product().to_string(),
        price,
        volume,
        details,
        side: entry.side(),
        id: entry.id().to_string(),
    }
}

fn cancel_message(entry: &Tradable, details: String) -> CancelMessage {
    CancelMessage {
        user: entry.user().to_string(),
        product: entry.product().to_string(),
        price: entry.price(),
        volume: entry.remaining_volume(),
        details,
        side: entry.side(),
        id: entry.id().to_string(),
    }
}

/// Accumulate a fill into the merged stream: volumes add up, details
/// follow the latest execution
fn merge_fill(fills: &mut HashMap<FillKey, FillMessage>, fill: FillMessage) {
    let key = (fill.user.clone(), fill.id.clone(), fill.price);
    match fills.entry(key) {
        std::collections::hash_map::Entry::Occupied(mut existing) => {
            let merged = existing.get_mut();
            merged.volume += fill.volume;
            merged.details = fill.details;
        }
        std::collections::hash_map::Entry::Vacant(slot) => {
            slot.insert(fill);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(user: &str, price: Price, volume: u32, side: Side) -> Tradable {
        Tradable::order(user, "IBM", price, volume, side).unwrap()
    }

    fn sell_side_with(entries: Vec<Tradable>) -> BookSide {
        let mut side = BookSide::new(Side::Sell);
        for entry in entries {
            side.add_entry(entry);
        }
        side
    }

    #[test]
    fn test_empty_side() {
        let side = BookSide::new(Side::Buy);
        assert!(side.is_empty());
        assert_eq!(side.top_of_book_price(), None);
        assert_eq!(side.top_of_book_volume(), 0);
        assert_eq!(side.book_depth(), vec!["<Empty>".to_string()]);
    }

    #[test]
    fn test_buy_side_orders_descending() {
        let mut side = BookSide::new(Side::Buy);
        side.add_entry(order("A", Price::limit(1000), 10, Side::Buy));
        side.add_entry(order("B", Price::limit(1010), 10, Side::Buy));
        side.add_entry(order("C", Price::limit(990), 10, Side::Buy));

        assert_eq!(side.top_of_book_price(), Some(Price::limit(1010)));
        assert_eq!(
            side.book_depth(),
            vec!["$10.10 x 10", "$10.00 x 10", "$9.90 x 10"]
        );
    }

    #[test]
    fn test_sell_side_orders_ascending() {
        let side = sell_side_with(vec![
            order("A", Price::limit(1000), 10, Side::Sell),
            order("B", Price::limit(1010), 10, Side::Sell),
        ]);
        assert_eq!(side.top_of_book_price(), Some(Price::limit(1000)));
        assert_eq!(side.book_depth(), vec!["$10.00 x 10", "$10.10 x 10"]);
    }

    #[test]
    fn test_market_price_is_best_on_both_sides() {
        let mut buy = BookSide::new(Side::Buy);
        buy.add_entry(order("A", Price::limit(1000), 10, Side::Buy));
        buy.add_entry(order("B", Price::market(), 10, Side::Buy));
        assert_eq!(buy.top_of_book_price(), Some(Price::market()));

        let mut sell = BookSide::new(Side::Sell);
        sell.add_entry(order("A", Price::limit(1000), 10, Side::Sell));
        sell.add_entry(order("B", Price::market(), 10, Side::Sell));
        assert_eq!(sell.top_of_book_price(), Some(Price::market()));
    }

    #[test]
    fn test_top_of_book_volume_sums_the_level() {
        let side = sell_side_with(vec![
            order("A", Price::limit(1000), 30, Side::Sell),
            order("B", Price::limit(1000), 40, Side::Sell),
            order("C", Price::limit(1010), 50, Side::Sell),
        ]);
        assert_eq!(side.top_of_book_volume(), 70);
    }

    #[test]
    fn test_try_trade_consumes_resting_entry() {
        let mut side = sell_side_with(vec![order("A", Price::limit(1010), 100, Side::Sell)]);
        let mut aggressor = order("B", Price::limit(1010), 60, Side::Buy);

        let outcome = side.try_trade(&mut aggressor, Price::limit(0)).unwrap();

        assert_eq!(aggressor.remaining_volume(), 0);
        assert!(outcome.archive_aggressor);
        assert!(outcome.archived.is_empty());
        assert_eq!(side.top_of_book_volume(), 40);

        let mut details: Vec<(String, String)> = outcome
            .fills
            .iter()
            .map(|fill| (fill.user.clone(), fill.details.clone()))
            .collect();
        details.sort();
        assert_eq!(
            details,
            vec![
                ("A".to_string(), "leaving 40".to_string()),
                ("B".to_string(), "leaving 0".to_string()),
            ]
        );
        for fill in &outcome.fills {
            assert_eq!(fill.price, Price::limit(1010));
            assert_eq!(fill.volume, 60);
        }
    }

    #[test]
    fn test_try_trade_walks_price_levels_best_first() {
        let cheap = order("A", Price::limit(995), 50, Side::Sell);
        let cheap_id = cheap.id().to_string();
        let dear = order("B", Price::limit(1000), 50, Side::Sell);
        let mut side = sell_side_with(vec![dear, cheap]);

        let mut aggressor = order("C", Price::limit(1000), 60, Side::Buy);
        let outcome = side.try_trade(&mut aggressor, Price::limit(0)).unwrap();

        // The $9.95 offer trades first and in full, then $10.00 partially.
        assert_eq!(outcome.archived.len(), 1);
        assert_eq!(outcome.archived[0].id(), cheap_id);
        assert_eq!(aggressor.remaining_volume(), 0);
        assert_eq!(side.top_of_book_price(), Some(Price::limit(1000)));
        assert_eq!(side.top_of_book_volume(), 40);
    }

    #[test]
    fn test_fifo_within_a_price_level() {
        let first = order("A", Price::limit(1000), 30, Side::Sell);
        let first_id = first.id().to_string();
        let second = order("B", Price::limit(1000), 30, Side::Sell);
        let mut side = sell_side_with(vec![first, second]);

        let mut aggressor = order("C", Price::limit(1000), 30, Side::Buy);
        let outcome = side.try_trade(&mut aggressor, Price::limit(0)).unwrap();

        assert_eq!(outcome.archived.len(), 1);
        assert_eq!(outcome.archived[0].id(), first_id);
        assert_eq!(side.top_of_book_volume(), 30);
    }

    #[test]
    fn test_aggressor_fills_merge_across_rest_entries() {
        let mut side = sell_side_with(vec![
            order("A", Price::limit(1000), 30, Side::Sell),
            order("B", Price::limit(1000), 40, Side::Sell),
        ]);
        let mut aggressor = order("C", Price::limit(1000), 70, Side::Buy);

        let outcome = side.try_trade(&mut aggressor, Price::limit(0)).unwrap();

        let own: Vec<&FillMessage> = outcome.fills.iter().filter(|f| f.user == "C").collect();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].volume, 70);
        assert_eq!(own[0].details, "leaving 0");
        assert_eq!(outcome.fills.len(), 3);
        assert!(side.is_empty());
        assert_eq!(outcome.archived.len(), 2);
    }

    #[test]
    fn test_non_marketable_aggressor_does_not_trade() {
        let mut side = sell_side_with(vec![order("A", Price::limit(1010), 100, Side::Sell)]);
        let mut aggressor = order("B", Price::limit(1000), 60, Side::Buy);

        let outcome = side.try_trade(&mut aggressor, Price::limit(0)).unwrap();

        assert!(outcome.fills.is_empty());
        assert_eq!(aggressor.remaining_volume(), 60);
        assert_eq!(side.top_of_book_volume(), 100);
    }

    #[test]
    fn test_market_aggressor_trades_at_rest_price() {
        let mut side = sell_side_with(vec![order("A", Price::limit(80000), 50, Side::Sell)]);
        let mut aggressor = order("B", Price::market(), 200, Side::Buy);

        let outcome = side.try_trade(&mut aggressor, Price::limit(0)).unwrap();

        assert_eq!(aggressor.remaining_volume(), 150);
        assert!(side.is_empty());
        for fill in &outcome.fills {
            assert_eq!(fill.price, Price::limit(80000));
        }
    }

    #[test]
    fn test_market_rest_trades_at_aggressor_price() {
        let mut side = sell_side_with(vec![order("A", Price::market(), 50, Side::Sell)]);
        let mut aggressor = order("B", Price::limit(1000), 50, Side::Buy);

        let outcome = side.try_trade(&mut aggressor, Price::limit(0)).unwrap();
        for fill in &outcome.fills {
            assert_eq!(fill.price, Price::limit(1000));
        }
    }

    #[test]
    fn test_market_against_market_uses_fallback() {
        let mut side = sell_side_with(vec![order("A", Price::market(), 50, Side::Sell)]);
        let mut aggressor = order("B", Price::market(), 50, Side::Buy);

        let outcome = side.try_trade(&mut aggressor, Price::limit(990)).unwrap();
        for fill in &outcome.fills {
            assert_eq!(fill.price, Price::limit(990));
        }
    }

    #[test]
    fn test_cancel_order_produces_receipt() {
        let entry = order("A", Price::limit(1000), 100, Side::Sell);
        let id = entry.id().to_string();
        let mut side = sell_side_with(vec![entry]);

        let (message, removed) = side.cancel_order(&id).unwrap();
        assert_eq!(message.details, "SELL Order Cancelled");
        assert_eq!(message.volume, 100);
        assert_eq!(removed.id(), id);
        assert!(side.is_empty());
    }

    #[test]
    fn test_cancel_order_misses_unknown_id_and_quotes() {
        let quote_side =
            Tradable::quote_side("A", "IBM", Price::limit(1000), 100, Side::Sell).unwrap();
        let quote_id = quote_side.id().to_string();
        let mut side = sell_side_with(vec![quote_side]);

        assert!(side.cancel_order("nope").is_none());
        // Quote sides are not cancellable by id.
        assert!(side.cancel_order(&quote_id).is_none());
        assert!(!side.is_empty());
    }

    #[test]
    fn test_cancel_quote_by_user() {
        let quote_side =
            Tradable::quote_side("A", "IBM", Price::limit(1000), 100, Side::Sell).unwrap();
        let mut side = sell_side_with(vec![quote_side]);

        let (message, _) = side.cancel_quote("A").unwrap();
        assert_eq!(message.details, "Quote SELL-Side Cancelled");
        assert!(side.is_empty());
        assert!(side.cancel_quote("A").is_none());
    }

    #[test]
    fn test_cancel_all_empties_the_side() {
        let mut side = sell_side_with(vec![
            order("A", Price::limit(1000), 10, Side::Sell),
            order("B", Price::limit(1010), 20, Side::Sell),
            Tradable::quote_side("C", "IBM", Price::limit(1020), 30, Side::Sell).unwrap(),
        ]);

        let cancelled = side.cancel_all();
        assert_eq!(cancelled.len(), 3);
        assert!(side.is_empty());
    }

    #[test]
    fn test_orders_with_remaining_qty_filters_by_user() {
        let mut side = BookSide::new(Side::Buy);
        side.add_entry(order("A", Price::limit(1000), 10, Side::Buy));
        side.add_entry(order("B", Price::limit(1010), 20, Side::Buy));
        side.add_entry(order("A", Price::limit(1020), 30, Side::Buy));

        let snapshots = side.orders_with_remaining_qty("A");
        assert_eq!(snapshots.len(), 2);
        // Best-first order for the BUY side.
        assert_eq!(snapshots[0].price, Price::limit(1020));
        assert_eq!(snapshots[1].price, Price::limit(1000));
    }
}

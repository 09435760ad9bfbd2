//! Product book
//!
//! Couples the BUY and SELL sides of one product, runs the opening cross,
//! enforces quote replacement semantics, archives finished entries and
//! derives the current market. Every effect of matching is translated
//! here into events on the hub.

use crate::book_side::BookSide;
use crate::config::EngineConfig;
use crate::domain::{Quote, Tradable, TradableSnapshot};
use crate::error::{EngineError, Result};
use common::{MarketState, Price, Side};
use market_data::{CancelMessage, EventHub, FillMessage, MarketSnapshot};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info};

/// The two-sided book for one product
pub struct ProductBook {
    product: String,
    buy_side: BookSide,
    sell_side: BookSide,
    /// Users with an active quote on this product
    user_quotes: HashSet<String>,
    /// Fully traded or fully cancelled entries, kept for late-cancel
    /// diagnosis
    old_entries: HashMap<Price, Vec<Tradable>>,
    /// Fingerprint of the last published current market
    latest_market_fingerprint: String,
    /// Price of the most recent sale, used to resolve market-vs-market
    /// executions during the opening cross
    last_sale_price: Option<Price>,
    hub: Arc<EventHub>,
    config: EngineConfig,
}

impl ProductBook {
    /// Create an empty book for a product
    pub fn new(product: impl Into<String>, hub: Arc<EventHub>, config: EngineConfig) -> Result<Self> {
        let product = product.into();
        if product.is_empty() {
            return Err(EngineError::InvalidData("product cannot be empty".to_string()));
        }
        Ok(Self {
            product,
            buy_side: BookSide::new(Side::Buy),
            sell_side: BookSide::new(Side::Sell),
            user_quotes: HashSet::new(),
            old_entries: HashMap::new(),
            latest_market_fingerprint: String::new(),
            last_sale_price: None,
            hub,
            config,
        })
    }

    /// The product this book maintains
    pub fn product(&self) -> &str {
        &self.product
    }

    /// Returns true when neither side has resting entries
    pub fn is_empty(&self) -> bool {
        self.buy_side.is_empty() && self.sell_side.is_empty()
    }

    /// Returns true when the archive holds an entry with the given id
    pub fn has_archived(&self, order_id: &str) -> bool {
        self.old_entries
            .values()
            .any(|entries| entries.iter().any(|entry| entry.id() == order_id))
    }

    /// Book an order: rest it in PREOPEN, match then rest in OPEN
    pub fn add_order(&mut self, order: Tradable, state: MarketState) -> Result<()> {
        self.add_tradable(order, state)?;
        self.update_current_market();
        Ok(())
    }

    /// Book a quote, replacing the user's previous quote if one is active
    pub fn add_quote(&mut self, quote: Quote, state: MarketState) -> Result<()> {
        let user = quote.user().to_string();
        if self.user_quotes.contains(&user) {
            self.remove_user_quote(&user)?;
            self.update_current_market();
        }
        let (buy, sell) = quote.into_sides();
        self.add_tradable(buy, state)?;
        self.add_tradable(sell, state)?;
        self.user_quotes.insert(user);
        self.update_current_market();
        Ok(())
    }

    /// Remove both sides of a user's quote ahead of a replacement
    ///
    /// Silent unless `emit_quote_replace_cancels` is configured.
    fn remove_user_quote(&mut self, user: &str) -> Result<()> {
        for side in [Side::Buy, Side::Sell] {
            if let Some(entry) = self.side_mut(side).remove_quote(user) {
                if self.config.emit_quote_replace_cancels {
                    let message = CancelMessage {
                        user: entry.user().to_string(),
                        product: entry.product().to_string(),
                        price: entry.price(),
                        volume: entry.remaining_volume(),
                        details: "Quote replaced".to_string(),
                        side: entry.side(),
                        id: entry.id().to_string(),
                    };
                    self.hub.publish_cancel(&message);
                }
                self.archive(entry)?;
            }
        }
        Ok(())
    }

    /// Stage an entry passively or hand it to the opposite side's matcher
    fn add_tradable(&mut self, mut entry: Tradable, state: MarketState) -> Result<()> {
        if state == MarketState::Preopen {
            self.side_mut(entry.side()).add_entry(entry);
            return Ok(());
        }
        let fallback = self.last_sale_price.unwrap_or(Price::limit(0));
        let outcome = match entry.side() {
            Side::Buy => self.sell_side.try_trade(&mut entry, fallback)?,
            Side::Sell => self.buy_side.try_trade(&mut entry, fallback)?,
        };
        for fill in &outcome.fills {
            self.hub.publish_fill(fill);
        }
        let last_price = lowest_fill_price(&outcome.fills);
        let had_fills = !outcome.fills.is_empty();
        for done in outcome.archived {
            self.archive(done)?;
        }
        if had_fills {
            let traded = entry.original_volume() - entry.remaining_volume();
            info!(
                product = %self.product,
                id = %entry.id(),
                traded,
                remaining = entry.remaining_volume(),
                "entry traded"
            );
            self.update_current_market();
            if let Some(price) = last_price {
                self.publish_last_sale(price, traded);
            }
        }
        if entry.remaining_volume() > 0 {
            if entry.price().is_market() {
                // A market-priced remainder never rests.
                let message = CancelMessage {
                    user: entry.user().to_string(),
                    product: entry.product().to_string(),
                    price: entry.price(),
                    volume: entry.remaining_volume(),
                    details: "Cancelled".to_string(),
                    side: entry.side(),
                    id: entry.id().to_string(),
                };
                self.hub.publish_cancel(&message);
                self.archive(entry)?;
            } else {
                self.side_mut(entry.side()).add_entry(entry);
            }
        } else if outcome.archive_aggressor {
            self.archive(entry)?;
        }
        Ok(())
    }

    /// Run the opening cross until the tops no longer overlap
    ///
    /// Each pass trades the whole BUY top queue against the SELL side,
    /// refreshes the current market and reports the pass's defining
    /// clearing price (its lowest fill price) and largest matched lot.
    pub fn open_market(&mut self) -> Result<()> {
        loop {
            let (Some(buy_top), Some(sell_top)) = (
                self.buy_side.top_of_book_price(),
                self.sell_side.top_of_book_price(),
            ) else {
                break;
            };
            if !(buy_top.is_market() || sell_top.is_market() || buy_top.greater_or_equal(&sell_top))
            {
                break;
            }
            let fallback = self.last_sale_price.unwrap_or(Price::limit(0));
            let mut queue = self.buy_side.take_queue(&buy_top);
            let mut pass_fills: Vec<FillMessage> = Vec::new();
            let mut leftovers: VecDeque<Tradable> = VecDeque::new();
            while let Some(mut entry) = queue.pop_front() {
                let outcome = self.sell_side.try_trade(&mut entry, fallback)?;
                for fill in &outcome.fills {
                    self.hub.publish_fill(fill);
                }
                pass_fills.extend(outcome.fills);
                for done in outcome.archived {
                    self.archive(done)?;
                }
                if entry.remaining_volume() == 0 {
                    if outcome.archive_aggressor {
                        self.archive(entry)?;
                    }
                } else {
                    leftovers.push_back(entry);
                }
            }
            for entry in leftovers {
                self.buy_side.add_entry(entry);
            }
            self.update_current_market();
            if pass_fills.is_empty() {
                break;
            }
            let volume = pass_fills.iter().map(|fill| fill.volume).max().unwrap_or(0);
            if let Some(price) = lowest_fill_price(&pass_fills) {
                self.publish_last_sale(price, volume);
            }
        }
        info!(product = %self.product, "opening cross complete");
        Ok(())
    }

    /// Cancel everything on both sides when the market closes
    pub fn close_market(&mut self) -> Result<()> {
        for side in [Side::Buy, Side::Sell] {
            let cancelled = self.side_mut(side).cancel_all();
            for (message, entry) in cancelled {
                self.hub.publish_cancel(&message);
                self.archive(entry)?;
            }
        }
        self.user_quotes.clear();
        self.update_current_market();
        info!(product = %self.product, "book closed");
        Ok(())
    }

    /// Cancel an order by id on the given side
    ///
    /// An id that is no longer active is diagnosed against the archive: a
    /// hit produces a "Too Late to Cancel" receipt, a miss fails with
    /// `OrderNotFound`.
    pub fn cancel_order(&mut self, side: Side, order_id: &str) -> Result<()> {
        match self.side_mut(side).cancel_order(order_id) {
            Some((message, entry)) => {
                debug!(product = %self.product, order_id, "order cancelled");
                self.hub.publish_cancel(&message);
                self.archive(entry)?;
            }
            None => self.check_too_late_to_cancel(order_id)?,
        }
        self.update_current_market();
        Ok(())
    }

    /// Cancel a user's quote on both sides
    pub fn cancel_quote(&mut self, user: &str) -> Result<()> {
        for side in [Side::Buy, Side::Sell] {
            if let Some((message, entry)) = self.side_mut(side).cancel_quote(user) {
                self.hub.publish_cancel(&message);
                self.archive(entry)?;
            }
        }
        self.user_quotes.remove(user);
        self.update_current_market();
        Ok(())
    }

    /// Diagnose a cancel whose id is not active in either side
    fn check_too_late_to_cancel(&self, order_id: &str) -> Result<()> {
        for entries in self.old_entries.values() {
            if let Some(entry) = entries.iter().find(|entry| entry.id() == order_id) {
                let message = CancelMessage {
                    user: entry.user().to_string(),
                    product: entry.product().to_string(),
                    price: entry.price(),
                    volume: entry.remaining_volume(),
                    details: "Too Late to Cancel".to_string(),
                    side: entry.side(),
                    id: entry.id().to_string(),
                };
                self.hub.publish_cancel(&message);
                return Ok(());
            }
        }
        Err(EngineError::OrderNotFound(order_id.to_string()))
    }

    /// The current market, with $0.00 standing in for an absent side
    pub fn market_data(&self) -> MarketSnapshot {
        MarketSnapshot {
            product: self.product.clone(),
            buy_price: self
                .buy_side
                .top_of_book_price()
                .unwrap_or_else(|| Price::limit(0)),
            buy_volume: self.buy_side.top_of_book_volume(),
            sell_price: self
                .sell_side
                .top_of_book_price()
                .unwrap_or_else(|| Price::limit(0)),
            sell_volume: self.sell_side.top_of_book_volume(),
        }
    }

    /// Publish the current market if the top of either side changed
    pub fn update_current_market(&mut self) {
        let snapshot = self.market_data();
        let fingerprint = format!(
            "{}{}{}{}",
            snapshot.buy_price, snapshot.buy_volume, snapshot.sell_price, snapshot.sell_volume
        );
        if fingerprint != self.latest_market_fingerprint {
            self.hub.publish_current_market(&snapshot);
            self.latest_market_fingerprint = fingerprint;
        }
    }

    /// Both sides' depth, buy then sell
    pub fn book_depth(&self) -> (Vec<String>, Vec<String>) {
        (self.buy_side.book_depth(), self.sell_side.book_depth())
    }

    /// The user's unfilled entries across both sides, buy side first
    pub fn orders_with_remaining_qty(&self, user: &str) -> Vec<TradableSnapshot> {
        let mut snapshots = self.buy_side.orders_with_remaining_qty(user);
        snapshots.extend(self.sell_side.orders_with_remaining_qty(user));
        snapshots
    }

    /// Record a last sale and fan it out
    fn publish_last_sale(&mut self, price: Price, volume: u32) {
        self.last_sale_price = Some(price);
        self.hub.publish_last_sale(&self.product, price, volume);
    }

    /// Move a finished entry into the archive, zeroing its remainder into
    /// cancelled volume
    fn archive(&mut self, mut entry: Tradable) -> Result<()> {
        entry.set_cancelled_volume(entry.remaining_volume())?;
        entry.set_remaining_volume(0)?;
        self.old_entries.entry(entry.price()).or_default().push(entry);
        Ok(())
    }

    fn side_mut(&mut self, side: Side) -> &mut BookSide {
        match side {
            Side::Buy => &mut self.buy_side,
            Side::Sell => &mut self.sell_side,
        }
    }
}

/// The lowest-priced fill of a stream, reported as the last sale price
fn lowest_fill_price(fills: &[FillMessage]) -> Option<Price> {
    fills
        .iter()
        .map(|fill| fill.price)
        .min_by_key(|price| price.cents().unwrap_or(0))
}

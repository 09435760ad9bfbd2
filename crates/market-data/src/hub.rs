//! Event hub
//!
//! Owns the four publishers behind independent mutexes and exposes the
//! publish and subscription surface the rest of the system goes through.
//! Publisher locks are leaves in the system's lock order: they are taken
//! last and nothing else is acquired while they are held.

use crate::current_market::CurrentMarketPublisher;
use crate::last_sale::LastSalePublisher;
use crate::messages::MessagePublisher;
use crate::observer::MarketObserver;
use crate::ticker::TickerPublisher;
use crate::types::{CancelMessage, FillMessage, MarketSnapshot};
use crate::Result;
use common::{MarketState, Price};
use parking_lot::Mutex;
use std::sync::Arc;

/// The four market event streams behind one handle
#[derive(Default)]
pub struct EventHub {
    current_market: Mutex<CurrentMarketPublisher>,
    last_sale: Mutex<LastSalePublisher>,
    ticker: Mutex<TickerPublisher>,
    messages: Mutex<MessagePublisher>,
}

impl EventHub {
    /// Create a hub with empty publishers
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a current-market snapshot
    pub fn publish_current_market(&self, snapshot: &MarketSnapshot) {
        self.current_market.lock().publish(snapshot);
    }

    /// Publish a last sale and the ticker update it implies
    pub fn publish_last_sale(&self, product: &str, price: Price, volume: u32) {
        self.last_sale.lock().publish(product, price, volume);
        self.ticker.lock().publish(product, price);
    }

    /// Deliver a fill receipt to its user
    pub fn publish_fill(&self, fill: &FillMessage) {
        self.messages.lock().publish_fill(fill);
    }

    /// Deliver a cancel receipt to its user
    pub fn publish_cancel(&self, cancel: &CancelMessage) {
        self.messages.lock().publish_cancel(cancel);
    }

    /// Broadcast a market-state change to every message subscriber
    pub fn publish_market_state(&self, state: MarketState) {
        self.messages.lock().publish_market_state(state);
    }

    /// Subscribe to current-market snapshots for a product
    pub fn subscribe_current_market(
        &self,
        observer: Arc<dyn MarketObserver>,
        product: &str,
    ) -> Result<()> {
        self.current_market.lock().subscribe(observer, product)
    }

    /// Unsubscribe from current-market snapshots for a product
    pub fn unsubscribe_current_market(&self, user: &str, product: &str) -> Result<()> {
        self.current_market.lock().unsubscribe(user, product)
    }

    /// Subscribe to last-sale events for a product
    pub fn subscribe_last_sale(
        &self,
        observer: Arc<dyn MarketObserver>,
        product: &str,
    ) -> Result<()> {
        self.last_sale.lock().subscribe(observer, product)
    }

    /// Unsubscribe from last-sale events for a product
    pub fn unsubscribe_last_sale(&self, user: &str, product: &str) -> Result<()> {
        self.last_sale.lock().unsubscribe(user, product)
    }

    /// Subscribe to ticker updates for a product
    pub fn subscribe_ticker(
        &self,
        observer: Arc<dyn MarketObserver>,
        product: &str,
    ) -> Result<()> {
        self.ticker.lock().subscribe(observer, product)
    }

    /// Unsubscribe from ticker updates for a product
    pub fn unsubscribe_ticker(&self, user: &str, product: &str) -> Result<()> {
        self.ticker.lock().unsubscribe(user, product)
    }

    /// Subscribe to fill/cancel messages for a product
    pub fn subscribe_messages(
        &self,
        observer: Arc<dyn MarketObserver>,
        product: &str,
    ) -> Result<()> {
        self.messages.lock().subscribe(observer, product)
    }

    /// Unsubscribe from fill/cancel messages for a product
    pub fn unsubscribe_messages(&self, user: &str, product: &str) -> Result<()> {
        self.messages.lock().unsubscribe(user, product)
    }
}

//! Last-sale publisher
//!
//! Delivers the price and volume of the latest sale to per-product
//! subscribers. The event hub chains every last-sale publication into a
//! ticker publication at the same price.

use crate::observer::MarketObserver;
use crate::subscriptions::SubscriberTable;
use crate::Result;
use common::Price;
use std::sync::Arc;
use tracing::debug;

/// Publisher for last-sale events
#[derive(Default)]
pub struct LastSalePublisher {
    subscribers: SubscriberTable,
}

impl LastSalePublisher {
    /// Create a publisher with no subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe an observer to last-sale events for a product
    pub fn subscribe(&mut self, observer: Arc<dyn MarketObserver>, product: &str) -> Result<()> {
        self.subscribers.subscribe(observer, product)
    }

    /// Unsubscribe a user from last-sale events for a product
    pub fn unsubscribe(&mut self, user: &str, product: &str) -> Result<()> {
        self.subscribers.unsubscribe(user, product)
    }

    /// Deliver a last sale to every subscriber of the product
    pub fn publish(&self, product: &str, price: Price, volume: u32) {
        debug!(product, %price, volume, "publishing last sale");
        for observer in self.subscribers.subscribers(product) {
            observer.last_sale(product, price, volume);
        }
    }
}

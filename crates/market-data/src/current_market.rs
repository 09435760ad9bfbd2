//! Current-market publisher
//!
//! Fans best-price snapshots out to per-product subscribers. Snapshot
//! prices are always concrete: a bookless side reaches this publisher
//! already coerced to $0.00.

use crate::observer::MarketObserver;
use crate::subscriptions::SubscriberTable;
use crate::types::MarketSnapshot;
use crate::Result;
use std::sync::Arc;
use tracing::debug;

/// Publisher for current-market snapshots
#[derive(Default)]
pub struct CurrentMarketPublisher {
    subscribers: SubscriberTable,
}

impl CurrentMarketPublisher {
    /// Create a publisher with no subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe an observer to snapshots for a product
    pub fn subscribe(&mut self, observer: Arc<dyn MarketObserver>, product: &str) -> Result<()> {
        self.subscribers.subscribe(observer, product)
    }

    /// Unsubscribe a user from snapshots for a product
    pub fn unsubscribe(&mut self, user: &str, product: &str) -> Result<()> {
        self.subscribers.unsubscribe(user, product)
    }

    /// Deliver a snapshot to every subscriber of its product
    pub fn publish(&self, snapshot: &MarketSnapshot) {
        debug!(product = %snapshot.product, market = %snapshot, "publishing current market");
        for observer in self.subscribers.subscribers(&snapshot.product) {
            observer.current_market(snapshot);
        }
    }
}

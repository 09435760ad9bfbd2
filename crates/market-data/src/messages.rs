//! Message publisher
//!
//! Delivers fill and cancel receipts to the single user they belong to,
//! and broadcasts market-state changes to every subscriber of any product
//! topic.

use crate::observer::MarketObserver;
use crate::subscriptions::SubscriberTable;
use crate::types::{CancelMessage, FillMessage};
use crate::Result;
use common::MarketState;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Publisher for fill, cancel and market-state messages
#[derive(Default)]
pub struct MessagePublisher {
    subscribers: SubscriberTable,
    /// Everyone subscribed to at least one product topic; the target set
    /// for market-state broadcasts
    all_subscribers: HashMap<String, Arc<dyn MarketObserver>>,
}

impl MessagePublisher {
    /// Create a publisher with no subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe an observer to messages for a product
    ///
    /// Subscribing to any product topic also enrolls the user in the
    /// market-state broadcast set.
    pub fn subscribe(&mut self, observer: Arc<dyn MarketObserver>, product: &str) -> Result<()> {
        self.subscribers.subscribe(observer.clone(), product)?;
        self.all_subscribers
            .insert(observer.user_name().to_string(), observer);
        Ok(())
    }

    /// Unsubscribe a user from messages for a product
    ///
    /// The user stays in the broadcast set while subscribed to any other
    /// product topic.
    pub fn unsubscribe(&mut self, user: &str, product: &str) -> Result<()> {
        self.subscribers.unsubscribe(user, product)?;
        if !self.subscribers.has_user(user) {
            self.all_subscribers.remove(user);
        }
        Ok(())
    }

    /// Deliver a fill receipt to its own user, if subscribed to the product
    pub fn publish_fill(&self, fill: &FillMessage) {
        debug!(user = %fill.user, product = %fill.product, volume = fill.volume, "publishing fill");
        if let Some(observer) = self.subscribers.subscriber(&fill.product, &fill.user) {
            observer.fill(fill);
        }
    }

    /// Deliver a cancel receipt to its own user, if subscribed to the product
    pub fn publish_cancel(&self, cancel: &CancelMessage) {
        debug!(user = %cancel.user, product = %cancel.product, details = %cancel.details, "publishing cancel");
        if let Some(observer) = self.subscribers.subscriber(&cancel.product, &cancel.user) {
            observer.cancel(cancel);
        }
    }

    /// Broadcast a market-state change to every subscriber
    pub fn publish_market_state(&self, state: MarketState) {
        debug!(%state, "broadcasting market state");
        for observer in self.all_subscribers.values() {
            observer.market_state(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::{ObservedEvent, RecordingObserver};
    use common::{Price, Side};

    fn fill_for(user: &str) -> FillMessage {
        FillMessage {
            user: user.to_string(),
            product: "IBM".to_string(),
            price: Price::limit(1010),
            volume: 60,
            details: "leaving 0".to_string(),
            side: Side::Buy,
            id: "abc".to_string(),
        }
    }

    #[test]
    fn test_fill_targets_its_own_user_only() {
        let mut publisher = MessagePublisher::new();
        let rex = Arc::new(RecordingObserver::new("REX"));
        let ann = Arc::new(RecordingObserver::new("ANN"));
        publisher.subscribe(rex.clone(), "IBM").unwrap();
        publisher.subscribe(ann.clone(), "IBM").unwrap();

        publisher.publish_fill(&fill_for("REX"));

        assert_eq!(rex.events().len(), 1);
        assert!(ann.events().is_empty());
    }

    #[test]
    fn test_fill_for_unsubscribed_user_is_dropped() {
        let mut publisher = MessagePublisher::new();
        let ann = Arc::new(RecordingObserver::new("ANN"));
        publisher.subscribe(ann.clone(), "IBM").unwrap();

        publisher.publish_fill(&fill_for("REX"));
        assert!(ann.events().is_empty());
    }

    #[test]
    fn test_market_state_reaches_every_subscriber() {
        let mut publisher = MessagePublisher::new();
        let rex = Arc::new(RecordingObserver::new("REX"));
        let ann = Arc::new(RecordingObserver::new("ANN"));
        publisher.subscribe(rex.clone(), "IBM").unwrap();
        publisher.subscribe(ann.clone(), "GOOG").unwrap();

        publisher.publish_market_state(MarketState::Open);

        for observer in [&rex, &ann] {
            assert!(matches!(
                observer.events()[0],
                ObservedEvent::MarketState(MarketState::Open)
            ));
        }
    }

    #[test]
    fn test_broadcast_membership_follows_last_topic() {
        let mut publisher = MessagePublisher::new();
        let rex = Arc::new(RecordingObserver::new("REX"));
        publisher.subscribe(rex.clone(), "IBM").unwrap();
        publisher.subscribe(rex.clone(), "GOOG").unwrap();

        publisher.unsubscribe("REX", "IBM").unwrap();
        publisher.publish_market_state(MarketState::Preopen);
        assert_eq!(rex.events().len(), 1);

        publisher.unsubscribe("REX", "GOOG").unwrap();
        publisher.publish_market_state(MarketState::Open);
        assert_eq!(rex.events().len(), 1);
    }
}

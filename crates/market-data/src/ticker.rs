//! Ticker publisher
//!
//! Tracks the last known sale price per product and annotates every
//! publication with the direction of movement relative to it.

use crate::observer::MarketObserver;
use crate::subscriptions::SubscriberTable;
use crate::types::Direction;
use crate::Result;
use common::Price;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Publisher for ticker updates
#[derive(Default)]
pub struct TickerPublisher {
    subscribers: SubscriberTable,
    last_prices: HashMap<String, Price>,
}

impl TickerPublisher {
    /// Create a publisher with no subscribers and no price history
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe an observer to ticker updates for a product
    pub fn subscribe(&mut self, observer: Arc<dyn MarketObserver>, product: &str) -> Result<()> {
        self.subscribers.subscribe(observer, product)
    }

    /// Unsubscribe a user from ticker updates for a product
    pub fn unsubscribe(&mut self, user: &str, product: &str) -> Result<()> {
        self.subscribers.unsubscribe(user, product)
    }

    /// Record the new price, derive its direction and fan it out
    pub fn publish(&mut self, product: &str, price: Price) {
        let direction = match self.last_prices.get(product) {
            Some(last) => match last.cmp_limits(&price) {
                Some(Ordering::Less) => Direction::Up,
                Some(Ordering::Greater) => Direction::Down,
                _ => Direction::Unchanged,
            },
            None => Direction::First,
        };
        self.last_prices.insert(product.to_string(), price);
        debug!(product, %price, ?direction, "publishing ticker");
        for observer in self.subscribers.subscribers(product) {
            observer.ticker(product, price, direction);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::{ObservedEvent, RecordingObserver};

    fn directions(observer: &RecordingObserver) -> Vec<Direction> {
        observer
            .events()
            .iter()
            .filter_map(|event| match event {
                ObservedEvent::Ticker { direction, .. } => Some(*direction),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_direction_sequence() {
        let mut publisher = TickerPublisher::new();
        let rex = Arc::new(RecordingObserver::new("REX"));
        publisher.subscribe(rex.clone(), "IBM").unwrap();

        publisher.publish("IBM", Price::limit(1000));
        publisher.publish("IBM", Price::limit(1010));
        publisher.publish("IBM", Price::limit(1005));
        publisher.publish("IBM", Price::limit(1005));

        assert_eq!(
            directions(&rex),
            vec![
                Direction::First,
                Direction::Up,
                Direction::Down,
                Direction::Unchanged
            ]
        );
    }

    #[test]
    fn test_last_price_is_per_product() {
        let mut publisher = TickerPublisher::new();
        let rex = Arc::new(RecordingObserver::new("REX"));
        publisher.subscribe(rex.clone(), "IBM").unwrap();
        publisher.subscribe(rex.clone(), "GOOG").unwrap();

        publisher.publish("IBM", Price::limit(1000));
        publisher.publish("GOOG", Price::limit(50));

        assert_eq!(directions(&rex), vec![Direction::First, Direction::First]);
    }
}

//! In-memory observer
//!
//! A `MarketObserver` that records everything it receives. Used by the
//! demo driver and throughout the test suites to assert on delivered
//! events.

use crate::observer::MarketObserver;
use crate::types::{CancelMessage, Direction, FillMessage, MarketSnapshot};
use common::{MarketState, Price};
use parking_lot::Mutex;

/// One event as seen by a subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedEvent {
    CurrentMarket(MarketSnapshot),
    LastSale {
        product: String,
        price: Price,
        volume: u32,
    },
    Ticker {
        product: String,
        price: Price,
        direction: Direction,
    },
    Fill(FillMessage),
    Cancel(CancelMessage),
    MarketState(MarketState),
}

/// Observer that appends every delivery to an in-memory log
pub struct RecordingObserver {
    user: String,
    events: Mutex<Vec<ObservedEvent>>,
}

impl RecordingObserver {
    /// Create a recorder subscribing under the given user name
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of everything received so far, in delivery order
    pub fn events(&self) -> Vec<ObservedEvent> {
        self.events.lock().clone()
    }

    /// Drop all recorded events
    pub fn clear(&self) {
        self.events.lock().clear();
    }

    /// The fills received so far
    pub fn fills(&self) -> Vec<FillMessage> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ObservedEvent::Fill(fill) => Some(fill),
                _ => None,
            })
            .collect()
    }

    /// The cancels received so far
    pub fn cancels(&self) -> Vec<CancelMessage> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ObservedEvent::Cancel(cancel) => Some(cancel),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: ObservedEvent) {
        self.events.lock().push(event);
    }
}

impl MarketObserver for RecordingObserver {
    fn user_name(&self) -> &str {
        &self.user
    }

    fn current_market(&self, snapshot: &MarketSnapshot) {
        self.record(ObservedEvent::CurrentMarket(snapshot.clone()));
    }

    fn last_sale(&self, product: &str, price: Price, volume: u32) {
        self.record(ObservedEvent::LastSale {
            product: product.to_string(),
            price,
            volume,
        });
    }

    fn ticker(&self, product: &str, price: Price, direction: Direction) {
        self.record(ObservedEvent::Ticker {
            product: product.to_string(),
            price,
            direction,
        });
    }

    fn fill(&self, fill: &FillMessage) {
        self.record(ObservedEvent::Fill(fill.clone()));
    }

    fn cancel(&self, cancel: &CancelMessage) {
        self.record(ObservedEvent::Cancel(cancel.clone()));
    }

    fn market_state(&self, state: MarketState) {
        self.record(ObservedEvent::MarketState(state));
    }
}

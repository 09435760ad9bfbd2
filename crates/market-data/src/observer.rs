//! Subscriber interface
//!
//! External clients receive market events through this trait. Publishers
//! call the methods while holding their own lock, so implementations must
//! be non-blocking and must not call back into the engine.

use crate::types::{CancelMessage, Direction, FillMessage, MarketSnapshot};
use common::{MarketState, Price};

/// A consumer of market events, identified by user name
///
/// All callbacks are infallible by contract; an observer that encounters a
/// problem has to swallow it rather than disturb the fan-out.
pub trait MarketObserver: Send + Sync {
    /// The user name this observer subscribes under
    fn user_name(&self) -> &str;

    /// A new current-market snapshot for a subscribed product
    fn current_market(&self, snapshot: &MarketSnapshot);

    /// The price and volume of the latest sale of a subscribed product
    fn last_sale(&self, product: &str, price: Price, volume: u32);

    /// A ticker update for a subscribed product
    fn ticker(&self, product: &str, price: Price, direction: Direction);

    /// A fill receipt for one of this user's own entries
    fn fill(&self, fill: &FillMessage);

    /// A cancel receipt for one of this user's own entries
    fn cancel(&self, cancel: &CancelMessage);

    /// A broadcast announcing a market state change
    fn market_state(&self, state: MarketState);
}

//! Market event fan-out for the exchange core
//!
//! Four logically separate event streams, each with per-product
//! subscriptions:
//!
//! - **current-market**: best-price snapshots whenever the top of a book
//!   changes
//! - **last-sale**: price and volume of each sale, chained into a ticker
//!   publication
//! - **ticker**: last sale price with an up/down/unchanged direction
//! - **messages**: fill and cancel receipts delivered to their own user,
//!   plus market-state broadcasts to everyone
//!
//! The [`EventHub`] bundles the four publishers behind independent leaf
//! mutexes; subscribers implement [`MarketObserver`].

pub mod current_market;
pub mod error;
pub mod hub;
pub mod last_sale;
pub mod messages;
pub mod observer;
pub mod recorder;
pub mod subscriptions;
pub mod ticker;
pub mod types;

pub use current_market::CurrentMarketPublisher;
pub use error::{MarketDataError, Result};
pub use hub::EventHub;
pub use last_sale::LastSalePublisher;
pub use messages::MessagePublisher;
pub use observer::MarketObserver;
pub use recorder::{ObservedEvent, RecordingObserver};
pub use subscriptions::SubscriberTable;
pub use ticker::TickerPublisher;
pub use types::{CancelMessage, Direction, FillMessage, MarketSnapshot};

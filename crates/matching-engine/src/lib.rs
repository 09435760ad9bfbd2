//! Price-time matching engine for the exchange core
//!
//! Per-product two-sided books with strict price-time priority, an
//! opening auction, continuous trading with market-order handling, and a
//! market lifecycle state machine. Matching effects are published through
//! the market-data event hub.
//!
//! Properties the engine maintains:
//!
//! 1. FIFO within a price level; best price trades first across levels
//! 2. `remaining + cancelled + traded == original` for every entry at
//!    every observable moment
//! 3. Finished entries move to a per-product archive, disjoint from the
//!    active books
//! 4. The current market is republished only when the top of a book
//!    changes

pub mod book_side;
pub mod config;
pub mod domain;
pub mod error;
pub mod product_book;
pub mod registry;

pub use book_side::{BookSide, TradeOutcome};
pub use config::EngineConfig;
pub use domain::{Quote, Tradable, TradableKind, TradableSnapshot};
pub use error::{EngineError, Result};
pub use product_book::ProductBook;
pub use registry::ProductRegistry;

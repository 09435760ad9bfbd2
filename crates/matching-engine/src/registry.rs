//! Product registry and market lifecycle
//!
//! The process-wide entry point for commands. Admission control happens
//! here: every command is checked against the current market state before
//! it reaches a product book. The registry lock is always taken first and
//! released before (or ordered ahead of) the per-book locks.

use crate::config::EngineConfig;
use crate::domain::{Quote, Tradable, TradableSnapshot};
use crate::error::{EngineError, Result};
use crate::product_book::ProductBook;
use common::{MarketState, Side};
use market_data::{EventHub, MarketSnapshot};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

struct RegistryInner {
    books: HashMap<String, Arc<Mutex<ProductBook>>>,
    state: MarketState,
}

/// The set of tradable products and the market state machine
pub struct ProductRegistry {
    inner: Mutex<RegistryInner>,
    hub: Arc<EventHub>,
    config: EngineConfig,
}

impl ProductRegistry {
    /// Create a registry with no products, starting CLOSED
    pub fn new(hub: Arc<EventHub>, config: EngineConfig) -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                books: HashMap::new(),
                state: MarketState::Closed,
            }),
            hub,
            config,
        }
    }

    /// Register a new product; allowed in any market state
    pub fn create_product(&self, product: &str) -> Result<()> {
        if product.is_empty() {
            return Err(EngineError::InvalidData("product cannot be empty".to_string()));
        }
        let mut inner = self.inner.lock();
        if inner.books.contains_key(product) {
            return Err(EngineError::ProductAlreadyExists(product.to_string()));
        }
        let book = ProductBook::new(product, self.hub.clone(), self.config.clone())?;
        inner.books.insert(product.to_string(), Arc::new(Mutex::new(book)));
        info!(product, "product created");
        Ok(())
    }

    /// The current market state
    pub fn market_state(&self) -> MarketState {
        self.inner.lock().state
    }

    /// Move the market through its lifecycle
    ///
    /// Only `CLOSED → PREOPEN → OPEN → CLOSED` is allowed. The change is
    /// broadcast to every message subscriber; entering OPEN runs each
    /// product's opening cross and entering CLOSED cancels every resting
    /// entry.
    pub fn set_market_state(&self, next: MarketState) -> Result<()> {
        let mut inner = self.inner.lock();
        let current = inner.state;
        if !current.can_transition_to(next) {
            return Err(EngineError::InvalidMarketStateTransition {
                from: current,
                to: next,
            });
        }
        inner.state = next;
        info!(from = %current, to = %next, "market state changed");
        self.hub.publish_market_state(next);
        match next {
            MarketState::Open => {
                for book in inner.books.values() {
                    book.lock().open_market()?;
                }
            }
            MarketState::Closed => {
                for book in inner.books.values() {
                    book.lock().close_market()?;
                }
            }
            MarketState::Preopen => {}
        }
        Ok(())
    }

    /// Submit an order, returning its id
    ///
    /// Rejected while CLOSED; market-priced orders are additionally
    /// rejected in PREOPEN.
    pub fn submit_order(&self, order: Tradable) -> Result<String> {
        if order.is_quote() {
            return Err(EngineError::InvalidData(
                "quote sides cannot be submitted as orders".to_string(),
            ));
        }
        let (book, state) = {
            let inner = self.inner.lock();
            if inner.state == MarketState::Closed {
                return Err(EngineError::InvalidMarketState(
                    "cannot submit an order while the market is closed".to_string(),
                ));
            }
            if inner.state == MarketState::Preopen && order.price().is_market() {
                return Err(EngineError::InvalidMarketState(
                    "cannot submit a market-priced order while the market is in PREOPEN".to_string(),
                ));
            }
            (self.book_for(&inner, order.product())?, inner.state)
        };
        let id = order.id().to_string();
        info!(product = %order.product(), id = %id, side = %order.side(), "order submitted");
        book.lock().add_order(order, state)?;
        Ok(id)
    }

    /// Submit a two-sided quote
    pub fn submit_quote(&self, quote: Quote) -> Result<()> {
        let (book, state) = {
            let inner = self.inner.lock();
            if inner.state == MarketState::Closed {
                return Err(EngineError::InvalidMarketState(
                    "cannot submit a quote while the market is closed".to_string(),
                ));
            }
            (self.book_for(&inner, quote.product())?, inner.state)
        };
        info!(product = %quote.product(), user = %quote.user(), "quote submitted");
        let result = book.lock().add_quote(quote, state);
        result
    }

    /// Cancel an order by product, side and id
    pub fn submit_order_cancel(&self, product: &str, side: Side, order_id: &str) -> Result<()> {
        if product.is_empty() {
            return Err(EngineError::InvalidData("product cannot be empty".to_string()));
        }
        if order_id.is_empty() {
            return Err(EngineError::InvalidData("order id cannot be empty".to_string()));
        }
        let book = {
            let inner = self.inner.lock();
            if inner.state == MarketState::Closed {
                return Err(EngineError::InvalidMarketState(
                    "cannot cancel an order while the market is closed".to_string(),
                ));
            }
            self.book_for(&inner, product)?
        };
        let result = book.lock().cancel_order(side, order_id);
        result
    }

    /// Cancel a user's quote on a product
    pub fn submit_quote_cancel(&self, user: &str, product: &str) -> Result<()> {
        if user.is_empty() {
            return Err(EngineError::InvalidData("user cannot be empty".to_string()));
        }
        if product.is_empty() {
            return Err(EngineError::InvalidData("product cannot be empty".to_string()));
        }
        let book = {
            let inner = self.inner.lock();
            if inner.state == MarketState::Closed {
                return Err(EngineError::InvalidMarketState(
                    "cannot cancel a quote while the market is closed".to_string(),
                ));
            }
            self.book_for(&inner, product)?
        };
        let result = book.lock().cancel_quote(user);
        result
    }

    /// The registered products, in no particular order
    pub fn product_list(&self) -> Vec<String> {
        self.inner.lock().books.keys().cloned().collect()
    }

    /// Both sides' depth for a product, buy then sell
    pub fn get_book_depth(&self, product: &str) -> Result<(Vec<String>, Vec<String>)> {
        let book = {
            let inner = self.inner.lock();
            self.book_for(&inner, product)?
        };
        let depth = book.lock().book_depth();
        Ok(depth)
    }

    /// The current market for a product
    pub fn get_market_data(&self, product: &str) -> Result<MarketSnapshot> {
        let book = {
            let inner = self.inner.lock();
            self.book_for(&inner, product)?
        };
        let snapshot = book.lock().market_data();
        Ok(snapshot)
    }

    /// The user's unfilled entries on a product
    pub fn get_orders_with_remaining_qty(
        &self,
        user: &str,
        product: &str,
    ) -> Result<Vec<TradableSnapshot>> {
        if user.is_empty() {
            return Err(EngineError::InvalidData("user cannot be empty".to_string()));
        }
        let book = {
            let inner = self.inner.lock();
            self.book_for(&inner, product)?
        };
        let snapshots = book.lock().orders_with_remaining_qty(user);
        Ok(snapshots)
    }

    fn book_for(&self, inner: &RegistryInner, product: &str) -> Result<Arc<Mutex<ProductBook>>> {
        inner
            .books
            .get(product)
            .cloned()
            .ok_or_else(|| EngineError::NoSuchProduct(product.to_string()))
    }
}

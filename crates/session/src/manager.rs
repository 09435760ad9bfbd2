//! Session manager
//!
//! The facade between external clients and the trading system. Every
//! command verifies the caller's session and validates its arguments
//! before anything reaches the registry or the event hub.

use crate::error::{Result, SessionError};
use chrono::{DateTime, Utc};
use common::{MarketState, Price, Side};
use market_data::{EventHub, MarketObserver};
use matching_engine::{ProductRegistry, Quote, Tradable, TradableSnapshot};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

static CONNECTION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

struct Session {
    connection_id: u64,
    observer: Arc<dyn MarketObserver>,
    connected_at: DateTime<Utc>,
}

/// Connection management and command forwarding for external clients
pub struct SessionManager {
    registry: Arc<ProductRegistry>,
    hub: Arc<EventHub>,
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionManager {
    /// Create a manager in front of a registry and its event hub
    pub fn new(registry: Arc<ProductRegistry>, hub: Arc<EventHub>) -> Self {
        Self {
            registry,
            hub,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Connect a client, returning the connection id for its session
    pub fn connect(&self, observer: Arc<dyn MarketObserver>) -> Result<u64> {
        let user = observer.user_name().to_string();
        if user.is_empty() {
            return Err(SessionError::InvalidData("user cannot be empty".to_string()));
        }
        let mut sessions = self.sessions.lock();
        if sessions.contains_key(&user) {
            return Err(SessionError::AlreadyConnected(user));
        }
        let connection_id = CONNECTION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        info!(user = %user, connection_id, "user connected");
        sessions.insert(
            user,
            Session {
                connection_id,
                observer,
                connected_at: Utc::now(),
            },
        );
        Ok(connection_id)
    }

    /// Tear down a client's session
    pub fn disconnect(&self, user: &str, connection_id: u64) -> Result<()> {
        self.verify(user, connection_id)?;
        let mut sessions = self.sessions.lock();
        if let Some(session) = sessions.remove(user) {
            let duration = Utc::now() - session.connected_at;
            info!(user, seconds = duration.num_seconds(), "user disconnected");
        }
        Ok(())
    }

    /// Check that the user has a session and the connection id matches
    fn verify(&self, user: &str, connection_id: u64) -> Result<()> {
        if user.is_empty() {
            return Err(SessionError::InvalidData("user cannot be empty".to_string()));
        }
        let sessions = self.sessions.lock();
        let session = sessions
            .get(user)
            .ok_or_else(|| SessionError::UserNotConnected(user.to_string()))?;
        if session.connection_id != connection_id {
            return Err(SessionError::InvalidConnectionId {
                user: user.to_string(),
                connection_id,
            });
        }
        Ok(())
    }

    fn observer(&self, user: &str) -> Result<Arc<dyn MarketObserver>> {
        let sessions = self.sessions.lock();
        sessions
            .get(user)
            .map(|session| session.observer.clone())
            .ok_or_else(|| SessionError::UserNotConnected(user.to_string()))
    }

    fn require_product(product: &str) -> Result<()> {
        if product.is_empty() {
            return Err(SessionError::InvalidData("product cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Submit an order, returning its id
    pub fn submit_order(
        &self,
        user: &str,
        connection_id: u64,
        product: &str,
        price: Price,
        volume: u32,
        side: Side,
    ) -> Result<String> {
        Self::require_product(product)?;
        self.verify(user, connection_id)?;
        let order = Tradable::order(user, product, price, volume, side)?;
        Ok(self.registry.submit_order(order)?)
    }

    /// Cancel an order by product, side and id
    pub fn submit_order_cancel(
        &self,
        user: &str,
        connection_id: u64,
        product: &str,
        side: Side,
        order_id: &str,
    ) -> Result<()> {
        Self::require_product(product)?;
        if order_id.is_empty() {
            return Err(SessionError::InvalidData("order id cannot be empty".to_string()));
        }
        self.verify(user, connection_id)?;
        Ok(self.registry.submit_order_cancel(product, side, order_id)?)
    }

    /// Submit a two-sided quote
    #[allow(clippy::too_many_arguments)]
    pub fn submit_quote(
        &self,
        user: &str,
        connection_id: u64,
        product: &str,
        buy_price: Price,
        buy_volume: u32,
        sell_price: Price,
        sell_volume: u32,
    ) -> Result<()> {
        Self::require_product(product)?;
        self.verify(user, connection_id)?;
        let quote = Quote::new(user, product, buy_price, buy_volume, sell_price, sell_volume)?;
        Ok(self.registry.submit_quote(quote)?)
    }

    /// Cancel the user's quote on a product
    pub fn submit_quote_cancel(&self, user: &str, connection_id: u64, product: &str) -> Result<()> {
        Self::require_product(product)?;
        self.verify(user, connection_id)?;
        Ok(self.registry.submit_quote_cancel(user, product)?)
    }

    /// Subscribe to current-market snapshots for a product
    pub fn subscribe_current_market(
        &self,
        user: &str,
        connection_id: u64,
        product: &str,
    ) -> Result<()> {
        Self::require_product(product)?;
        self.verify(user, connection_id)?;
        let observer = self.observer(user)?;
        Ok(self.hub.subscribe_current_market(observer, product)?)
    }

    /// Unsubscribe from current-market snapshots for a product
    pub fn unsubscribe_current_market(
        &self,
        user: &str,
        connection_id: u64,
        product: &str,
    ) -> Result<()> {
        Self::require_product(product)?;
        self.verify(user, connection_id)?;
        Ok(self.hub.unsubscribe_current_market(user, product)?)
    }

    /// Subscribe to last-sale events for a product
    pub fn subscribe_last_sale(&self, user: &str, connection_id: u64, product: &str) -> Result<()> {
        Self::require_product(product)?;
        self.verify(user, connection_id)?;
        let observer = self.observer(user)?;
        Ok(self.hub.subscribe_last_sale(observer, product)?)
    }

    /// Unsubscribe from last-sale events for a product
    pub fn unsubscribe_last_sale(
        &self,
        user: &str,
        connection_id: u64,
        product: &str,
    ) -> Result<()> {
        Self::require_product(product)?;
        self.verify(user, connection_id)?;
        Ok(self.hub.unsubscribe_last_sale(user, product)?)
    }

    /// Subscribe to ticker updates for a product
    pub fn subscribe_ticker(&self, user: &str, connection_id: u64, product: &str) -> Result<()> {
        Self::require_product(product)?;
        self.verify(user, connection_id)?;
        let observer = self.observer(user)?;
        Ok(self.hub.subscribe_ticker(observer, product)?)
    }

    /// Unsubscribe from ticker updates for a product
    pub fn unsubscribe_ticker(&self, user: &str, connection_id: u64, product: &str) -> Result<()> {
        Self::require_product(product)?;
        self.verify(user, connection_id)?;
        Ok(self.hub.unsubscribe_ticker(user, product)?)
    }

    /// Subscribe to fill/cancel messages for a product
    pub fn subscribe_messages(&self, user: &str, connection_id: u64, product: &str) -> Result<()> {
        Self::require_product(product)?;
        self.verify(user, connection_id)?;
        let observer = self.observer(user)?;
        Ok(self.hub.subscribe_messages(observer, product)?)
    }

    /// Unsubscribe from fill/cancel messages for a product
    pub fn unsubscribe_messages(&self, user: &str, connection_id: u64, product: &str) -> Result<()> {
        Self::require_product(product)?;
        self.verify(user, connection_id)?;
        Ok(self.hub.unsubscribe_messages(user, product)?)
    }

    /// The current market state
    pub fn get_market_state(&self, user: &str, connection_id: u64) -> Result<MarketState> {
        self.verify(user, connection_id)?;
        Ok(self.registry.market_state())
    }

    /// All registered products, sorted
    pub fn get_products(&self, user: &str, connection_id: u64) -> Result<Vec<String>> {
        self.verify(user, connection_id)?;
        let mut products = self.registry.product_list();
        products.sort();
        Ok(products)
    }

    /// Both sides' depth for a product, buy then sell
    pub fn get_book_depth(
        &self,
        user: &str,
        connection_id: u64,
        product: &str,
    ) -> Result<(Vec<String>, Vec<String>)> {
        Self::require_product(product)?;
        self.verify(user, connection_id)?;
        Ok(self.registry.get_book_depth(product)?)
    }

    /// The user's unfilled entries on a product
    pub fn get_orders_with_remaining_qty(
        &self,
        user: &str,
        connection_id: u64,
        product: &str,
    ) -> Result<Vec<TradableSnapshot>> {
        Self::require_product(product)?;
        self.verify(user, connection_id)?;
        Ok(self.registry.get_orders_with_remaining_qty(user, product)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_data::RecordingObserver;
    use matching_engine::{EngineConfig, EngineError};

    fn manager() -> SessionManager {
        let hub = Arc::new(EventHub::new());
        let registry = Arc::new(ProductRegistry::new(hub.clone(), EngineConfig::default()));
        registry.create_product("IBM").unwrap();
        SessionManager::new(registry, hub)
    }

    #[test]
    fn test_connect_disconnect_round_trip() {
        let manager = manager();
        let rex = Arc::new(RecordingObserver::new("REX"));

        let connection_id = manager.connect(rex.clone()).unwrap();
        assert!(matches!(
            manager.connect(rex).unwrap_err(),
            SessionError::AlreadyConnected(_)
        ));

        manager.disconnect("REX", connection_id).unwrap();
        assert!(matches!(
            manager.disconnect("REX", connection_id).unwrap_err(),
            SessionError::UserNotConnected(_)
        ));
    }

    #[test]
    fn test_commands_require_a_valid_session() {
        let manager = manager();
        let rex = Arc::new(RecordingObserver::new("REX"));
        let connection_id = manager.connect(rex).unwrap();

        assert!(matches!(
            manager.get_market_state("ANN", connection_id).unwrap_err(),
            SessionError::UserNotConnected(_)
        ));
        assert!(matches!(
            manager.get_market_state("REX", connection_id + 1).unwrap_err(),
            SessionError::InvalidConnectionId { .. }
        ));
        manager.get_market_state("REX", connection_id).unwrap();
    }

    #[test]
    fn test_submit_order_forwards_to_the_registry() {
        let manager = manager();
        let rex = Arc::new(RecordingObserver::new("REX"));
        let connection_id = manager.connect(rex).unwrap();

        // Market is CLOSED, so the engine rejects the admission.
        let err = manager
            .submit_order("REX", connection_id, "IBM", Price::limit(1000), 100, Side::Buy)
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Engine(EngineError::InvalidMarketState(_))
        ));
    }

    #[test]
    fn test_crossed_quote_is_rejected_before_any_mutation() {
        let manager = manager();
        let rex = Arc::new(RecordingObserver::new("REX"));
        let connection_id = manager.connect(rex).unwrap();

        let err = manager
            .submit_quote(
                "REX",
                connection_id,
                "IBM",
                Price::limit(1010),
                100,
                Price::limit(1000),
                100,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Engine(EngineError::DataValidation(_))
        ));
        let (buy_depth, sell_depth) = manager.get_book_depth("REX", connection_id, "IBM").unwrap();
        assert_eq!(buy_depth, vec!["<Empty>"]);
        assert_eq!(sell_depth, vec!["<Empty>"]);
    }

    #[test]
    fn test_subscription_round_trip() {
        let manager = manager();
        let rex = Arc::new(RecordingObserver::new("REX"));
        let connection_id = manager.connect(rex).unwrap();

        manager
            .subscribe_current_market("REX", connection_id, "IBM")
            .unwrap();
        let err = manager
            .subscribe_current_market("REX", connection_id, "IBM")
            .unwrap_err();
        assert!(matches!(err, SessionError::MarketData(_)));
        manager
            .unsubscribe_current_market("REX", connection_id, "IBM")
            .unwrap();
        manager
            .subscribe_current_market("REX", connection_id, "IBM")
            .unwrap();
    }

    #[test]
    fn test_products_are_sorted() {
        let hub = Arc::new(EventHub::new());
        let registry = Arc::new(ProductRegistry::new(hub.clone(), EngineConfig::default()));
        registry.create_product("MSFT").unwrap();
        registry.create_product("AAPL").unwrap();
        registry.create_product("IBM").unwrap();
        let manager = SessionManager::new(registry, hub);

        let rex = Arc::new(RecordingObserver::new("REX"));
        let connection_id = manager.connect(rex).unwrap();
        assert_eq!(
            manager.get_products("REX", connection_id).unwrap(),
            vec!["AAPL".to_string(), "IBM".to_string(), "MSFT".to_string()]
        );
    }

    #[test]
    fn test_empty_arguments_are_rejected() {
        let manager = manager();
        let rex = Arc::new(RecordingObserver::new("REX"));
        let connection_id = manager.connect(rex).unwrap();

        assert!(matches!(
            manager
                .submit_order("REX", connection_id, "", Price::limit(1000), 100, Side::Buy)
                .unwrap_err(),
            SessionError::InvalidData(_)
        ));
        assert!(matches!(
            manager
                .submit_order_cancel("REX", connection_id, "IBM", Side::Buy, "")
                .unwrap_err(),
            SessionError::InvalidData(_)
        ));
    }
}

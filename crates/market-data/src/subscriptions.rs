//! Per-topic subscription table
//!
//! Every publisher keys its subscribers by product topic, with each user
//! appearing at most once per topic. The table is shared by all four
//! publishers; the message publisher layers its broadcast set on top.

use crate::error::{MarketDataError, Result};
use crate::observer::MarketObserver;
use std::collections::HashMap;
use std::sync::Arc;

/// Mapping of product topic to the observers subscribed to it
#[derive(Default)]
pub struct SubscriberTable {
    topics: HashMap<String, HashMap<String, Arc<dyn MarketObserver>>>,
}

impl SubscriberTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe an observer to a product topic
    ///
    /// A topic springs into existence on first subscription. Fails with
    /// `AlreadySubscribed` when the observer's user already appears under
    /// the topic.
    pub fn subscribe(&mut self, observer: Arc<dyn MarketObserver>, product: &str) -> Result<()> {
        let user = observer.user_name().to_string();
        let topic = self.topics.entry(product.to_string()).or_default();
        if topic.contains_key(&user) {
            return Err(MarketDataError::AlreadySubscribed {
                user,
                product: product.to_string(),
            });
        }
        topic.insert(user, observer);
        Ok(())
    }

    /// Remove a user's subscription to a product topic
    ///
    /// Fails with `InvalidStock` when the topic has never been subscribed
    /// to, and `NotSubscribed` when the user is not in the topic's set.
    pub fn unsubscribe(&mut self, user: &str, product: &str) -> Result<()> {
        let topic = self
            .topics
            .get_mut(product)
            .ok_or_else(|| MarketDataError::InvalidStock(product.to_string()))?;
        if topic.remove(user).is_none() {
            return Err(MarketDataError::NotSubscribed {
                user: user.to_string(),
                product: product.to_string(),
            });
        }
        Ok(())
    }

    /// All observers subscribed to a product topic
    pub fn subscribers(&self, product: &str) -> Vec<Arc<dyn MarketObserver>> {
        self.topics
            .get(product)
            .map(|topic| topic.values().cloned().collect())
            .unwrap_or_default()
    }

    /// The observer a user registered under a product topic, if any
    pub fn subscriber(&self, product: &str, user: &str) -> Option<Arc<dyn MarketObserver>> {
        self.topics.get(product)?.get(user).cloned()
    }

    /// Returns true if the user is subscribed to any topic in this table
    pub fn has_user(&self, user: &str) -> bool {
        self.topics.values().any(|topic| topic.contains_key(user))
    }
}

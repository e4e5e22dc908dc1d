//! In-memory subscription registry.

use dashmap::DashMap;
use std::sync::Arc;

use crate::observability::metrics;

/// A thread-safe map of connection id -> destination webhook URL.
///
/// Cloning is cheap and every clone shares the same map. Writes to one
/// connection id never block readers of another: the map is sharded.
#[derive(Clone, Default, Debug)]
pub struct SubscriptionRegistry {
    inner: Arc<DashMap<String, String>>,
}

impl SubscriptionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `connection_id` to `webhook_url`, replacing any previous binding.
    ///
    /// The URL is stored as given; it is only validated when a delivery is
    /// forwarded. Returns the destination that was replaced, if any.
    pub fn subscribe(&self, connection_id: impl Into<String>, webhook_url: impl Into<String>) -> Option<String> {
        let previous = self.inner.insert(connection_id.into(), webhook_url.into());
        metrics::record_subscription_event("subscribe");
        metrics::record_active_subscriptions(self.inner.len());
        previous
    }

    /// Remove the binding for `connection_id`. Unknown ids are a no-op.
    pub fn unsubscribe(&self, connection_id: &str) -> Option<String> {
        let removed = self.inner.remove(connection_id).map(|(_, url)| url);
        metrics::record_subscription_event("unsubscribe");
        metrics::record_active_subscriptions(self.inner.len());
        removed
    }

    /// Current destination for `connection_id`, if subscribed.
    pub fn resolve(&self, connection_id: &str) -> Option<String> {
        self.inner.get(connection_id).map(|r| r.value().clone())
    }

    /// Number of active subscriptions.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

//! Shared application state.

use std::sync::Arc;

use swapflow_core::outbox::OutboxStore;
use swapflow_stats::PublisherHandle;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Outbox new swaps are appended to.
    pub store: Arc<dyn OutboxStore>,
    /// Registers WebSocket subscribers with the stats publisher.
    pub stats: PublisherHandle,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(store: Arc<dyn OutboxStore>, stats: PublisherHandle) -> Self {
        Self { store, stats }
    }
}

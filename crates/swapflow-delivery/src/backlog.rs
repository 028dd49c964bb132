//! Backlog depth monitoring.
//!
//! The backlog is unbounded. When workers fall behind the sink, the monitor
//! raises a warning instead of shedding or blocking writes.

use std::sync::Arc;
use std::time::Duration;

use swapflow_core::outbox::OutboxStore;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Result of one backlog check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacklogStatus {
    /// Depth at or below the threshold.
    Healthy(u64),
    /// Depth above the threshold.
    OverThreshold(u64),
    /// The depth could not be read.
    Unknown,
}

/// Reads the backlog depth once and logs it against `threshold`.
pub async fn check_backlog(store: &dyn OutboxStore, threshold: u64) -> BacklogStatus {
    match store.backlog_depth().await {
        Ok(depth) if depth > threshold => {
            warn!(depth, threshold, "outbox backlog above threshold");
            BacklogStatus::OverThreshold(depth)
        }
        Ok(depth) => {
            debug!(depth, "outbox backlog");
            BacklogStatus::Healthy(depth)
        }
        Err(e) => {
            error!(error = %e, "failed to read outbox backlog");
            BacklogStatus::Unknown
        }
    }
}

/// Checks the backlog every `interval` until `shutdown` is cancelled. A
/// `threshold` of zero disables monitoring.
pub async fn run_backlog_monitor(
    store: Arc<dyn OutboxStore>,
    interval: Duration,
    threshold: u64,
    shutdown: CancellationToken,
) {
    if threshold == 0 {
        debug!("backlog monitor disabled");
        return;
    }

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                check_backlog(store.as_ref(), threshold).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swapflow_core::token::Token;
    use swapflow_test_support::{FailingOutboxStore, InMemoryOutboxStore, make_swap};

    async fn store_with_depth(depth: usize) -> InMemoryOutboxStore {
        let store = InMemoryOutboxStore::new();
        for _ in 0..depth {
            store.append(&make_swap(Token::Btc, "1", "1")).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_depth_at_threshold_is_healthy() {
        let store = store_with_depth(3).await;

        assert_eq!(check_backlog(&store, 3).await, BacklogStatus::Healthy(3));
    }

    #[tokio::test]
    async fn test_depth_above_threshold_is_flagged() {
        let store = store_with_depth(4).await;

        assert_eq!(check_backlog(&store, 3).await, BacklogStatus::OverThreshold(4));
    }

    #[tokio::test]
    async fn test_storage_failure_is_unknown() {
        assert_eq!(check_backlog(&FailingOutboxStore, 3).await, BacklogStatus::Unknown);
    }

    #[tokio::test]
    async fn test_zero_threshold_disables_monitor() {
        let store: Arc<dyn OutboxStore> = Arc::new(FailingOutboxStore);

        // Returns immediately without waiting for cancellation.
        tokio::time::timeout(
            Duration::from_secs(1),
            run_backlog_monitor(store, Duration::from_millis(5), 0, CancellationToken::new()),
        )
        .await
        .expect("disabled monitor returns");
    }

    #[tokio::test]
    async fn test_monitor_stops_on_shutdown() {
        let store: Arc<dyn OutboxStore> = Arc::new(store_with_depth(1).await);
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(run_backlog_monitor(
            store,
            Duration::from_millis(5),
            10,
            shutdown.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("monitor stops")
            .unwrap();
    }
}

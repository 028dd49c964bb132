//! A single delivery worker.

use std::sync::Arc;
use std::time::{Duration, Instant};

use swapflow_core::outbox::OutboxStore;
use swapflow_core::sink::SwapSink;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::forwarder::SinkForwarder;

/// Polling parameters shared by every worker of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSettings {
    /// Time between two claim attempts.
    pub poll_interval: Duration,
    /// Maximum number of swaps claimed per attempt.
    pub batch_size: usize,
}

impl WorkerSettings {
    /// Deadline for one claim attempt: nine tenths of the poll interval, so an
    /// attempt always finishes before the next tick is due.
    #[must_use]
    pub fn claim_deadline(&self) -> Duration {
        self.poll_interval * 9 / 10
    }
}

/// What happened on one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A batch was claimed, pushed and removed from the backlog.
    Delivered(usize),
    /// Nothing was claimable.
    Idle,
    /// The store or the sink failed; the claim was rolled back.
    Failed,
    /// The attempt ran past its deadline and was abandoned.
    DeadlineExceeded,
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Runs one claim attempt under the tick deadline.
///
/// Hitting the deadline drops the claim future, which rolls its transaction
/// back; the swaps stay in the backlog for the next tick of any worker.
pub async fn run_tick(
    worker_id: usize,
    store: &dyn OutboxStore,
    forwarder: &SinkForwarder,
    settings: &WorkerSettings,
) -> TickOutcome {
    let started = Instant::now();
    let deadline = settings.claim_deadline();

    match tokio::time::timeout(
        deadline,
        store.claim_process_delete(settings.batch_size, forwarder),
    )
    .await
    {
        Ok(Ok(0)) => TickOutcome::Idle,
        Ok(Ok(delivered)) => {
            info!(
                worker_id,
                delivered,
                elapsed_ms = elapsed_ms(started),
                "swaps delivered"
            );
            TickOutcome::Delivered(delivered)
        }
        Ok(Err(e)) => {
            error!(
                worker_id,
                error = %e,
                elapsed_ms = elapsed_ms(started),
                "claim failed"
            );
            TickOutcome::Failed
        }
        Err(_) => {
            warn!(
                worker_id,
                deadline_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
                "claim deadline exceeded, dropping tick"
            );
            TickOutcome::DeadlineExceeded
        }
    }
}

/// Polls the outbox every `settings.poll_interval` until `shutdown` is
/// cancelled. At most one claim is in flight per worker; ticks missed while a
/// claim runs are skipped, not replayed.
pub async fn run_worker(
    worker_id: usize,
    store: Arc<dyn OutboxStore>,
    sink: Arc<dyn SwapSink>,
    settings: WorkerSettings,
    shutdown: CancellationToken,
) {
    let forwarder = SinkForwarder::new(sink);
    let mut ticker = tokio::time::interval(settings.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(worker_id, "worker started");
    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }
        tokio::select! {
            () = shutdown.cancelled() => break,
            _ = run_tick(worker_id, store.as_ref(), &forwarder, &settings) => {}
        }
    }
    info!(worker_id, "worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use swapflow_core::swap::Swap;
    use swapflow_core::token::Token;
    use swapflow_test_support::{
        FailingOutboxStore, FailingSink, InMemoryOutboxStore, RecordingSink, make_swap,
    };

    fn settings(poll_ms: u64) -> WorkerSettings {
        WorkerSettings {
            poll_interval: Duration::from_millis(poll_ms),
            batch_size: 10,
        }
    }

    async fn store_with(swaps: &[Swap]) -> InMemoryOutboxStore {
        let store = InMemoryOutboxStore::new();
        for swap in swaps {
            store.append(swap).await.unwrap();
        }
        store
    }

    #[test]
    fn test_claim_deadline_is_shorter_than_interval() {
        assert_eq!(settings(100).claim_deadline(), Duration::from_millis(90));
        assert!(settings(1).claim_deadline() < Duration::from_millis(1));
    }

    #[tokio::test]
    async fn test_tick_delivers_backlog_in_append_order() {
        // Arrange
        let swaps = vec![
            make_swap(Token::Btc, "1", "1"),
            make_swap(Token::Eth, "2", "2"),
            make_swap(Token::Btc, "3", "3"),
        ];
        let store = store_with(&swaps).await;
        let sink = Arc::new(RecordingSink::new());
        let forwarder = SinkForwarder::new(sink.clone());

        // Act
        let outcome = run_tick(0, &store, &forwarder, &settings(1_000)).await;

        // Assert
        assert_eq!(outcome, TickOutcome::Delivered(3));
        assert_eq!(sink.batches(), vec![swaps]);
        assert_eq!(store.backlog_depth().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_tick_on_empty_backlog_is_idle() {
        let store = InMemoryOutboxStore::new();
        let sink = Arc::new(RecordingSink::new());
        let forwarder = SinkForwarder::new(sink.clone());

        let outcome = run_tick(0, &store, &forwarder, &settings(1_000)).await;

        assert_eq!(outcome, TickOutcome::Idle);
        assert!(sink.batches().is_empty());
    }

    #[tokio::test]
    async fn test_failed_push_keeps_swaps_for_next_tick() {
        // Arrange
        let swaps = vec![make_swap(Token::Kol, "1", "1"), make_swap(Token::Kol, "2", "2")];
        let store = store_with(&swaps).await;
        let failing = Arc::new(FailingSink::new());

        // Act
        let outcome = run_tick(0, &store, &SinkForwarder::new(failing.clone()), &settings(1_000)).await;

        // Assert
        assert_eq!(outcome, TickOutcome::Failed);
        assert_eq!(failing.attempts(), 1);
        assert_eq!(store.pending_ids(), swaps.iter().map(Swap::id).collect::<Vec<_>>());

        // The next tick re-claims the same swaps.
        let sink = Arc::new(RecordingSink::new());
        let retry = run_tick(1, &store, &SinkForwarder::new(sink.clone()), &settings(1_000)).await;
        assert_eq!(retry, TickOutcome::Delivered(2));
        assert_eq!(sink.swaps(), swaps);
    }

    #[tokio::test]
    async fn test_slow_sink_hits_deadline_and_rolls_back() {
        let swaps = vec![make_swap(Token::Btc, "1", "1")];
        let store = store_with(&swaps).await;
        let sink = Arc::new(RecordingSink::with_delay(Duration::from_millis(500)));
        let forwarder = SinkForwarder::new(sink.clone());

        let outcome = run_tick(0, &store, &forwarder, &settings(50)).await;

        assert_eq!(outcome, TickOutcome::DeadlineExceeded);
        assert!(sink.batches().is_empty());
        assert_eq!(store.backlog_depth().await.unwrap(), 1);
        assert!(store.deleted_ids().is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_is_reported_not_raised() {
        let sink = Arc::new(RecordingSink::new());

        let outcome = run_tick(
            0,
            &FailingOutboxStore,
            &SinkForwarder::new(sink.clone()),
            &settings(1_000),
        )
        .await;

        assert_eq!(outcome, TickOutcome::Failed);
        assert!(sink.batches().is_empty());
    }

    #[tokio::test]
    async fn test_two_workers_compete_for_single_record() {
        // Arrange
        let store = store_with(&[make_swap(Token::Eth, "1", "1")]).await;
        let sink = Arc::new(RecordingSink::with_delay(Duration::from_millis(20)));
        let forwarder = SinkForwarder::new(sink.clone());
        let settings = settings(1_000);

        // Act
        let (first, second) = tokio::join!(
            run_tick(0, &store, &forwarder, &settings),
            run_tick(1, &store, &forwarder, &settings),
        );

        // Assert
        let mut outcomes = [first, second];
        outcomes.sort_by_key(|o| matches!(o, TickOutcome::Idle));
        assert_eq!(outcomes, [TickOutcome::Delivered(1), TickOutcome::Idle]);
        assert_eq!(sink.swaps().len(), 1);
        assert_eq!(store.deleted_ids().len(), 1);
    }

    #[tokio::test]
    async fn test_worker_stops_on_shutdown() {
        let store: Arc<dyn OutboxStore> = Arc::new(InMemoryOutboxStore::new());
        let sink: Arc<dyn SwapSink> = Arc::new(RecordingSink::new());
        let shutdown = CancellationToken::new();

        let handle = tokio::spawn(run_worker(0, store, sink, settings(10), shutdown.clone()));
        shutdown.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("worker exits after cancellation")
            .unwrap();
    }
}

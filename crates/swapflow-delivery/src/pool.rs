//! A fixed set of delivery workers sharing one store and one sink.

use std::sync::Arc;

use swapflow_core::outbox::OutboxStore;
use swapflow_core::sink::SwapSink;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::worker::{WorkerSettings, run_worker};

/// Handle to a running pool of workers.
#[derive(Debug)]
pub struct WorkerPool {
    tasks: JoinSet<()>,
}

impl WorkerPool {
    /// Spawns `workers` independent worker loops. They stop when `shutdown`
    /// is cancelled.
    #[must_use]
    pub fn spawn(
        workers: usize,
        store: &Arc<dyn OutboxStore>,
        sink: &Arc<dyn SwapSink>,
        settings: WorkerSettings,
        shutdown: &CancellationToken,
    ) -> Self {
        let mut tasks = JoinSet::new();
        for worker_id in 0..workers {
            tasks.spawn(run_worker(
                worker_id,
                Arc::clone(store),
                Arc::clone(sink),
                settings,
                shutdown.clone(),
            ));
        }
        info!(
            workers,
            poll_interval_ms = u64::try_from(settings.poll_interval.as_millis()).unwrap_or(u64::MAX),
            batch_size = settings.batch_size,
            "worker pool started"
        );
        Self { tasks }
    }

    /// Number of workers still running.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns `true` once every worker has exited.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Waits for every worker to exit. A panicking worker is logged and does
    /// not take the others down.
    pub async fn join(mut self) {
        while let Some(result) = self.tasks.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "worker task failed");
            }
        }
        info!("worker pool stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::Duration;

    use super::*;
    use swapflow_core::token::Token;
    use swapflow_test_support::{InMemoryOutboxStore, RecordingSink, make_swap};

    #[tokio::test]
    async fn test_pool_drains_backlog_exactly_once() {
        // Arrange
        let store = Arc::new(InMemoryOutboxStore::new());
        let mut appended = Vec::new();
        for i in 0..50 {
            let token = Token::ALL[i % Token::ALL.len()];
            let swap = make_swap(token, "1", "1");
            store.append(&swap).await.unwrap();
            appended.push(swap.id());
        }
        let sink = Arc::new(RecordingSink::with_delay(Duration::from_millis(5)));
        let shutdown = CancellationToken::new();
        let settings = WorkerSettings {
            poll_interval: Duration::from_millis(20),
            batch_size: 7,
        };

        // Act
        let store_dyn: Arc<dyn OutboxStore> = store.clone();
        let sink_dyn: Arc<dyn SwapSink> = sink.clone();
        let pool = WorkerPool::spawn(3, &store_dyn, &sink_dyn, settings, &shutdown);
        assert_eq!(pool.len(), 3);
        tokio::time::timeout(Duration::from_secs(5), async {
            while store.backlog_depth().await.unwrap() > 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("backlog drained");
        shutdown.cancel();
        pool.join().await;

        // Assert
        let delivered: Vec<_> = sink.swaps().iter().map(|s| s.id()).collect();
        assert_eq!(delivered.len(), 50);
        let unique: HashSet<_> = delivered.iter().copied().collect();
        assert_eq!(unique, appended.iter().copied().collect());
        assert!(sink.batches().iter().all(|b| b.len() <= 7));
    }

    #[tokio::test]
    async fn test_join_returns_after_shutdown() {
        let store: Arc<dyn OutboxStore> = Arc::new(InMemoryOutboxStore::new());
        let sink: Arc<dyn SwapSink> = Arc::new(RecordingSink::new());
        let shutdown = CancellationToken::new();
        let pool = WorkerPool::spawn(
            2,
            &store,
            &sink,
            WorkerSettings {
                poll_interval: Duration::from_millis(10),
                batch_size: 1,
            },
            &shutdown,
        );

        shutdown.cancel();

        tokio::time::timeout(Duration::from_secs(1), pool.join())
            .await
            .expect("pool stops");
    }
}

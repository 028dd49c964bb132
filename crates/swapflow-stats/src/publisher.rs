//! Periodic snapshot fan-out.
//!
//! Each subscriber owns a bounded channel. A subscriber that cannot take the
//! next snapshot immediately, because its queue is full or its receiver is
//! gone, is dropped; dropping its sender ends its stream.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::aggregator::WindowAggregator;
use crate::snapshot::StatsSnapshot;

type Subscriber = mpsc::Sender<Arc<StatsSnapshot>>;

/// Cloneable handle for registering subscribers with a running publisher.
#[derive(Debug, Clone)]
pub struct PublisherHandle {
    registrations: mpsc::UnboundedSender<Subscriber>,
    buffer: usize,
}

impl PublisherHandle {
    /// Registers a new subscriber and returns its receiving end.
    ///
    /// If the publisher has stopped, the returned receiver is already closed.
    #[must_use]
    pub fn subscribe(&self) -> mpsc::Receiver<Arc<StatsSnapshot>> {
        let (tx, rx) = mpsc::channel(self.buffer);
        if self.registrations.send(tx).is_err() {
            debug!("publisher stopped, subscription closed");
        }
        rx
    }
}

/// Recomputes a snapshot on every tick and sends it to all subscribers.
pub struct StatsPublisher {
    aggregator: WindowAggregator,
    interval: Duration,
    registrations: mpsc::UnboundedReceiver<Subscriber>,
    subscribers: Vec<Subscriber>,
}

impl StatsPublisher {
    /// Creates a publisher ticking every `interval`; each subscriber may
    /// queue up to `buffer` snapshots.
    #[must_use]
    pub fn new(
        aggregator: WindowAggregator,
        interval: Duration,
        buffer: usize,
    ) -> (Self, PublisherHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let publisher = Self {
            aggregator,
            interval,
            registrations: rx,
            subscribers: Vec::new(),
        };
        let handle = PublisherHandle {
            registrations: tx,
            buffer: buffer.max(1),
        };
        (publisher, handle)
    }

    /// Number of subscribers kept after the last tick.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Runs one tick: admits pending subscribers and, if any are connected,
    /// computes one snapshot and offers it to each of them.
    ///
    /// Returns the number of subscribers that received the snapshot.
    pub async fn publish_once(&mut self) -> usize {
        while let Ok(subscriber) = self.registrations.try_recv() {
            self.subscribers.push(subscriber);
        }
        self.subscribers.retain(|s| !s.is_closed());
        if self.subscribers.is_empty() {
            return 0;
        }

        let snapshot = Arc::new(self.aggregator.snapshot().await);
        let before = self.subscribers.len();
        self.subscribers
            .retain(|s| match s.try_send(Arc::clone(&snapshot)) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    debug!("subscriber lagging, dropping it");
                    false
                }
                Err(TrySendError::Closed(_)) => false,
            });

        let delivered = self.subscribers.len();
        if delivered < before {
            debug!(dropped = before - delivered, remaining = delivered, "subscribers removed");
        }
        delivered
    }

    /// Ticks until `shutdown` is cancelled. Ticks missed while a snapshot is
    /// being computed are skipped.
    pub async fn run(mut self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX),
            "stats publisher started"
        );
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.publish_once().await;
                }
            }
        }
        info!("stats publisher stopped");
    }
}

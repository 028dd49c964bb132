//! Test sinks: mock `SwapSink` implementations for tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use swapflow_core::error::SinkError;
use swapflow_core::sink::SwapSink;
use swapflow_core::swap::Swap;

/// A sink that records every pushed batch. Optionally sleeps before
/// accepting, to simulate a slow backend.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pushed: Mutex<Vec<Vec<Swap>>>,
    delay: Option<Duration>,
}

impl RecordingSink {
    /// Creates a sink that accepts immediately.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink that waits `delay` before accepting each batch.
    #[must_use]
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            pushed: Mutex::new(Vec::new()),
            delay: Some(delay),
        }
    }

    /// Returns a snapshot of all batches accepted so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn batches(&self) -> Vec<Vec<Swap>> {
        self.pushed.lock().unwrap().clone()
    }

    /// All accepted swaps, flattened in push order.
    pub fn swaps(&self) -> Vec<Swap> {
        self.batches().into_iter().flatten().collect()
    }
}

#[async_trait]
impl SwapSink for RecordingSink {
    async fn push_batch(&self, swaps: &[Swap]) -> Result<(), SinkError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.pushed.lock().unwrap().push(swaps.to_vec());
        Ok(())
    }
}

/// A sink that always rejects pushes and counts attempts.
#[derive(Debug, Default)]
pub struct FailingSink {
    attempts: AtomicUsize,
}

impl FailingSink {
    /// Creates a failing sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of push attempts seen.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SwapSink for FailingSink {
    async fn push_batch(&self, _swaps: &[Swap]) -> Result<(), SinkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(SinkError::Rejected {
            status: 503,
            message: "service unavailable".into(),
        })
    }
}

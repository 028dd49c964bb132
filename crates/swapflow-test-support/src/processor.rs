//! Test processors: `BatchProcessor` implementations for store tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use swapflow_core::error::SinkError;
use swapflow_core::outbox::BatchProcessor;
use swapflow_core::swap::Swap;

/// A processor that records every batch it is handed and reports the whole
/// batch as delivered.
#[derive(Debug, Default)]
pub struct RecordingProcessor {
    batches: Mutex<Vec<Vec<Swap>>>,
}

impl RecordingProcessor {
    /// Creates a processor with no recorded batches.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all batches processed so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn batches(&self) -> Vec<Vec<Swap>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl BatchProcessor for RecordingProcessor {
    async fn process(&self, swaps: &[Swap]) -> Result<usize, SinkError> {
        self.batches.lock().unwrap().push(swaps.to_vec());
        Ok(swaps.len())
    }
}

/// A processor that always fails with `SinkError::Unavailable` and counts how
/// often it was called.
#[derive(Debug, Default)]
pub struct FailingProcessor {
    calls: AtomicUsize,
}

impl FailingProcessor {
    /// Creates a failing processor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `process` was called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BatchProcessor for FailingProcessor {
    async fn process(&self, _swaps: &[Swap]) -> Result<usize, SinkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(SinkError::Unavailable("connection refused".into()))
    }
}

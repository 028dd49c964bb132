//! Test stores: in-memory `OutboxStore` implementations for tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use swapflow_core::error::OutboxError;
use swapflow_core::outbox::{BatchProcessor, OutboxStore};
use swapflow_core::swap::{Swap, SwapId};

#[derive(Debug)]
struct Record {
    swap: Swap,
    claimed: bool,
}

#[derive(Debug, Default)]
struct State {
    next_sequence: i64,
    records: BTreeMap<i64, Record>,
    appended_ids: HashSet<SwapId>,
    deleted: Vec<SwapId>,
}

/// An outbox store that keeps records in memory and mimics
/// `FOR UPDATE SKIP LOCKED`: rows held by an open claim are invisible to other
/// claims, and a claim that errors or is dropped before committing releases
/// its rows.
#[derive(Debug, Default)]
pub struct InMemoryOutboxStore {
    state: Mutex<State>,
}

impl InMemoryOutboxStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of swaps still waiting for delivery, in append order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn pending_ids(&self) -> Vec<SwapId> {
        self.state
            .lock()
            .unwrap()
            .records
            .values()
            .map(|r| r.swap.id())
            .collect()
    }

    /// Ids of every record deleted so far, in deletion order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn deleted_ids(&self) -> Vec<SwapId> {
        self.state.lock().unwrap().deleted.clone()
    }
}

/// Releases claimed rows on drop unless the claim committed.
struct ClaimGuard<'a> {
    state: &'a Mutex<State>,
    sequences: Vec<i64>,
    committed: bool,
}

impl ClaimGuard<'_> {
    fn commit(mut self) {
        let mut state = self.state.lock().unwrap();
        for sequence in &self.sequences {
            if let Some(record) = state.records.remove(sequence) {
                state.deleted.push(record.swap.id());
            }
        }
        self.committed = true;
    }
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Ok(mut state) = self.state.lock() {
            for sequence in &self.sequences {
                if let Some(record) = state.records.get_mut(sequence) {
                    record.claimed = false;
                }
            }
        }
    }
}

#[async_trait]
impl OutboxStore for InMemoryOutboxStore {
    async fn append(&self, swap: &Swap) -> Result<(), OutboxError> {
        let mut state = self.state.lock().unwrap();
        if !state.appended_ids.insert(swap.id()) {
            return Err(OutboxError::DuplicateKey(swap.id()));
        }
        state.next_sequence += 1;
        let sequence = state.next_sequence;
        state.records.insert(
            sequence,
            Record {
                swap: swap.clone(),
                claimed: false,
            },
        );
        Ok(())
    }

    async fn claim_process_delete(
        &self,
        max_batch: usize,
        processor: &dyn BatchProcessor,
    ) -> Result<usize, OutboxError> {
        let (guard, swaps) = {
            let mut state = self.state.lock().unwrap();
            let mut sequences = Vec::new();
            let mut swaps = Vec::new();
            for (sequence, record) in state
                .records
                .iter_mut()
                .filter(|(_, r)| !r.claimed)
                .take(max_batch)
            {
                record.claimed = true;
                sequences.push(*sequence);
                swaps.push(record.swap.clone());
            }
            let guard = ClaimGuard {
                state: &self.state,
                sequences,
                committed: false,
            };
            (guard, swaps)
        };

        if swaps.is_empty() {
            return Ok(0);
        }

        let delivered = processor.process(&swaps).await?;
        guard.commit();
        Ok(delivered)
    }

    async fn backlog_depth(&self) -> Result<u64, OutboxError> {
        let len = self.state.lock().unwrap().records.len();
        Ok(u64::try_from(len).unwrap_or(u64::MAX))
    }
}

/// An outbox store that always fails with `StorageUnavailable`. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingOutboxStore;

#[async_trait]
impl OutboxStore for FailingOutboxStore {
    async fn append(&self, _swap: &Swap) -> Result<(), OutboxError> {
        Err(OutboxError::StorageUnavailable("connection refused".into()))
    }

    async fn claim_process_delete(
        &self,
        _max_batch: usize,
        _processor: &dyn BatchProcessor,
    ) -> Result<usize, OutboxError> {
        Err(OutboxError::StorageUnavailable("connection refused".into()))
    }

    async fn backlog_depth(&self) -> Result<u64, OutboxError> {
        Err(OutboxError::StorageUnavailable("connection refused".into()))
    }
}

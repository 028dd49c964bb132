//! Outbox store abstraction.

use async_trait::async_trait;

use crate::error::{OutboxError, SinkError};
use crate::swap::Swap;

/// Callback run inside a claim transaction.
///
/// The claimed rows are deleted only if `process` returns `Ok`; any error
/// rolls the whole claim back.
#[async_trait]
pub trait BatchProcessor: Send + Sync {
    /// Handles a claimed batch, in append order, and reports how many swaps
    /// were delivered.
    async fn process(&self, swaps: &[Swap]) -> Result<usize, SinkError>;
}

/// Durable append log plus claim table for pending swaps.
#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Persists a swap and its outbox record in one transaction.
    async fn append(&self, swap: &Swap) -> Result<(), OutboxError>;

    /// Claims up to `max_batch` pending swaps, skipping rows locked by other
    /// claims, hands them to `processor` and deletes them on success.
    ///
    /// Returns the count reported by the processor, or `0` without calling it
    /// when nothing is claimable.
    async fn claim_process_delete(
        &self,
        max_batch: usize,
        processor: &dyn BatchProcessor,
    ) -> Result<usize, OutboxError>;

    /// Number of swaps waiting for delivery.
    async fn backlog_depth(&self) -> Result<u64, OutboxError>;
}

//! Sink abstractions: batch ingestion and range aggregation.

use async_trait::async_trait;

use crate::error::SinkError;
use crate::swap::Swap;
use crate::token::Token;
use crate::window::{LookbackWindow, WindowStat};

/// Destination for delivered swaps.
#[async_trait]
pub trait SwapSink: Send + Sync {
    /// Writes the whole batch in one call. All-or-nothing from the caller's
    /// side; no internal retry.
    async fn push_batch(&self, swaps: &[Swap]) -> Result<(), SinkError>;
}

/// Read side of the sink.
#[async_trait]
pub trait WindowSource: Send + Sync {
    /// Sums and counts the swaps of `token` over the trailing `window`.
    async fn range_aggregate(
        &self,
        token: Token,
        window: LookbackWindow,
    ) -> Result<WindowStat, SinkError>;
}

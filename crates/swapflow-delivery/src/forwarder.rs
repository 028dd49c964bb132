//! Batch processor that pushes claimed swaps to the sink.

use std::sync::Arc;

use async_trait::async_trait;
use swapflow_core::error::SinkError;
use swapflow_core::outbox::BatchProcessor;
use swapflow_core::sink::SwapSink;
use swapflow_core::swap::Swap;

/// Forwards every claimed batch to a `SwapSink` as a single push.
#[derive(Clone)]
pub struct SinkForwarder {
    sink: Arc<dyn SwapSink>,
}

impl SinkForwarder {
    /// Creates a forwarder for `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn SwapSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl BatchProcessor for SinkForwarder {
    async fn process(&self, swaps: &[Swap]) -> Result<usize, SinkError> {
        self.sink.push_batch(swaps).await?;
        Ok(swaps.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swapflow_core::token::Token;
    use swapflow_test_support::{FailingSink, RecordingSink, make_swap};

    #[tokio::test]
    async fn test_process_reports_whole_batch_on_success() {
        let sink = Arc::new(RecordingSink::new());
        let forwarder = SinkForwarder::new(sink.clone());
        let swaps = vec![make_swap(Token::Btc, "1", "1"), make_swap(Token::Eth, "2", "2")];

        let delivered = forwarder.process(&swaps).await.unwrap();

        assert_eq!(delivered, 2);
        assert_eq!(sink.batches(), vec![swaps]);
    }

    #[tokio::test]
    async fn test_process_propagates_sink_failure() {
        let sink = Arc::new(FailingSink::new());
        let forwarder = SinkForwarder::new(sink.clone());

        let result = forwarder.process(&[make_swap(Token::Kol, "1", "1")]).await;

        assert!(matches!(result, Err(SinkError::Rejected { status: 503, .. })));
        assert_eq!(sink.attempts(), 1);
    }
}

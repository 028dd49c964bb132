//! Composes per-token window stats into snapshots.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use swapflow_core::clock::{Clock, SystemClock};
use swapflow_core::error::SinkError;
use swapflow_core::sink::WindowSource;
use swapflow_core::token::Token;
use swapflow_core::window::{LookbackWindow, WindowStat};
use tracing::warn;

use crate::snapshot::{StatsSnapshot, TokenStats};

/// Default time budget for one token's queries.
pub const DEFAULT_QUERY_DEADLINE: Duration = Duration::from_secs(1);

/// Queries the sink for every token and window.
#[derive(Clone)]
pub struct WindowAggregator {
    source: Arc<dyn WindowSource>,
    clock: Arc<dyn Clock>,
    deadline: Duration,
}

impl WindowAggregator {
    /// Creates an aggregator over `source`, stamping snapshots with the
    /// system clock and giving each token [`DEFAULT_QUERY_DEADLINE`].
    #[must_use]
    pub fn new(source: Arc<dyn WindowSource>) -> Self {
        Self {
            source,
            clock: Arc::new(SystemClock),
            deadline: DEFAULT_QUERY_DEADLINE,
        }
    }

    /// Replaces the clock snapshots are stamped with.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the per-token query deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Stats of `token` over the four lookback windows.
    ///
    /// # Errors
    ///
    /// Returns the first `SinkError` of any window; partial results are
    /// discarded.
    pub async fn token_stats(&self, token: Token) -> Result<TokenStats, SinkError> {
        let [w1m, w5m, w1h, w24h] = LookbackWindow::ALL;
        let (w1m, w5m, w1h, w24h) = futures::try_join!(
            self.window(token, w1m),
            self.window(token, w5m),
            self.window(token, w1h),
            self.window(token, w24h),
        )?;
        Ok(TokenStats {
            token,
            w1m,
            w5m,
            w1h,
            w24h,
        })
    }

    async fn window(
        &self,
        token: Token,
        window: LookbackWindow,
    ) -> Result<WindowStat, SinkError> {
        self.source
            .range_aggregate(token, window)
            .await
            .map_err(|e| e.context(&format!("w{window}")))
    }

    async fn token_stats_within_deadline(&self, token: Token) -> Result<TokenStats, SinkError> {
        tokio::time::timeout(self.deadline, self.token_stats(token))
            .await
            .map_err(|_| SinkError::Unavailable("query deadline exceeded".into()))?
    }

    /// Builds a snapshot of every token, queried concurrently.
    ///
    /// A token whose queries fail is logged and left out; the rest of the
    /// snapshot is kept. Tokens appear in their canonical order.
    pub async fn snapshot(&self) -> StatsSnapshot {
        let at = self.clock.now();
        let results = join_all(
            Token::ALL
                .iter()
                .map(|&token| self.token_stats_within_deadline(token)),
        )
        .await;

        let by_token = Token::ALL
            .iter()
            .zip(results)
            .filter_map(|(token, result)| match result {
                Ok(stats) => Some(stats),
                Err(e) => {
                    warn!(token = %token, error = %e, "token stats unavailable");
                    None
                }
            })
            .collect();

        StatsSnapshot::new(at, by_token)
    }
}

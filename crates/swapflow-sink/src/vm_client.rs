//! HTTP client for VictoriaMetrics.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use swapflow_core::clock::{Clock, SystemClock};
use swapflow_core::error::SinkError;
use swapflow_core::sink::{SwapSink, WindowSource};
use swapflow_core::swap::Swap;
use swapflow_core::token::Token;
use swapflow_core::window::{LookbackWindow, WindowStat};
use tracing::{debug, instrument};

use crate::import::{self, AMOUNT_METRIC, AMOUNT_USD_METRIC, CSV_FORMAT};
use crate::query;

/// VictoriaMetrics client implementing both the push and the query side of
/// the sink.
#[derive(Clone)]
pub struct VmClient {
    http: reqwest::Client,
    import_url: String,
    query_url: String,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for VmClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VmClient")
            .field("import_url", &self.import_url)
            .field("query_url", &self.query_url)
            .finish_non_exhaustive()
    }
}

fn transport_error(e: reqwest::Error) -> SinkError {
    SinkError::Unavailable(e.to_string())
}

impl VmClient {
    /// Creates a client for the VictoriaMetrics instance at `base_url`. Every
    /// request is cut off after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `SinkError::Unavailable` if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SinkError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(transport_error)?;
        let base_url = base_url.trim_end_matches('/');
        Ok(Self {
            http,
            import_url: format!("{base_url}/api/v1/import/csv"),
            query_url: format!("{base_url}/api/v1/query_range"),
            clock: Arc::new(SystemClock),
        })
    }

    /// Replaces the clock range queries are anchored to.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Evaluates `expr` once, at the current time, and returns the decoded
    /// sample.
    async fn run_query(&self, expr: &str, window: LookbackWindow) -> Result<String, SinkError> {
        let at = format!("{:.3}", self.clock.unix_seconds());
        let response = self
            .http
            .get(&self.query_url)
            .query(&[
                ("query", expr),
                ("start", at.as_str()),
                ("end", at.as_str()),
                ("step", window.label()),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(transport_error)?;
        query::decode_response(status, &body)
    }
}

#[async_trait]
impl SwapSink for VmClient {
    #[instrument(skip(self, swaps), fields(batch = swaps.len()))]
    async fn push_batch(&self, swaps: &[Swap]) -> Result<(), SinkError> {
        if swaps.is_empty() {
            return Ok(());
        }

        let response = self
            .http
            .post(&self.import_url)
            .query(&[("format", CSV_FORMAT)])
            .body(import::encode_batch(swaps))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        debug!("pushed batch to sink");
        Ok(())
    }
}

#[async_trait]
impl WindowSource for VmClient {
    async fn range_aggregate(
        &self,
        token: Token,
        window: LookbackWindow,
    ) -> Result<WindowStat, SinkError> {
        let volume_expr = query::rollup("sum_over_time", AMOUNT_METRIC, token, window);
        let volume_usd_expr = query::rollup("sum_over_time", AMOUNT_USD_METRIC, token, window);
        let tx_count_expr = query::rollup("count_over_time", AMOUNT_METRIC, token, window);

        let (volume, volume_usd, tx_count) = tokio::try_join!(
            async {
                self.run_query(&volume_expr, window)
                    .await
                    .map_err(|e| e.context("volume query"))
            },
            async {
                self.run_query(&volume_usd_expr, window)
                    .await
                    .map_err(|e| e.context("volume usd query"))
            },
            async {
                self.run_query(&tx_count_expr, window)
                    .await
                    .map_err(|e| e.context("tx count query"))
            },
        )?;

        Ok(WindowStat {
            volume,
            volume_usd,
            tx_count,
        })
    }
}

//! Liveness plus outbox reachability.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Json, Router, routing::get};
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;

/// Body of GET /health.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    /// `ok` while the outbox answers, `degraded` otherwise.
    pub status: &'static str,
    pub version: &'static str,
    /// Undelivered swaps; absent when the outbox could not be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backlog: Option<u64>,
}

/// GET /health
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let version = env!("CARGO_PKG_VERSION");
    match state.store.backlog_depth().await {
        Ok(backlog) => (
            StatusCode::OK,
            Json(HealthReport {
                status: "ok",
                version,
                backlog: Some(backlog),
            }),
        ),
        Err(e) => {
            warn!(error = %e, "health check could not read outbox backlog");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthReport {
                    status: "degraded",
                    version,
                    backlog: None,
                }),
            )
        }
    }
}

/// Returns the health router.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use swapflow_core::outbox::OutboxStore;
    use swapflow_core::token::Token;
    use swapflow_stats::{StatsPublisher, WindowAggregator};
    use swapflow_test_support::{
        FailingOutboxStore, InMemoryOutboxStore, StubWindowSource, make_swap,
    };
    use tower::ServiceExt;

    async fn get_health(store: Arc<dyn OutboxStore>) -> (StatusCode, Value) {
        let aggregator = WindowAggregator::new(Arc::new(StubWindowSource::new()));
        let (_publisher, handle) = StatsPublisher::new(aggregator, Duration::from_millis(100), 2);
        let app = crate::routes::app(AppState::new(store, handle));

        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_reports_backlog_depth() {
        // Arrange
        let store = Arc::new(InMemoryOutboxStore::new());
        store.append(&make_swap(Token::Btc, "1", "1")).await.unwrap();
        store.append(&make_swap(Token::Eth, "2", "2")).await.unwrap();

        // Act
        let (status, json) = get_health(store).await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["backlog"], 2);
    }

    #[tokio::test]
    async fn test_unreachable_outbox_reports_degraded_503() {
        let (status, json) = get_health(Arc::new(FailingOutboxStore)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["status"], "degraded");
        assert!(json["version"].is_string());
        assert!(json.get("backlog").is_none());
    }
}

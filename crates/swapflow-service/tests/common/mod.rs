//! Shared test helpers for service integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use sqlx::PgPool;
use swapflow_outbox::pg_outbox_store::PgOutboxStore;
use swapflow_stats::{PublisherHandle, StatsPublisher, WindowAggregator};
use swapflow_test_support::StubWindowSource;
use tower::ServiceExt;

use swapflow_service::routes;
use swapflow_service::state::AppState;

/// A publisher handle whose publisher is never run.
fn idle_stats() -> PublisherHandle {
    let aggregator = WindowAggregator::new(Arc::new(StubWindowSource::new()));
    let (_publisher, handle) = StatsPublisher::new(aggregator, Duration::from_millis(100), 2);
    handle
}

/// Build the full app router on a real `PgOutboxStore`. Uses the same route
/// structure as `main.rs`.
pub fn build_test_app(pool: PgPool) -> Router {
    let store = Arc::new(PgOutboxStore::new(pool));
    routes::app(AppState::new(store, idle_stats()))
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(serde_json::Value::Null)
    };

    (status, json)
}

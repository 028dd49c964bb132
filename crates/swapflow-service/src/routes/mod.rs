//! HTTP routes.

pub mod health;
pub mod stats;
pub mod swaps;

use axum::Router;

use crate::state::AppState;

/// Builds the full application router, without middleware layers.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(stats::router())
        .nest("/api/v1/swaps", swaps::router())
        .with_state(state)
}

//! Swapflow API server entry point.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use swapflow_outbox::pg_outbox_store::PgOutboxStore;
use swapflow_service::config::ApiConfig;
use swapflow_service::error::AppError;
use swapflow_service::state::AppState;
use swapflow_service::{routes, shutdown, telemetry};
use swapflow_sink::VmClient;
use swapflow_stats::{StatsPublisher, WindowAggregator};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    telemetry::init();

    tracing::info!("Starting Swapflow API server");

    let config = ApiConfig::from_env()?;
    let addr = config.bind_addr()?;

    // Create database connection pool.
    let pool = PgPoolOptions::new()
        .max_connections(config.backend.db_max_connections)
        .connect(&config.backend.database_url)
        .await?;

    let vm = VmClient::new(&config.backend.vm_url, config.backend.sink_timeout)
        .map_err(|e| AppError::Config(format!("VM_URL: {e}")))?;
    let aggregator = WindowAggregator::new(Arc::new(vm));
    let (publisher, stats) =
        StatsPublisher::new(aggregator, config.stats_interval, config.subscriber_buffer);

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown::cancel_on_signal(shutdown.clone()));
    let publisher_task = tokio::spawn(publisher.run(shutdown.clone()));

    let app_state = AppState::new(Arc::new(PgOutboxStore::new(pool)), stats);

    // TODO: restrict CORS to the dashboard origin once it has a fixed host.
    let app = routes::app(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .await?;

    shutdown.cancel();
    if let Err(e) = publisher_task.await {
        tracing::error!(error = %e, "stats publisher task failed");
    }
    tracing::info!("Swapflow API server stopped");

    Ok(())
}

//! Swapflow delivery worker entry point.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use swapflow_core::outbox::OutboxStore;
use swapflow_core::sink::SwapSink;
use swapflow_delivery::{WorkerPool, WorkerSettings, run_backlog_monitor};
use swapflow_outbox::pg_outbox_store::PgOutboxStore;
use swapflow_service::config::WorkerConfig;
use swapflow_service::error::AppError;
use swapflow_service::{shutdown, telemetry};
use swapflow_sink::VmClient;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    telemetry::init();

    tracing::info!("Starting Swapflow delivery worker");

    let config = WorkerConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.backend.db_max_connections)
        .connect(&config.backend.database_url)
        .await?;

    let store: Arc<dyn OutboxStore> = Arc::new(PgOutboxStore::new(pool));
    let sink: Arc<dyn SwapSink> = Arc::new(
        VmClient::new(&config.backend.vm_url, config.backend.sink_timeout)
            .map_err(|e| AppError::Config(format!("VM_URL: {e}")))?,
    );

    let shutdown = CancellationToken::new();
    let settings = WorkerSettings {
        poll_interval: config.poll_interval,
        batch_size: config.batch_size,
    };
    let workers = WorkerPool::spawn(config.workers, &store, &sink, settings, &shutdown);
    let monitor = tokio::spawn(run_backlog_monitor(
        Arc::clone(&store),
        config.backlog_check_interval,
        config.backlog_warn_threshold,
        shutdown.clone(),
    ));

    shutdown::cancel_on_signal(shutdown.clone()).await;

    workers.join().await;
    if let Err(e) = monitor.await {
        tracing::error!(error = %e, "backlog monitor task failed");
    }
    tracing::info!("Swapflow delivery worker stopped");

    Ok(())
}

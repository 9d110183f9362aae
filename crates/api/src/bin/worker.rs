//! Queue worker: drains the `jobs` table and runs the maintenance scheduler.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{routing::get, Router};
use ceres_api::config::Config;
use ceres_api::jobs::{JobHandlers, JobScheduler, MaintenanceTask, PoolMetricsTask, Worker};
use ceres_api::middleware;
use ceres_api::services::{EmailService, FileStore, JobQueue, SlackClient};
use tokio::sync::watch;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    middleware::logging::init_logging(&config.logging);
    middleware::init_metrics()?;

    info!("Starting Ceres en Red worker v{}", env!("CARGO_PKG_VERSION"));

    let pool = persistence::db::create_pool(&config.database.pool_config()).await?;

    let handlers = JobHandlers::new(
        pool.clone(),
        EmailService::new(config.email.clone())?,
        SlackClient::new(&config.slack)?,
        FileStore::new(&config.storage),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let worker = Worker::new(pool.clone(), Arc::new(handlers), config.queue.clone());
    let consumers = worker.start(shutdown_rx.clone());

    let queue = JobQueue::new(pool.clone(), config.queue.max_attempts);
    let mut scheduler = JobScheduler::new();
    for task in MaintenanceTask::defaults(&config.queue, &queue) {
        scheduler.register(task);
    }
    scheduler.register(PoolMetricsTask::new(pool.clone()));
    scheduler.start();

    if config.queue.metrics_port != 0 {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.queue.metrics_port));
        let mut metrics_shutdown = shutdown_rx.clone();
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Worker metrics listening on {}", addr);
        tokio::spawn(async move {
            let app = Router::new().route("/metrics", get(middleware::metrics_handler));
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = metrics_shutdown.changed().await;
                })
                .await;
            if let Err(e) = served {
                warn!("Metrics listener stopped: {}", e);
            }
        });
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, draining queues");

    let _ = shutdown_tx.send(true);
    scheduler.shutdown();

    let grace = Duration::from_secs(config.queue.shutdown_timeout_secs);
    scheduler.wait_for_shutdown(grace).await;
    for consumer in consumers {
        if let Err(e) = consumer.await {
            warn!("Consumer task panicked: {}", e);
        }
    }

    pool.close().await;
    info!("Worker stopped");
    Ok(())
}

use std::sync::Arc;

use servicedesk_core::core::config::Config;
use servicedesk_core::core::database;
use servicedesk_core::core::repositories::Repositories;
use servicedesk_core::core::services::Services;
use servicedesk_core::features::delays::DelaySyncWorker;
use servicedesk_core::features::tickets::HistoryWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    tracing::info!(
        "Configuration loaded (tokio_worker_threads={}, pid={})",
        worker_threads,
        std::process::id()
    );

    let pool = database::create_pool(&config.database).await?;

    tracing::info!("Running database migrations...");
    database::migrate(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed successfully");

    let repos = Repositories::postgres(pool.clone());

    let (history, history_handle) =
        HistoryWriter::spawn(repos.histories.clone(), config.history.queue_capacity);

    let services = Services::new(&repos, history, &config.tickets, &config.delay_sync);
    tracing::info!("Service layer wired");

    // The sweep worker shares the scheduler, so its cooldown also throttles
    // sweeps triggered from delay listings
    let worker = DelaySyncWorker::new(Arc::clone(&services.delay_sync), &config.delay_sync);
    let worker_handle = tokio::spawn(async move {
        worker.run().await;
    });
    tracing::info!(
        "Delay sync worker spawned (interval={:?}, cooldown={:?})",
        config.delay_sync.interval,
        config.delay_sync.cooldown
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");

    worker_handle.abort();
    services.history.flush().await;
    drop(services);
    if let Err(e) = history_handle.await {
        tracing::warn!("History writer ended abnormally: {}", e);
    }

    pool.close().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

//! `machwatch-guard` -- fault detection daemon.
//!
//! Polls the report stream, evaluates each report against its machine's
//! thresholds, and opens or merges issues. Machine statuses are kept in
//! step with the issues. Configuration is read from the environment; see
//! [`GuardConfig::from_env`].

use std::sync::Arc;
use std::time::Duration;

use machwatch_core::store::{LogStore, MachineDirectory, ReportSource};
use machwatch_db::PgStore;
use machwatch_events::EventBus;
use machwatch_guard::cache::MachineCache;
use machwatch_guard::feed::ReportFeed;
use machwatch_guard::ingest::Ingestor;
use machwatch_guard::status_sync::StatusSync;
use machwatch_guard::GuardConfig;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long each stage may take to wind down after shutdown starts.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "machwatch_guard=info,machwatch_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GuardConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });
    tracing::info!(
        poll_interval_ms = config.poll_interval.as_millis() as u64,
        batch_size = config.feed_batch_size,
        max_age_secs = config.report_max_age_secs,
        "Loaded guard configuration"
    );

    // --- Database ---
    let pool = machwatch_db::create_pool(&config.database_url, config.db_max_connections)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to connect to database");
            std::process::exit(1);
        });
    if let Err(e) = machwatch_db::health_check(&pool).await {
        tracing::error!(error = %e, "Database health check failed");
        std::process::exit(1);
    }
    if let Err(e) = machwatch_db::run_migrations(&pool).await {
        tracing::error!(error = %e, "Failed to run database migrations");
        std::process::exit(1);
    }
    tracing::info!("Database ready");

    let store = Arc::new(PgStore::new(pool));
    let logs: Arc<dyn LogStore> = store.clone();
    let directory: Arc<dyn MachineDirectory> = store.clone();
    let source: Arc<dyn ReportSource> = store;

    // --- Services ---
    let cache = Arc::new(MachineCache::new(directory.clone(), config.machine_cache_ttl));
    match cache.refresh().await {
        Ok(count) => tracing::info!(count, "Machine cache warmed"),
        Err(e) => tracing::warn!(error = %e, "Machine cache warm-up failed, loading lazily"),
    }

    let bus = Arc::new(EventBus::default());
    let sync_handle = tokio::spawn(StatusSync::new(logs.clone(), directory).run(bus.subscribe()));

    let (tx, rx) = tokio::sync::mpsc::channel(config.ingest_queue_capacity);
    let ingestor = Ingestor::new(logs, cache, bus.clone()).with_max_age(config.report_max_age());
    let ingest_handle = tokio::spawn(ingestor.run(rx));

    let cancel = CancellationToken::new();
    let feed = ReportFeed::new(source, config.poll_interval, config.feed_batch_size);
    let feed_handle = tokio::spawn(feed.run(tx, cancel.clone()));

    shutdown_signal().await;

    // --- Shutdown: stop polling, let ingestion drain, then close the bus ---
    cancel.cancel();
    let _ = tokio::time::timeout(SHUTDOWN_TIMEOUT, feed_handle).await;
    tracing::info!("Report feed stopped");

    let _ = tokio::time::timeout(SHUTDOWN_TIMEOUT, ingest_handle).await;
    tracing::info!("Ingestion drained");

    drop(bus);
    let _ = tokio::time::timeout(SHUTDOWN_TIMEOUT, sync_handle).await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

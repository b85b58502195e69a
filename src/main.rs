//! Bookshop - Catalog backend server
//!
//! Boots the HTTP API, the cache sweep task and the log job tracker.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bookshop::jobs::JobTracker;
use bookshop::{create_router, spawn_sweep_task, AppState, Config};

/// Main entry point for the bookshop server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the cache, catalog and log services
/// 4. Start the background cache sweep task
/// 5. Start HTTP server on configured port
/// 6. On SIGINT/SIGTERM stop the sweep task and cancel running jobs
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookshop=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting bookshop server");

    let config = Config::from_env();
    info!(
        cache_capacity = config.cache_capacity,
        cache_ttl_ms = config.cache_ttl_ms,
        sweep_interval = config.sweep_interval,
        port = config.server_port,
        logs_dir = %config.logs_dir.display(),
        "Configuration loaded"
    );

    let tracker = JobTracker::new();
    let state = AppState::from_config(&config, tracker.clone())
        .context("failed to initialize application state")?;

    let sweep_interval = if config.sweep_interval == 0 {
        warn!("SWEEP_INTERVAL of 0 is not allowed, using 1 second");
        std::time::Duration::from_secs(1)
    } else {
        config.sweep_interval()
    };
    let shutdown = CancellationToken::new();
    let sweep_handle = spawn_sweep_task(state.cache().clone(), sweep_interval, shutdown.clone());
    info!("Background sweep task started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    shutdown.cancel();
    tracker.shutdown();
    if let Err(err) = sweep_handle.await {
        error!(error = %err, "Sweep task ended abnormally");
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}

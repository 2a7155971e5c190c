//! reqpool soak driver - Entry Point
//!
//! Pushes synthetic proxy requests through the pools and reports reuse.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::signal;
use tracing::info;

use reqpool::driver::Driver;
use reqpool::metrics::METRICS;
use reqpool::{Config, ShardRegistry, VERSION};

/// Application entry point
#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("reqpool.toml"));

    // Load configuration, falling back to defaults without a file
    let config = if config_path.exists() {
        Config::load(&config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        Config::default()
    };

    // Initialize tracing/logging
    reqpool::util::init_tracing(&config.logging)?;

    info!(
        version = VERSION,
        config_path = ?config_path,
        "Starting reqpool soak driver"
    );

    // Initialize metrics if enabled
    if config.metrics.enabled {
        reqpool::metrics::init_metrics(&config.metrics)?;
        info!(
            bind_addr = %config.metrics.bind_addr,
            "Metrics endpoint started"
        );
    }

    let registry = ShardRegistry::new(&config.pool);
    info!(shards = registry.shard_count(), "Pool registry ready");

    let driver = Driver::new(registry, config.driver.clone())?;

    tokio::select! {
        report = driver.run() => {
            info!(
                requests = report.requests,
                leases_returned = report.leases_returned,
                errors = report.errors,
                "Driver finished"
            );
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received, stopping driver");
        }
    }

    let snapshot = METRICS.snapshot();
    info!(
        contexts = snapshot.contexts_created,
        leases_taken = snapshot.leases_taken,
        leases_outstanding = snapshot.leases_outstanding(),
        slab_fresh = snapshot.slab_fresh,
        slab_reused = snapshot.slab_reused,
        slab_discarded = snapshot.slab_discarded,
        "Pool summary"
    );
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

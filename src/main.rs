//! Bazaar Market Tracker
//!
//! Composition root: wires the snapshot feed, tracker store,
//! persistence sink and refresh scheduler together and runs the
//! refresh loop until ctrl-c.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bazaar_market_data::{Config, HttpFeed, LogSink, RefreshScheduler, TrackerStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    info!("Starting bazaar market tracker");

    // Load configuration
    let config = Config::load()?;
    info!(
        endpoint = %config.api_endpoint,
        interval_secs = config.refresh_interval_secs,
        history_capacity = config.history_capacity,
        "Configuration loaded"
    );

    // Wire components; the store instance is owned here, no globals
    let store = Arc::new(TrackerStore::new(
        config.history_capacity,
        Duration::from_secs(config.read_lock_timeout_secs),
    ));
    let feed = Arc::new(HttpFeed::new(
        &config.api_endpoint,
        Duration::from_secs(config.fetch_timeout_secs),
    )?);
    let sink = Arc::new(LogSink);

    let scheduler = RefreshScheduler::new(
        feed,
        store.clone(),
        sink,
        Duration::from_secs(config.refresh_interval_secs),
    );

    // Run the refresh loop until ctrl-c
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let refresh = tokio::spawn(async move { scheduler.run(shutdown_rx).await });

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    shutdown_tx.send(true).ok();
    refresh.await?;

    info!("Bazaar market tracker stopped");
    Ok(())
}

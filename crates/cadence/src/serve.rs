// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `cadence serve` command implementation.
//!
//! Wires the SQLite store, delivery channel, tracker, and orchestrator, then
//! runs the tick loop until SIGINT/SIGTERM. An in-flight tick is allowed to
//! finish before shutdown completes, so no batch is abandoned mid-dispatch.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use cadence_config::model::CadenceConfig;
use cadence_core::{CadenceError, CampaignStore, DeliveryChannel};
use cadence_delivery::DeliveryTracker;
use cadence_engine::{Orchestrator, run_tick_loop};
use cadence_storage::SqliteStore;

use crate::channel::ConsoleChannel;

/// Run the `cadence serve` command.
pub async fn run_serve(config: CadenceConfig) -> Result<(), CadenceError> {
    init_tracing(&config.engine.log_level);

    info!(name = %config.engine.name, "starting cadence serve");

    let sqlite = Arc::new(SqliteStore::open(&config.storage.database_path).await?);
    let store: Arc<dyn CampaignStore> = sqlite.clone();
    info!(path = %config.storage.database_path, "storage initialized");

    let channel: Arc<dyn DeliveryChannel> = Arc::new(ConsoleChannel::new());
    info!(channel = channel.name(), "delivery channel initialized");

    let tracker = Arc::new(DeliveryTracker::new(
        store.clone(),
        channel,
        &config.delivery,
    ));
    let orchestrator = Arc::new(Orchestrator::new(store, tracker, &config.engine));

    let shutdown = install_signal_handler();
    let tick_loop = tokio::spawn(run_tick_loop(
        orchestrator,
        Duration::from_secs(config.engine.tick_interval_secs),
        shutdown.clone(),
    ));

    shutdown.cancelled().await;
    // Let the in-flight tick finish rather than aborting mid-dispatch.
    if let Err(e) = tick_loop.await {
        debug!(error = %e, "tick loop task ended abnormally");
    }

    sqlite.close().await?;
    info!("cadence serve stopped");
    Ok(())
}

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is
/// received.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

            tokio::select! {
                _ = ctrl_c => {
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cadence={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

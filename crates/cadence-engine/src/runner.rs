// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The periodic tick loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::orchestrator::Orchestrator;

/// Drive the orchestrator on a fixed interval until `shutdown` is cancelled.
///
/// Each tick is awaited before the next fires, so ticks never overlap and
/// the selection phase stays non-reentrant. A pause command issued between
/// ticks therefore always takes effect before the next selection reads
/// schedule status; batches already in flight are allowed to finish.
pub async fn run_tick_loop(
    orchestrator: Arc<Orchestrator>,
    interval: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(interval_secs = interval.as_secs(), "tick loop started");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("tick loop stopping");
                break;
            }
            _ = ticker.tick() => {
                let summary = orchestrator.tick(Utc::now()).await;
                if summary.due == 0 && summary.sweep.attempted == 0 {
                    debug!("tick idle");
                }
            }
        }
    }
}

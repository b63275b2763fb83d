// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Derived dashboard aggregates.
//!
//! Everything here is a read-model over the store, recomputed on demand;
//! there are no hand-maintained global counters.

use chrono::{DateTime, Utc};

use cadence_core::{CadenceError, CampaignStore, RecipientFilter, ScheduleStatus};

/// Aggregates backing the dashboard's stat tiles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineStats {
    pub active_schedules: u64,
    pub total_recipients: u64,
    pub messages_sent_today: u64,
    pub messages_sent_total: u64,
    pub messages_failed_total: u64,
    /// sent / (sent + failed) over all terminal attempts; `None` before any
    /// attempt has reached a terminal state.
    pub delivery_success_rate: Option<f64>,
}

/// Collect stats at `now`. "Today" is the UTC calendar day of `now`.
pub async fn collect(
    store: &dyn CampaignStore,
    now: DateTime<Utc>,
) -> Result<EngineStats, CadenceError> {
    let active_schedules = store
        .list_schedules(Some(ScheduleStatus::Active))
        .await?
        .len() as u64;
    let total_recipients = store
        .list_recipients(&RecipientFilter::default())
        .await?
        .len() as u64;
    let totals = store.attempt_totals().await?;

    let midnight = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or(now);
    let messages_sent_today = store.sent_since(midnight).await?;

    let terminal = totals.sent + totals.failed;
    let delivery_success_rate = if terminal > 0 {
        Some(totals.sent as f64 / terminal as f64)
    } else {
        None
    };

    Ok(EngineStats {
        active_schedules,
        total_recipients,
        messages_sent_today,
        messages_sent_total: totals.sent,
        messages_failed_total: totals.failed,
        delivery_success_rate,
    })
}

// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-tick scheduling brain.
//!
//! One tick: select active schedules with `next_run_at <= now`, process each
//! independently (resolve, render, dispatch, advance recurrence state), then
//! sweep due retries. A failure in one schedule never blocks the others;
//! transient failures are left for the next tick, permanent ones force the
//! schedule to paused with a recorded reason.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use futures::stream;
use tracing::{debug, error, info, warn};

use cadence_config::model::EngineConfig;
use cadence_core::{
    CadenceError, CampaignStore, DeliveryBatchResult, FailureClass, RecurrenceRule,
    RenderedMessage, Schedule, ScheduleId, ScheduleStatus,
};
use cadence_delivery::{Delivery, DeliveryTracker, RetrySweep};
use cadence_recipients::{RecipientResolver, ResolvePolicy};
use cadence_recurrence::compute_next_run;
use cadence_template::{render, validate_media};

/// Aggregated outcome of one tick.
#[derive(Debug, Clone, Default)]
pub struct TickSummary {
    /// Schedules that were due this tick.
    pub due: usize,
    /// Schedules whose batch was dispatched.
    pub dispatched: usize,
    pub sent: u32,
    pub failed: u32,
    pub retrying: u32,
    /// Outcome of the retry sweep that closes the tick.
    pub sweep: RetrySweep,
    /// Per-schedule processing failures, isolated from each other.
    pub errors: Vec<(ScheduleId, String)>,
}

/// Coordinates recurrence, resolution, rendering, and delivery per tick.
pub struct Orchestrator {
    store: Arc<dyn CampaignStore>,
    tracker: Arc<DeliveryTracker>,
    resolver: RecipientResolver,
    policy: ResolvePolicy,
    max_concurrent_schedules: usize,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn CampaignStore>,
        tracker: Arc<DeliveryTracker>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            resolver: RecipientResolver::new(store.clone()),
            store,
            tracker,
            policy: ResolvePolicy {
                include_inactive: config.include_inactive_recipients,
            },
            max_concurrent_schedules: config.max_concurrent_schedules.max(1),
        }
    }

    /// Run one tick at `now`.
    ///
    /// The caller must not overlap ticks; the tick loop awaits each tick
    /// before starting the next, which keeps the selection phase
    /// non-reentrant and prevents duplicate dispatch of the same run.
    pub async fn tick(&self, now: DateTime<Utc>) -> TickSummary {
        let mut summary = TickSummary::default();

        let due = match self.store.due_schedules(now).await {
            Ok(due) => due,
            Err(e) => {
                error!(error = %e, "due-schedule selection failed, skipping tick");
                return summary;
            }
        };
        summary.due = due.len();
        if !due.is_empty() {
            debug!(count = due.len(), "schedules due");
        }

        let outcomes: Vec<_> = stream::iter(due)
            .map(|schedule| async move {
                let id = schedule.id.clone();
                let result = self.process_due_schedule(schedule, now).await;
                (id, result)
            })
            .buffer_unordered(self.max_concurrent_schedules)
            .collect()
            .await;

        for (id, result) in outcomes {
            match result {
                Ok(batch) => {
                    summary.dispatched += 1;
                    summary.sent += batch.sent;
                    summary.failed += batch.failed;
                    summary.retrying += batch.retrying;
                }
                Err(e) => summary.errors.push((id, e.to_string())),
            }
        }

        summary.sweep = match self.tracker.process_due_retries(now).await {
            Ok(sweep) => sweep,
            Err(e) => {
                warn!(error = %e, "retry sweep failed, will retry next tick");
                RetrySweep::default()
            }
        };
        self.fold_sweep_into_counters(&summary.sweep).await;

        if summary.due > 0 || summary.sweep.attempted > 0 {
            info!(
                due = summary.due,
                dispatched = summary.dispatched,
                sent = summary.sent,
                failed = summary.failed,
                retrying = summary.retrying,
                retries_attempted = summary.sweep.attempted,
                errors = summary.errors.len(),
                "tick complete"
            );
        }
        summary
    }

    /// Process one due schedule, classifying any failure.
    ///
    /// Transient failures leave the schedule untouched so the next tick
    /// retries it; validation/permanent failures force it to paused with the
    /// reason recorded for operator attention.
    async fn process_due_schedule(
        &self,
        schedule: Schedule,
        now: DateTime<Utc>,
    ) -> Result<DeliveryBatchResult, CadenceError> {
        // The run is keyed by the scheduled occurrence, not the tick time,
        // so a crash-retry on a later tick reuses the same attempt batch
        // instead of dispatching a duplicate one.
        let run_at = schedule.next_run_at.unwrap_or(now);
        match self.run_schedule(&schedule, run_at, now, None).await {
            Ok(batch) => Ok(batch),
            Err(e) => {
                match e.class() {
                    FailureClass::Transient => {
                        warn!(
                            schedule_id = %schedule.id,
                            error = %e,
                            "transient schedule failure, will retry next tick"
                        );
                    }
                    FailureClass::Validation | FailureClass::Permanent => {
                        error!(
                            schedule_id = %schedule.id,
                            error = %e,
                            "permanent schedule failure, pausing schedule"
                        );
                        self.force_pause(&schedule, e.to_string()).await;
                    }
                }
                Err(e)
            }
        }
    }

    /// Execute one run of `schedule` at `run_at`: resolve, render per
    /// recipient, dispatch, then advance run state.
    ///
    /// Rendering is validated for every recipient before anything is
    /// dispatched, so a missing binding aborts the whole run without a
    /// single partial send.
    pub async fn run_schedule(
        &self,
        schedule: &Schedule,
        run_at: DateTime<Utc>,
        now: DateTime<Utc>,
        extra_bindings: Option<&HashMap<String, String>>,
    ) -> Result<DeliveryBatchResult, CadenceError> {
        let template = self
            .store
            .get_template(&schedule.template_id)
            .await?
            .ok_or_else(|| CadenceError::NotFound {
                entity: "template",
                id: schedule.template_id.0.clone(),
            })?;
        if let Some(media) = &template.media {
            validate_media(media)?;
        }

        let recipients = self.resolver.resolve(&schedule.selector, self.policy).await?;
        if recipients.is_empty() {
            debug!(schedule_id = %schedule.id, "selector resolved to no recipients");
        }

        let mut deliveries = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            let mut bindings = schedule.bindings.clone();
            if let Some(extra) = extra_bindings {
                bindings.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            // Recipient builtins win so {name} is always the individual.
            bindings.extend(recipient.builtin_bindings());
            let text = render(&template.content, &bindings)?;
            deliveries.push(Delivery {
                recipient,
                message: RenderedMessage {
                    text,
                    media: template.media.clone(),
                },
            });
        }

        let batch = self.tracker.dispatch(&schedule.id, run_at, deliveries).await?;

        let mut updated = schedule.clone();
        updated.last_run_at = Some(run_at);
        updated.sent_count += u64::from(batch.sent);
        updated.failed_count += u64::from(batch.failed);
        if matches!(updated.rule, RecurrenceRule::OneTime { .. }) {
            updated.status = ScheduleStatus::Completed;
            updated.next_run_at = None;
        } else {
            // Advance from this run; missed occurrences are never backfilled.
            updated.next_run_at =
                compute_next_run(&updated.rule, updated.status, now, Some(run_at));
        }
        updated.updated_at = Utc::now();
        self.store.update_schedule(&updated).await?;

        debug!(
            schedule_id = %schedule.id,
            sent = batch.sent,
            failed = batch.failed,
            retrying = batch.retrying,
            next_run_at = ?updated.next_run_at,
            "run dispatched"
        );
        Ok(batch)
    }

    /// One-off dispatch for a trigger-based schedule.
    ///
    /// `bindings` overlay the schedule's own campaign bindings (and are in
    /// turn overlaid by recipient builtins at render time).
    pub async fn trigger(
        &self,
        id: &ScheduleId,
        bindings: HashMap<String, String>,
    ) -> Result<DeliveryBatchResult, CadenceError> {
        let schedule = self
            .store
            .get_schedule(id)
            .await?
            .ok_or_else(|| CadenceError::NotFound {
                entity: "schedule",
                id: id.0.clone(),
            })?;
        if !matches!(schedule.rule, RecurrenceRule::Triggered) {
            return Err(CadenceError::Validation(
                "only trigger-based schedules can be triggered manually".to_string(),
            ));
        }
        if schedule.status != ScheduleStatus::Active {
            return Err(CadenceError::Validation(format!(
                "schedule is {}, not active",
                schedule.status
            )));
        }
        let now = Utc::now();
        self.run_schedule(&schedule, now, now, Some(&bindings)).await
    }

    /// Force a schedule into paused with a recorded reason.
    async fn force_pause(&self, schedule: &Schedule, reason: String) {
        // Re-read so a concurrent external pause/resume is not clobbered.
        let fresh = match self.store.get_schedule(&schedule.id).await {
            Ok(Some(fresh)) => fresh,
            Ok(None) => return,
            Err(e) => {
                error!(schedule_id = %schedule.id, error = %e, "failed to load schedule for pause");
                return;
            }
        };
        let mut paused = fresh;
        paused.status = ScheduleStatus::Paused;
        paused.next_run_at = None;
        paused.pause_reason = Some(reason);
        paused.updated_at = Utc::now();
        if let Err(e) = self.store.update_schedule(&paused).await {
            error!(schedule_id = %paused.id, error = %e, "failed to persist forced pause");
        }
    }

    /// Fold late retry outcomes into the affected schedules' counters.
    async fn fold_sweep_into_counters(&self, sweep: &RetrySweep) {
        for (schedule_id, (sent, failed)) in &sweep.by_schedule {
            match self.store.get_schedule(schedule_id).await {
                Ok(Some(mut schedule)) => {
                    schedule.sent_count += sent;
                    schedule.failed_count += failed;
                    schedule.updated_at = Utc::now();
                    if let Err(e) = self.store.update_schedule(&schedule).await {
                        warn!(schedule_id = %schedule_id, error = %e, "failed to update counters");
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(schedule_id = %schedule_id, error = %e, "failed to load schedule");
                }
            }
        }
    }
}

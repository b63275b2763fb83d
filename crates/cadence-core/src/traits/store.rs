// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence trait for the campaign engine.
//!
//! A single `CampaignStore` trait covers schedules, templates, recipients,
//! groups, and delivery attempts so storage backends implement one surface.
//! The engine only ever mutates schedule state through `update_schedule`,
//! and attempt records through the delivery-attempt operations, keeping
//! ownership boundaries explicit.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CadenceError;
use crate::types::{
    DeliveryAttempt, Group, HealthStatus, Recipient, RecipientId, RecipientStatus, Schedule,
    ScheduleId, ScheduleStatus, Template, TemplateId,
};

/// Filter for recipient list queries.
///
/// All terms are conjunctive; `None` means "any".
#[derive(Debug, Clone, Default)]
pub struct RecipientFilter {
    pub status: Option<RecipientStatus>,
    pub tag: Option<String>,
    pub group: Option<String>,
}

/// Aggregate attempt counts for the stats read-model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttemptTotals {
    pub pending: u64,
    pub sent: u64,
    pub failed: u64,
    pub retrying: u64,
}

/// Storage backend for all campaign engine entities.
#[async_trait]
pub trait CampaignStore: Send + Sync {
    /// Check that the backing store is reachable.
    async fn health_check(&self) -> Result<HealthStatus, CadenceError>;

    // --- Schedules ---

    async fn insert_schedule(&self, schedule: &Schedule) -> Result<(), CadenceError>;

    async fn get_schedule(&self, id: &ScheduleId) -> Result<Option<Schedule>, CadenceError>;

    /// List schedules, optionally filtered by status, ordered by creation.
    async fn list_schedules(
        &self,
        status: Option<ScheduleStatus>,
    ) -> Result<Vec<Schedule>, CadenceError>;

    /// Persist schedule mutations (status, next/last run, counters).
    async fn update_schedule(&self, schedule: &Schedule) -> Result<(), CadenceError>;

    async fn delete_schedule(&self, id: &ScheduleId) -> Result<(), CadenceError>;

    /// Active schedules whose `next_run_at` is at or before `now`,
    /// ordered by `next_run_at`.
    async fn due_schedules(&self, now: DateTime<Utc>) -> Result<Vec<Schedule>, CadenceError>;

    // --- Templates ---

    async fn insert_template(&self, template: &Template) -> Result<(), CadenceError>;

    async fn get_template(&self, id: &TemplateId) -> Result<Option<Template>, CadenceError>;

    /// List templates, optionally filtered by category, ordered by creation.
    async fn list_templates(&self, category: Option<&str>)
    -> Result<Vec<Template>, CadenceError>;

    async fn delete_template(&self, id: &TemplateId) -> Result<(), CadenceError>;

    /// Whether any active schedule references this template.
    async fn template_in_use(&self, id: &TemplateId) -> Result<bool, CadenceError>;

    // --- Recipients & groups ---

    /// Insert or fully replace a recipient by id.
    async fn upsert_recipient(&self, recipient: &Recipient) -> Result<(), CadenceError>;

    async fn get_recipient(&self, id: &RecipientId) -> Result<Option<Recipient>, CadenceError>;

    /// List recipients matching the filter, ordered by creation (stable
    /// across calls so selector resolution is deterministic).
    async fn list_recipients(
        &self,
        filter: &RecipientFilter,
    ) -> Result<Vec<Recipient>, CadenceError>;

    /// Add sent/failed deltas to a recipient's delivery counters.
    async fn bump_recipient_counters(
        &self,
        id: &RecipientId,
        sent_delta: u64,
        failed_delta: u64,
    ) -> Result<(), CadenceError>;

    async fn insert_group(&self, group: &Group) -> Result<(), CadenceError>;

    async fn get_group_by_name(&self, name: &str) -> Result<Option<Group>, CadenceError>;

    async fn list_groups(&self) -> Result<Vec<Group>, CadenceError>;

    // --- Delivery attempts ---

    async fn insert_attempt(&self, attempt: &DeliveryAttempt) -> Result<(), CadenceError>;

    async fn update_attempt(&self, attempt: &DeliveryAttempt) -> Result<(), CadenceError>;

    /// All attempts for one `(schedule, run)` pair.
    async fn attempts_for_run(
        &self,
        schedule_id: &ScheduleId,
        run_at: DateTime<Utc>,
    ) -> Result<Vec<DeliveryAttempt>, CadenceError>;

    /// Full delivery history for a schedule, newest run first.
    async fn attempts_for_schedule(
        &self,
        schedule_id: &ScheduleId,
    ) -> Result<Vec<DeliveryAttempt>, CadenceError>;

    /// Retrying attempts whose `next_retry_at` is at or before `now`.
    async fn due_retries(&self, now: DateTime<Utc>)
    -> Result<Vec<DeliveryAttempt>, CadenceError>;

    /// Attempt counts by status across all schedules.
    async fn attempt_totals(&self) -> Result<AttemptTotals, CadenceError>;

    /// Count of attempts marked sent at or after `since`.
    async fn sent_since(&self, since: DateTime<Utc>) -> Result<u64, CadenceError>;
}

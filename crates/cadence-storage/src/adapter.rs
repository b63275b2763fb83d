// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the `CampaignStore` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use cadence_core::traits::store::{AttemptTotals, CampaignStore, RecipientFilter};
use cadence_core::types::{
    DeliveryAttempt, Group, HealthStatus, Recipient, RecipientId, Schedule, ScheduleId,
    ScheduleStatus, Template, TemplateId,
};
use cadence_core::CadenceError;

use crate::database::Database;
use crate::queries;

/// SQLite-backed campaign store.
///
/// Wraps a [`Database`] handle and delegates all operations to the typed
/// query modules.
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    /// Open (creating if needed) the store at `path` and run migrations.
    pub async fn open(path: &str) -> Result<Self, CadenceError> {
        let db = Database::open(path).await?;
        debug!(path, "SQLite campaign store opened");
        Ok(Self { db })
    }

    /// Checkpoint the WAL and release the connection.
    pub async fn close(&self) -> Result<(), CadenceError> {
        self.db.close().await
    }

    /// The underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl CampaignStore for SqliteStore {
    async fn health_check(&self) -> Result<HealthStatus, CadenceError> {
        self.db
            .connection()
            .call(|conn| {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    // --- Schedules ---

    async fn insert_schedule(&self, schedule: &Schedule) -> Result<(), CadenceError> {
        queries::schedules::insert_schedule(&self.db, schedule).await
    }

    async fn get_schedule(&self, id: &ScheduleId) -> Result<Option<Schedule>, CadenceError> {
        queries::schedules::get_schedule(&self.db, id).await
    }

    async fn list_schedules(
        &self,
        status: Option<ScheduleStatus>,
    ) -> Result<Vec<Schedule>, CadenceError> {
        queries::schedules::list_schedules(&self.db, status).await
    }

    async fn update_schedule(&self, schedule: &Schedule) -> Result<(), CadenceError> {
        queries::schedules::update_schedule(&self.db, schedule).await
    }

    async fn delete_schedule(&self, id: &ScheduleId) -> Result<(), CadenceError> {
        queries::schedules::delete_schedule(&self.db, id).await
    }

    async fn due_schedules(&self, now: DateTime<Utc>) -> Result<Vec<Schedule>, CadenceError> {
        queries::schedules::due_schedules(&self.db, now).await
    }

    // --- Templates ---

    async fn insert_template(&self, template: &Template) -> Result<(), CadenceError> {
        queries::templates::insert_template(&self.db, template).await
    }

    async fn get_template(&self, id: &TemplateId) -> Result<Option<Template>, CadenceError> {
        queries::templates::get_template(&self.db, id).await
    }

    async fn list_templates(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<Template>, CadenceError> {
        queries::templates::list_templates(&self.db, category).await
    }

    async fn delete_template(&self, id: &TemplateId) -> Result<(), CadenceError> {
        queries::templates::delete_template(&self.db, id).await
    }

    async fn template_in_use(&self, id: &TemplateId) -> Result<bool, CadenceError> {
        queries::templates::template_in_use(&self.db, id).await
    }

    // --- Recipients & groups ---

    async fn upsert_recipient(&self, recipient: &Recipient) -> Result<(), CadenceError> {
        queries::recipients::upsert_recipient(&self.db, recipient).await
    }

    async fn get_recipient(&self, id: &RecipientId) -> Result<Option<Recipient>, CadenceError> {
        queries::recipients::get_recipient(&self.db, id).await
    }

    async fn list_recipients(
        &self,
        filter: &RecipientFilter,
    ) -> Result<Vec<Recipient>, CadenceError> {
        queries::recipients::list_recipients(&self.db, filter).await
    }

    async fn bump_recipient_counters(
        &self,
        id: &RecipientId,
        sent_delta: u64,
        failed_delta: u64,
    ) -> Result<(), CadenceError> {
        queries::recipients::bump_recipient_counters(&self.db, id, sent_delta, failed_delta).await
    }

    async fn insert_group(&self, group: &Group) -> Result<(), CadenceError> {
        queries::recipients::insert_group(&self.db, group).await
    }

    async fn get_group_by_name(&self, name: &str) -> Result<Option<Group>, CadenceError> {
        queries::recipients::get_group_by_name(&self.db, name).await
    }

    async fn list_groups(&self) -> Result<Vec<Group>, CadenceError> {
        queries::recipients::list_groups(&self.db).await
    }

    // --- Delivery attempts ---

    async fn insert_attempt(&self, attempt: &DeliveryAttempt) -> Result<(), CadenceError> {
        queries::attempts::insert_attempt(&self.db, attempt).await
    }

    async fn update_attempt(&self, attempt: &DeliveryAttempt) -> Result<(), CadenceError> {
        queries::attempts::update_attempt(&self.db, attempt).await
    }

    async fn attempts_for_run(
        &self,
        schedule_id: &ScheduleId,
        run_at: DateTime<Utc>,
    ) -> Result<Vec<DeliveryAttempt>, CadenceError> {
        queries::attempts::attempts_for_run(&self.db, schedule_id, run_at).await
    }

    async fn attempts_for_schedule(
        &self,
        schedule_id: &ScheduleId,
    ) -> Result<Vec<DeliveryAttempt>, CadenceError> {
        queries::attempts::attempts_for_schedule(&self.db, schedule_id).await
    }

    async fn due_retries(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<DeliveryAttempt>, CadenceError> {
        queries::attempts::due_retries(&self.db, now).await
    }

    async fn attempt_totals(&self) -> Result<AttemptTotals, CadenceError> {
        queries::attempts::attempt_totals(&self.db).await
    }

    async fn sent_since(&self, since: DateTime<Utc>) -> Result<u64, CadenceError> {
        queries::attempts::sent_since(&self.db, since).await
    }
}

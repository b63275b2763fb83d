// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Synchronous request/response surface for the presentation layer.
//!
//! All operations validate inputs up front and surface validation errors to
//! the caller; nothing here is retried. List queries are filterable by
//! status, category, and tag; presentation concerns (pagination, badges,
//! relative time) belong to the client.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use cadence_core::{
    CadenceError, CampaignStore, DeliveryAttempt, DeliveryBatchResult, Group, GroupId, MediaRef,
    Recipient, RecipientFilter, RecipientId, RecipientSelector, RecipientStatus, RecurrenceRule,
    Schedule, ScheduleId, ScheduleStatus, Template, TemplateId,
};
use cadence_recipients::canonical_phone;
use cadence_recurrence::{compute_next_run, validate_rule};
use cadence_template::{extract_variables, parse_kind, validate_media};

use crate::orchestrator::Orchestrator;
use crate::stats::{self, EngineStats};

/// Request payload for creating a schedule.
#[derive(Debug, Clone)]
pub struct ScheduleSpec {
    pub name: String,
    pub description: Option<String>,
    pub template_id: TemplateId,
    pub rule: RecurrenceRule,
    pub selector: RecipientSelector,
    pub bindings: HashMap<String, String>,
}

/// Request payload for creating a template.
#[derive(Debug, Clone)]
pub struct TemplateSpec {
    pub name: String,
    pub category: String,
    pub content: String,
    pub media: Option<MediaSpec>,
    /// Require at least one extractable variable in `content`.
    pub require_variables: bool,
}

/// Caller-supplied media reference; the kind arrives as text and is parsed
/// against the supported set.
#[derive(Debug, Clone)]
pub struct MediaSpec {
    pub kind: String,
    pub url: String,
    pub size_bytes: u64,
}

/// Request payload for creating or replacing a recipient.
#[derive(Debug, Clone)]
pub struct RecipientSpec {
    /// Existing id for updates; `None` creates a new recipient.
    pub id: Option<RecipientId>,
    pub name: String,
    /// Raw phone input; canonicalized before storage.
    pub phone: String,
    pub email: Option<String>,
    pub location: Option<String>,
    pub tags: Vec<String>,
    pub groups: Vec<String>,
    pub status: RecipientStatus,
}

/// Request payload for creating a group.
#[derive(Debug, Clone)]
pub struct GroupSpec {
    pub name: String,
    pub description: Option<String>,
}

/// Filter for schedule list queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleFilter {
    pub status: Option<ScheduleStatus>,
}

/// The engine's external API.
pub struct CampaignService {
    store: Arc<dyn CampaignStore>,
    orchestrator: Arc<Orchestrator>,
}

impl CampaignService {
    pub fn new(store: Arc<dyn CampaignStore>, orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            store,
            orchestrator,
        }
    }

    // --- Schedules ---

    pub async fn list_schedules(
        &self,
        filter: ScheduleFilter,
    ) -> Result<Vec<Schedule>, CadenceError> {
        self.store.list_schedules(filter.status).await
    }

    /// Create a schedule and compute its initial `next_run_at`.
    pub async fn create_schedule(&self, spec: ScheduleSpec) -> Result<Schedule, CadenceError> {
        if spec.name.trim().is_empty() {
            return Err(CadenceError::Validation(
                "schedule name must not be empty".to_string(),
            ));
        }
        validate_rule(&spec.rule)?;
        validate_selector(&spec.selector)?;
        if self.store.get_template(&spec.template_id).await?.is_none() {
            return Err(CadenceError::NotFound {
                entity: "template",
                id: spec.template_id.0.clone(),
            });
        }

        let now = Utc::now();
        let next_run_at = compute_next_run(&spec.rule, ScheduleStatus::Active, now, None);
        if next_run_at.is_none() && matches!(spec.rule, RecurrenceRule::OneTime { .. }) {
            return Err(CadenceError::Validation(
                "one-time schedule instant is in the past".to_string(),
            ));
        }

        let schedule = Schedule {
            id: ScheduleId::generate(),
            name: spec.name,
            description: spec.description,
            template_id: spec.template_id,
            rule: spec.rule,
            selector: spec.selector,
            bindings: spec.bindings,
            status: ScheduleStatus::Active,
            next_run_at,
            last_run_at: None,
            sent_count: 0,
            failed_count: 0,
            pause_reason: None,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_schedule(&schedule).await?;
        info!(schedule_id = %schedule.id, name = %schedule.name, "schedule created");
        Ok(schedule)
    }

    /// Pause an active schedule. Idempotent for already-paused schedules.
    pub async fn pause_schedule(&self, id: &ScheduleId) -> Result<Schedule, CadenceError> {
        let mut schedule = self.get_schedule_or_err(id).await?;
        match schedule.status {
            ScheduleStatus::Completed => {
                return Err(CadenceError::Validation(
                    "completed schedule cannot be paused".to_string(),
                ));
            }
            ScheduleStatus::Paused => return Ok(schedule),
            ScheduleStatus::Active => {}
        }
        schedule.status = ScheduleStatus::Paused;
        schedule.next_run_at = None;
        schedule.updated_at = Utc::now();
        self.store.update_schedule(&schedule).await?;
        info!(schedule_id = %id, "schedule paused");
        Ok(schedule)
    }

    /// Resume a paused schedule and recompute its next run.
    ///
    /// A paused one-time schedule whose single occurrence already fired
    /// resumes directly into `completed`.
    pub async fn resume_schedule(&self, id: &ScheduleId) -> Result<Schedule, CadenceError> {
        let mut schedule = self.get_schedule_or_err(id).await?;
        match schedule.status {
            ScheduleStatus::Completed => {
                return Err(CadenceError::Validation(
                    "completed schedule cannot be resumed".to_string(),
                ));
            }
            ScheduleStatus::Active => return Ok(schedule),
            ScheduleStatus::Paused => {}
        }
        let now = Utc::now();
        schedule.status = ScheduleStatus::Active;
        schedule.pause_reason = None;
        schedule.next_run_at =
            compute_next_run(&schedule.rule, schedule.status, now, schedule.last_run_at);
        if matches!(schedule.rule, RecurrenceRule::OneTime { .. })
            && schedule.last_run_at.is_some()
        {
            schedule.status = ScheduleStatus::Completed;
            schedule.next_run_at = None;
        }
        schedule.updated_at = now;
        self.store.update_schedule(&schedule).await?;
        info!(schedule_id = %id, status = %schedule.status, "schedule resumed");
        Ok(schedule)
    }

    /// Delete a schedule. Active schedules must be paused first.
    pub async fn delete_schedule(&self, id: &ScheduleId) -> Result<(), CadenceError> {
        let schedule = self.get_schedule_or_err(id).await?;
        if schedule.status == ScheduleStatus::Active {
            return Err(CadenceError::ScheduleActive { id: id.0.clone() });
        }
        self.store.delete_schedule(id).await?;
        info!(schedule_id = %id, "schedule deleted");
        Ok(())
    }

    /// One-off dispatch of a trigger-based schedule.
    pub async fn trigger_schedule(
        &self,
        id: &ScheduleId,
        bindings: HashMap<String, String>,
    ) -> Result<DeliveryBatchResult, CadenceError> {
        self.orchestrator.trigger(id, bindings).await
    }

    // --- Templates ---

    pub async fn list_templates(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<Template>, CadenceError> {
        self.store.list_templates(category).await
    }

    /// Create a template, validating content and any media reference.
    pub async fn create_template(&self, spec: TemplateSpec) -> Result<Template, CadenceError> {
        if spec.name.trim().is_empty() {
            return Err(CadenceError::Validation(
                "template name must not be empty".to_string(),
            ));
        }
        if spec.content.trim().is_empty() {
            return Err(CadenceError::InvalidTemplate(
                "content must not be empty".to_string(),
            ));
        }
        let variables = extract_variables(&spec.content);
        if spec.require_variables && variables.is_empty() {
            return Err(CadenceError::InvalidTemplate(
                "content has no extractable variables".to_string(),
            ));
        }

        let media = match spec.media {
            Some(media_spec) => {
                let media = MediaRef {
                    kind: parse_kind(&media_spec.kind)?,
                    url: media_spec.url,
                    size_bytes: media_spec.size_bytes,
                };
                validate_media(&media)?;
                Some(media)
            }
            None => None,
        };

        let now = Utc::now();
        let template = Template {
            id: TemplateId::generate(),
            name: spec.name,
            category: spec.category,
            content: spec.content,
            media,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_template(&template).await?;
        info!(template_id = %template.id, name = %template.name, "template created");
        Ok(template)
    }

    /// Delete a template not referenced by any active schedule.
    pub async fn delete_template(&self, id: &TemplateId) -> Result<(), CadenceError> {
        if self.store.get_template(id).await?.is_none() {
            return Err(CadenceError::NotFound {
                entity: "template",
                id: id.0.clone(),
            });
        }
        if self.store.template_in_use(id).await? {
            return Err(CadenceError::TemplateInUse { id: id.0.clone() });
        }
        self.store.delete_template(id).await?;
        info!(template_id = %id, "template deleted");
        Ok(())
    }

    // --- Recipients & groups ---

    pub async fn list_recipients(
        &self,
        filter: &RecipientFilter,
    ) -> Result<Vec<Recipient>, CadenceError> {
        self.store.list_recipients(filter).await
    }

    /// Create or replace a recipient, canonicalizing the phone number.
    ///
    /// Updates preserve the original creation time and delivery counters.
    pub async fn upsert_recipient(&self, spec: RecipientSpec) -> Result<Recipient, CadenceError> {
        if spec.name.trim().is_empty() {
            return Err(CadenceError::Validation(
                "recipient name must not be empty".to_string(),
            ));
        }
        let phone = canonical_phone(&spec.phone)?;

        let now = Utc::now();
        let (id, created_at, messages_sent, messages_failed) = match &spec.id {
            Some(id) => match self.store.get_recipient(id).await? {
                Some(existing) => (
                    existing.id,
                    existing.created_at,
                    existing.messages_sent,
                    existing.messages_failed,
                ),
                None => {
                    return Err(CadenceError::NotFound {
                        entity: "recipient",
                        id: id.0.clone(),
                    });
                }
            },
            None => (RecipientId::generate(), now, 0, 0),
        };

        let recipient = Recipient {
            id,
            name: spec.name,
            phone,
            email: spec.email,
            location: spec.location,
            tags: spec.tags,
            groups: spec.groups,
            status: spec.status,
            messages_sent,
            messages_failed,
            created_at,
            updated_at: now,
        };
        self.store.upsert_recipient(&recipient).await?;
        Ok(recipient)
    }

    pub async fn list_groups(&self) -> Result<Vec<Group>, CadenceError> {
        self.store.list_groups().await
    }

    /// Create a group with a unique name.
    pub async fn create_group(&self, spec: GroupSpec) -> Result<Group, CadenceError> {
        if spec.name.trim().is_empty() {
            return Err(CadenceError::Validation(
                "group name must not be empty".to_string(),
            ));
        }
        if self.store.get_group_by_name(&spec.name).await?.is_some() {
            return Err(CadenceError::Validation(format!(
                "group `{}` already exists",
                spec.name
            )));
        }
        let group = Group {
            id: GroupId::generate(),
            name: spec.name,
            description: spec.description,
            created_at: Utc::now(),
        };
        self.store.insert_group(&group).await?;
        Ok(group)
    }

    // --- Delivery history & stats ---

    /// Full delivery history for a schedule, newest run first.
    pub async fn get_delivery_history(
        &self,
        schedule_id: &ScheduleId,
    ) -> Result<Vec<DeliveryAttempt>, CadenceError> {
        self.get_schedule_or_err(schedule_id).await?;
        self.store.attempts_for_schedule(schedule_id).await
    }

    /// Dashboard aggregates, derived from attempt records on demand.
    pub async fn stats(&self, now: DateTime<Utc>) -> Result<EngineStats, CadenceError> {
        stats::collect(self.store.as_ref(), now).await
    }

    async fn get_schedule_or_err(&self, id: &ScheduleId) -> Result<Schedule, CadenceError> {
        self.store
            .get_schedule(id)
            .await?
            .ok_or_else(|| CadenceError::NotFound {
                entity: "schedule",
                id: id.0.clone(),
            })
    }
}

fn validate_selector(selector: &RecipientSelector) -> Result<(), CadenceError> {
    match selector {
        RecipientSelector::Groups { names } if names.is_empty() => Err(CadenceError::Validation(
            "recipient selector has no group names".to_string(),
        )),
        RecipientSelector::Tags { tags } if tags.is_empty() => Err(CadenceError::Validation(
            "recipient selector has no tags".to_string(),
        )),
        _ => Ok(()),
    }
}

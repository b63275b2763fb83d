// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model for the Cadence campaign engine.
//!
//! Everything that crosses the store boundary is serde-serializable.
//! Recurrence rules and recipient selectors are tagged enums so downstream
//! code can match exhaustively without a string fallback branch.

use std::collections::HashMap;

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduleId(pub String);

/// Unique identifier for a template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateId(pub String);

/// Unique identifier for a recipient.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecipientId(pub String);

/// Unique identifier for a group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub String);

macro_rules! generated_id {
    ($($ty:ident),*) => {
        $(impl $ty {
            /// Mint a fresh random identifier.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        })*
    };
}

generated_id!(ScheduleId, TemplateId, RecipientId, GroupId);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Fully operational.
    Healthy,
    /// Operational but experiencing issues.
    Degraded(String),
    /// Not operational.
    Unhealthy(String),
}

// --- Scheduling ---

/// Lifecycle status of a schedule.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Active,
    Paused,
    Completed,
}

/// Day constraint for a periodic recurrence rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Period {
    /// Every day.
    Daily,
    /// Every week on the given weekday.
    Weekly { weekday: Weekday },
    /// Every month on the given day (1..=31). Days past the end of a short
    /// month clamp to that month's last day.
    Monthly { day: u8 },
}

/// When a schedule fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecurrenceRule {
    /// Fires exactly once at the given instant.
    OneTime { at: DateTime<Utc> },
    /// Fires repeatedly at a local time-of-day in a fixed UTC offset.
    Periodic {
        period: Period,
        /// Local wall-clock time of each occurrence.
        at: NaiveTime,
        /// Minutes east of UTC for the schedule's local clock.
        utc_offset_minutes: i32,
    },
    /// Fires only on an explicit external trigger; has no intrinsic next run.
    Triggered,
}

impl RecurrenceRule {
    /// Human-readable description for display surfaces.
    ///
    /// Derived on demand; the structured rule is the source of truth.
    pub fn describe(&self) -> String {
        match self {
            Self::OneTime { at } => format!("One-time at {}", at.format("%Y-%m-%d %H:%M UTC")),
            Self::Periodic { period, at, .. } => match period {
                Period::Daily => format!("Daily at {}", at.format("%H:%M")),
                Period::Weekly { weekday } => {
                    format!("Every {weekday} at {}", at.format("%H:%M"))
                }
                Period::Monthly { day } => {
                    format!("Monthly on day {day} at {}", at.format("%H:%M"))
                }
            },
            Self::Triggered => "Triggered".to_string(),
        }
    }
}

/// Which recipients a schedule targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RecipientSelector {
    /// Union of the named groups.
    Groups { names: Vec<String> },
    /// Union of recipients carrying any of the given tags.
    Tags { tags: Vec<String> },
    /// Every recipient.
    All,
}

/// A configured, possibly recurring instruction to send a rendered template
/// to a resolved recipient set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub name: String,
    pub description: Option<String>,
    pub template_id: TemplateId,
    pub rule: RecurrenceRule,
    pub selector: RecipientSelector,
    /// Campaign-level variable bindings, overlaid by per-recipient builtins
    /// at render time.
    pub bindings: HashMap<String, String>,
    pub status: ScheduleStatus,
    /// Earliest future occurrence consistent with the rule and status.
    /// `None` for paused, completed, and trigger-based schedules.
    pub next_run_at: Option<DateTime<Utc>>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub sent_count: u64,
    pub failed_count: u64,
    /// Why the engine forced this schedule to paused, if it did.
    pub pause_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Templates ---

/// Supported media attachment kinds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

/// A media attachment reference on a template.
///
/// `size_bytes` is declared up front so limits can be enforced without
/// fetching the URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRef {
    pub kind: MediaKind,
    pub url: String,
    pub size_bytes: u64,
}

/// Reusable message content with `{variable}` placeholders.
///
/// The variable set is derived from `content` on demand, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: TemplateId,
    pub name: String,
    pub category: String,
    pub content: String,
    pub media: Option<MediaRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fully rendered, ready-to-send message content.
///
/// Serialized whole into the delivery attempt's payload so a retry sweep
/// can re-send the exact original content, media included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedMessage {
    pub text: String,
    pub media: Option<MediaRef>,
}

// --- Recipients ---

/// Lifecycle status of a recipient.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RecipientStatus {
    Active,
    Inactive,
    Blocked,
}

/// A message recipient with tag and group memberships.
///
/// Group membership lives on the recipient (not a join table), so group
/// queries are lookups over this set rather than two-sided sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    pub id: RecipientId,
    pub name: String,
    /// Canonical form: `+` followed by digits only.
    pub phone: String,
    pub email: Option<String>,
    pub location: Option<String>,
    pub tags: Vec<String>,
    pub groups: Vec<String>,
    pub status: RecipientStatus,
    pub messages_sent: u64,
    pub messages_failed: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Recipient {
    /// Builtin render bindings derived from this recipient's fields.
    ///
    /// These overlay schedule-level bindings so `{name}` always resolves to
    /// the individual recipient.
    pub fn builtin_bindings(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("name".to_string(), self.name.clone());
        map.insert("phone".to_string(), self.phone.clone());
        if let Some(email) = &self.email {
            map.insert("email".to_string(), email.clone());
        }
        if let Some(location) = &self.location {
            map.insert("location".to_string(), location.clone());
        }
        map
    }
}

/// A named recipient group. Membership is derived from recipients whose
/// `groups` set contains this group's name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

// --- Delivery ---

/// Status of a delivery attempt.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AttemptStatus {
    Pending,
    Sent,
    Failed,
    Retrying,
}

impl AttemptStatus {
    /// Whether this status is terminal (no further transitions).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Sent | Self::Failed)
    }
}

/// One tracked outcome of sending a rendered message to one recipient for
/// one schedule run. Keyed uniquely by `(schedule_id, run_at, recipient_id)`;
/// retries mutate `attempt_count` on the same record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryAttempt {
    pub id: String,
    pub schedule_id: ScheduleId,
    pub recipient_id: RecipientId,
    pub run_at: DateTime<Utc>,
    pub payload: String,
    pub status: AttemptStatus,
    pub attempt_count: u32,
    /// When a retrying attempt becomes eligible for re-dispatch.
    pub next_retry_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregated outcome of dispatching one schedule run.
///
/// Partial failure is a normal result, never an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeliveryBatchResult {
    pub sent: u32,
    pub failed: u32,
    pub retrying: u32,
    pub failure_reasons: Vec<String>,
}

impl DeliveryBatchResult {
    /// Total attempts represented by this result.
    pub fn total(&self) -> u32 {
        self.sent + self.failed + self.retrying
    }
}

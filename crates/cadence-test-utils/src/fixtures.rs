// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Spec builders for common test entities.

use std::collections::HashMap;

use chrono::{DateTime, NaiveTime, Utc, Weekday};

use cadence_core::types::{
    Period, RecipientSelector, RecipientStatus, RecurrenceRule, TemplateId,
};
use cadence_engine::{RecipientSpec, ScheduleSpec, TemplateSpec};

/// A recipient spec with the given name and phone, active, no memberships.
pub fn recipient_spec(name: &str, phone: &str) -> RecipientSpec {
    RecipientSpec {
        id: None,
        name: name.to_string(),
        phone: phone.to_string(),
        email: None,
        location: None,
        tags: Vec::new(),
        groups: Vec::new(),
        status: RecipientStatus::Active,
    }
}

/// A template spec with the given content, variables required.
pub fn template_spec(name: &str, content: &str) -> TemplateSpec {
    TemplateSpec {
        name: name.to_string(),
        category: "Test".to_string(),
        content: content.to_string(),
        media: None,
        require_variables: true,
    }
}

/// A schedule spec targeting all recipients with the given rule.
pub fn schedule_spec(name: &str, template_id: &TemplateId, rule: RecurrenceRule) -> ScheduleSpec {
    ScheduleSpec {
        name: name.to_string(),
        description: None,
        template_id: template_id.clone(),
        rule,
        selector: RecipientSelector::All,
        bindings: HashMap::new(),
    }
}

/// A one-time rule at the given instant.
pub fn one_time(at: DateTime<Utc>) -> RecurrenceRule {
    RecurrenceRule::OneTime { at }
}

/// A daily rule at the given UTC time-of-day.
pub fn daily_at(hour: u32, minute: u32) -> RecurrenceRule {
    RecurrenceRule::Periodic {
        period: Period::Daily,
        at: NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default(),
        utc_offset_minutes: 0,
    }
}

/// A weekly rule on the given weekday at the given UTC time-of-day.
pub fn weekly_at(weekday: Weekday, hour: u32, minute: u32) -> RecurrenceRule {
    RecurrenceRule::Periodic {
        period: Period::Weekly { weekday },
        at: NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default(),
        utc_offset_minutes: 0,
    }
}

// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Cadence campaign engine.

use thiserror::Error;

use crate::types::MediaKind;

/// The primary error type used across all Cadence components.
#[derive(Debug, Error)]
pub enum CadenceError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Request validation errors (malformed recurrence rule, empty selector, bad phone).
    #[error("validation error: {0}")]
    Validation(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Delivery channel infrastructure errors (connect failure, malformed response).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A selector referenced a group that does not exist.
    #[error("unknown group: {name}")]
    UnknownGroup { name: String },

    /// A template variable has no corresponding binding at render time.
    #[error("missing binding for variable `{name}`")]
    MissingBinding { name: String },

    /// Template content failed validation (e.g. no extractable variables where required).
    #[error("invalid template: {0}")]
    InvalidTemplate(String),

    /// A media reference uses a kind outside the supported set.
    #[error("unsupported media type: {kind}")]
    UnsupportedMediaType { kind: String },

    /// A media reference exceeds the size limit for its kind.
    #[error("{kind} media of {size_bytes} bytes exceeds the {limit_bytes} byte limit")]
    MediaTooLarge {
        kind: MediaKind,
        size_bytes: u64,
        limit_bytes: u64,
    },

    /// A delete was attempted on a schedule that is still active.
    #[error("schedule {id} is active and cannot be deleted")]
    ScheduleActive { id: String },

    /// A delete was attempted on a template referenced by an active schedule.
    #[error("template {id} is referenced by an active schedule")]
    TemplateInUse { id: String },

    /// An entity lookup by id found nothing.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Failure taxonomy used to decide whether an error is retried, surfaced
/// synchronously, or forces a schedule into the paused state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Surfaced to the caller synchronously, never retried.
    Validation,
    /// Retried automatically within the retry budget.
    Transient,
    /// Recorded and surfaced for operator attention; the affected schedule
    /// is halted until an external command resumes it.
    Permanent,
}

impl CadenceError {
    /// Classify this error into the retry taxonomy.
    ///
    /// Unknown-group and storage failures during a tick are transient (the
    /// group may be created or the store may recover before the next tick);
    /// render-time failures are permanent because re-running the same
    /// template against the same data cannot succeed.
    pub fn class(&self) -> FailureClass {
        match self {
            Self::Config(_)
            | Self::Validation(_)
            | Self::InvalidTemplate(_)
            | Self::UnsupportedMediaType { .. }
            | Self::MediaTooLarge { .. }
            | Self::ScheduleActive { .. }
            | Self::TemplateInUse { .. } => FailureClass::Validation,

            Self::Storage { .. }
            | Self::Channel { .. }
            | Self::UnknownGroup { .. }
            | Self::Timeout { .. } => FailureClass::Transient,

            Self::MissingBinding { .. } | Self::NotFound { .. } | Self::Internal(_) => {
                FailureClass::Permanent
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_group_is_transient() {
        let err = CadenceError::UnknownGroup {
            name: "Leads".into(),
        };
        assert_eq!(err.class(), FailureClass::Transient);
    }

    #[test]
    fn missing_binding_is_permanent() {
        let err = CadenceError::MissingBinding {
            name: "code".into(),
        };
        assert_eq!(err.class(), FailureClass::Permanent);
    }

    #[test]
    fn media_too_large_is_validation() {
        let err = CadenceError::MediaTooLarge {
            kind: MediaKind::Image,
            size_bytes: 6 * 1024 * 1024,
            limit_bytes: 5 * 1024 * 1024,
        };
        assert_eq!(err.class(), FailureClass::Validation);
    }

    #[test]
    fn timeout_is_transient() {
        let err = CadenceError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        assert_eq!(err.class(), FailureClass::Transient);
    }

    #[test]
    fn error_messages_name_the_offender() {
        let err = CadenceError::UnknownGroup {
            name: "VIP Customers".into(),
        };
        assert_eq!(err.to_string(), "unknown group: VIP Customers");

        let err = CadenceError::MissingBinding {
            name: "code".into(),
        };
        assert!(err.to_string().contains("`code`"));
    }
}

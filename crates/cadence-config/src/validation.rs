// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as non-zero intervals and consistent backoff bounds.

use crate::diagnostic::ConfigError;
use crate::model::CadenceConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &CadenceConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.engine.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "engine.log_level must be one of {}, got `{}`",
                LOG_LEVELS.join(", "),
                config.engine.log_level
            ),
        });
    }

    if config.engine.tick_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "engine.tick_interval_secs must be at least 1".to_string(),
        });
    }

    if config.engine.max_concurrent_schedules == 0 {
        errors.push(ConfigError::Validation {
            message: "engine.max_concurrent_schedules must be at least 1".to_string(),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.delivery.max_attempts == 0 {
        errors.push(ConfigError::Validation {
            message: "delivery.max_attempts must be at least 1".to_string(),
        });
    }

    if config.delivery.retry_base_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "delivery.retry_base_secs must be at least 1".to_string(),
        });
    }

    if config.delivery.retry_cap_secs < config.delivery.retry_base_secs {
        errors.push(ConfigError::Validation {
            message: format!(
                "delivery.retry_cap_secs ({}) must be >= delivery.retry_base_secs ({})",
                config.delivery.retry_cap_secs, config.delivery.retry_base_secs
            ),
        });
    }

    if config.delivery.fanout_concurrency == 0 {
        errors.push(ConfigError::Validation {
            message: "delivery.fanout_concurrency must be at least 1".to_string(),
        });
    }

    if config.delivery.send_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "delivery.send_timeout_secs must be at least 1".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

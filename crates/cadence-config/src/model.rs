// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Cadence campaign engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Cadence configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CadenceConfig {
    /// Engine identity and tick loop settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Delivery retry and fan-out settings.
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

/// Engine identity and tick loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Display name of the engine instance.
    #[serde(default = "default_engine_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Seconds between orchestrator ticks.
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,

    /// Maximum schedules processed concurrently within one tick.
    #[serde(default = "default_max_concurrent_schedules")]
    pub max_concurrent_schedules: usize,

    /// Resolve selectors with inactive recipients included.
    #[serde(default)]
    pub include_inactive_recipients: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: default_engine_name(),
            log_level: default_log_level(),
            tick_interval_secs: default_tick_interval_secs(),
            max_concurrent_schedules: default_max_concurrent_schedules(),
            include_inactive_recipients: false,
        }
    }
}

fn default_engine_name() -> String {
    "cadence".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_tick_interval_secs() -> u64 {
    60
}

fn default_max_concurrent_schedules() -> usize {
    4
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Use WAL journal mode.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    "cadence.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Delivery retry and fan-out configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DeliveryConfig {
    /// Maximum delivery attempts per recipient (first try included).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base backoff delay after the first transient failure, in seconds.
    #[serde(default = "default_retry_base_secs")]
    pub retry_base_secs: u64,

    /// Backoff delay ceiling, in seconds.
    #[serde(default = "default_retry_cap_secs")]
    pub retry_cap_secs: u64,

    /// Concurrent channel calls within one schedule's batch.
    #[serde(default = "default_fanout_concurrency")]
    pub fanout_concurrency: usize,

    /// Timeout per channel call, in seconds. Timeouts are transient failures.
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_base_secs: default_retry_base_secs(),
            retry_cap_secs: default_retry_cap_secs(),
            fanout_concurrency: default_fanout_concurrency(),
            send_timeout_secs: default_send_timeout_secs(),
        }
    }
}

fn default_max_attempts() -> u32 {
    5
}

fn default_retry_base_secs() -> u64 {
    30
}

fn default_retry_cap_secs() -> u64 {
    30 * 60
}

fn default_fanout_concurrency() -> usize {
    8
}

fn default_send_timeout_secs() -> u64 {
    10
}

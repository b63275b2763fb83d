// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exponential backoff retry policy.

use std::time::Duration;

use cadence_config::model::DeliveryConfig;

/// Retry budget and backoff shape for transient delivery failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum tries per attempt record, first try included.
    pub max_attempts: u32,
    /// Delay after the first transient failure; doubles per retry.
    pub base: Duration,
    /// Delay ceiling.
    pub cap: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &DeliveryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base: Duration::from_secs(config.retry_base_secs),
            cap: Duration::from_secs(config.retry_cap_secs),
        }
    }

    /// Backoff delay before the next try, given the number of tries made.
    ///
    /// `base * 2^(tries - 1)`, capped. The exponent is clamped so huge
    /// attempt counts cannot overflow.
    pub fn backoff_delay(&self, tries: u32) -> Duration {
        let exp = tries.saturating_sub(1).min(31);
        self.base.saturating_mul(2u32.saturating_pow(exp)).min(self.cap)
    }

    /// Whether the retry budget is spent after `tries` tries.
    pub fn exhausted(&self, tries: u32) -> bool {
        tries >= self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&DeliveryConfig::default())
    }
}

// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound delivery channel trait for messaging transport integrations.

use async_trait::async_trait;
use thiserror::Error;

use crate::error::CadenceError;
use crate::types::{HealthStatus, Recipient, RenderedMessage};

/// Per-recipient failure reported by a delivery channel.
///
/// The transient/permanent split drives the retry policy: transient failures
/// are re-dispatched with backoff, permanent ones fail the attempt outright.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Retryable failure (timeout, rate limit, temporary outage).
    #[error("transient channel failure: {reason}")]
    Transient { reason: String },

    /// Non-retryable failure (invalid number, recipient rejected the sender).
    #[error("permanent channel failure: {reason}")]
    Permanent { reason: String },
}

impl ChannelError {
    pub fn reason(&self) -> &str {
        match self {
            Self::Transient { reason } | Self::Permanent { reason } => reason,
        }
    }
}

/// Provider-side receipt for a delivered message.
#[derive(Debug, Clone)]
pub struct ChannelReceipt {
    /// Opaque message reference assigned by the transport.
    pub message_ref: String,
}

/// Adapter for outbound message delivery to a messaging platform.
///
/// Implementations must be safe to call concurrently; the delivery tracker
/// fans out across recipients up to its configured concurrency limit.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Short identifier for logs and diagnostics.
    fn name(&self) -> &str;

    /// Deliver one rendered message to one recipient.
    async fn deliver(
        &self,
        recipient: &Recipient,
        message: &RenderedMessage,
    ) -> Result<ChannelReceipt, ChannelError>;

    /// Check connectivity to the underlying transport.
    async fn health_check(&self) -> Result<HealthStatus, CadenceError> {
        Ok(HealthStatus::Healthy)
    }
}

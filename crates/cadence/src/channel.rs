// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Console delivery channel for dry-run operation.
//!
//! Logs every delivery instead of sending it over a real transport. Wire
//! transports plug in behind the same `DeliveryChannel` trait.

use async_trait::async_trait;
use tracing::info;

use cadence_core::{ChannelError, ChannelReceipt, DeliveryChannel, Recipient, RenderedMessage};

/// A channel that prints deliveries to the log and always succeeds.
pub struct ConsoleChannel;

impl ConsoleChannel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeliveryChannel for ConsoleChannel {
    fn name(&self) -> &str {
        "console"
    }

    async fn deliver(
        &self,
        recipient: &Recipient,
        message: &RenderedMessage,
    ) -> Result<ChannelReceipt, ChannelError> {
        let preview: String = message.text.chars().take(80).collect();
        info!(
            phone = %recipient.phone,
            media = message.media.is_some(),
            text = %preview,
            "console delivery"
        );
        Ok(ChannelReceipt {
            message_ref: format!("console-{}", uuid::Uuid::new_v4()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::types::{RecipientId, RecipientStatus};
    use chrono::Utc;

    #[tokio::test]
    async fn console_delivery_always_succeeds() {
        let channel = ConsoleChannel::new();
        let now = Utc::now();
        let recipient = Recipient {
            id: RecipientId::generate(),
            name: "Alice".to_string(),
            phone: "+15551234567".to_string(),
            email: None,
            location: None,
            tags: vec![],
            groups: vec![],
            status: RecipientStatus::Active,
            messages_sent: 0,
            messages_failed: 0,
            created_at: now,
            updated_at: now,
        };
        let message = RenderedMessage {
            text: "Hi Alice".to_string(),
            media: None,
        };
        let receipt = channel.deliver(&recipient, &message).await.unwrap();
        assert!(receipt.message_ref.starts_with("console-"));
    }
}

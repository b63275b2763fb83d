// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock delivery channel for deterministic testing.
//!
//! `MockChannel` implements `DeliveryChannel` with scriptable per-phone
//! failures and captured sent messages for assertion in tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use cadence_core::{
    ChannelError, ChannelReceipt, DeliveryChannel, Recipient, RecipientId, RenderedMessage,
};
use cadence_core::types::MediaRef;

/// A message captured by [`MockChannel::deliver`].
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub recipient_id: RecipientId,
    pub phone: String,
    pub text: String,
    pub media: Option<MediaRef>,
}

/// A mock delivery channel.
///
/// By default every delivery succeeds and is captured. Failures are scripted
/// per phone number: transient failures are consumed (fail N times, then
/// succeed), permanent failures are sticky.
pub struct MockChannel {
    sent: Mutex<Vec<SentMessage>>,
    transient: Mutex<HashMap<String, u32>>,
    permanent: Mutex<HashSet<String>>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            transient: Mutex::new(HashMap::new()),
            permanent: Mutex::new(HashSet::new()),
        }
    }

    /// Script the next `times` deliveries to `phone` to fail transiently.
    pub async fn fail_transient(&self, phone: &str, times: u32) {
        self.transient.lock().await.insert(phone.to_string(), times);
    }

    /// Script every delivery to `phone` to fail permanently.
    pub async fn fail_permanent(&self, phone: &str) {
        self.permanent.lock().await.insert(phone.to_string());
    }

    /// Get all captured sent messages.
    pub async fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    /// Get the count of sent messages.
    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Clear all captured messages.
    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeliveryChannel for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    async fn deliver(
        &self,
        recipient: &Recipient,
        message: &RenderedMessage,
    ) -> Result<ChannelReceipt, ChannelError> {
        if self.permanent.lock().await.contains(&recipient.phone) {
            return Err(ChannelError::Permanent {
                reason: "invalid number".to_string(),
            });
        }

        {
            let mut transient = self.transient.lock().await;
            if let Some(remaining) = transient.get_mut(&recipient.phone)
                && *remaining > 0
            {
                *remaining -= 1;
                return Err(ChannelError::Transient {
                    reason: "rate limited".to_string(),
                });
            }
        }

        self.sent.lock().await.push(SentMessage {
            recipient_id: recipient.id.clone(),
            phone: recipient.phone.clone(),
            text: message.text.clone(),
            media: message.media.clone(),
        });
        Ok(ChannelReceipt {
            message_ref: format!("mock-msg-{}", uuid::Uuid::new_v4()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::types::RecipientStatus;
    use chrono::Utc;

    fn make_recipient(phone: &str) -> Recipient {
        let now = Utc::now();
        Recipient {
            id: RecipientId::generate(),
            name: "Test User".to_string(),
            phone: phone.to_string(),
            email: None,
            location: None,
            tags: vec![],
            groups: vec![],
            status: RecipientStatus::Active,
            messages_sent: 0,
            messages_failed: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn message(text: &str) -> RenderedMessage {
        RenderedMessage {
            text: text.to_string(),
            media: None,
        }
    }

    #[tokio::test]
    async fn deliver_captures_sent_messages() {
        let channel = MockChannel::new();
        let recipient = make_recipient("+15551234567");

        let receipt = channel
            .deliver(&recipient, &message("hello"))
            .await
            .unwrap();
        assert!(receipt.message_ref.starts_with("mock-msg-"));

        let sent = channel.sent_messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, "hello");
        assert_eq!(sent[0].phone, "+15551234567");
    }

    #[tokio::test]
    async fn transient_failures_are_consumed() {
        let channel = MockChannel::new();
        let recipient = make_recipient("+15551234567");
        channel.fail_transient("+15551234567", 2).await;

        for _ in 0..2 {
            let err = channel
                .deliver(&recipient, &message("x"))
                .await
                .unwrap_err();
            assert!(matches!(err, ChannelError::Transient { .. }));
        }
        assert!(channel.deliver(&recipient, &message("x")).await.is_ok());
        assert_eq!(channel.sent_count().await, 1);
    }

    #[tokio::test]
    async fn permanent_failures_are_sticky() {
        let channel = MockChannel::new();
        let recipient = make_recipient("+15559999999");
        channel.fail_permanent("+15559999999").await;

        for _ in 0..3 {
            let err = channel
                .deliver(&recipient, &message("x"))
                .await
                .unwrap_err();
            assert!(matches!(err, ChannelError::Permanent { .. }));
        }
        assert_eq!(channel.sent_count().await, 0);
    }

    #[tokio::test]
    async fn clear_sent_resets_capture() {
        let channel = MockChannel::new();
        let recipient = make_recipient("+15551234567");
        channel.deliver(&recipient, &message("a")).await.unwrap();
        channel.clear_sent().await;
        assert_eq!(channel.sent_count().await, 0);
    }
}

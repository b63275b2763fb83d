// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete engine stack: temp SQLite database,
//! mock delivery channel, tracker, orchestrator, and service. Tests drive
//! it through the service API and `Orchestrator::tick`.

use std::sync::Arc;

use cadence_config::model::CadenceConfig;
use cadence_core::{CadenceError, CampaignStore, Group, GroupId, Recipient};
use cadence_delivery::DeliveryTracker;
use cadence_engine::{CampaignService, Orchestrator};
use cadence_storage::SqliteStore;
use chrono::Utc;

use crate::fixtures;
use crate::mock_channel::MockChannel;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: CadenceConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = CadenceConfig::default();
        // Tests must not wait out production backoffs.
        config.delivery.send_timeout_secs = 2;
        Self { config }
    }

    /// Override the delivery retry budget.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.config.delivery.max_attempts = max_attempts;
        self
    }

    /// Resolve selectors with inactive recipients included.
    pub fn with_inactive_recipients(mut self) -> Self {
        self.config.engine.include_inactive_recipients = true;
        self
    }

    /// Replace the whole configuration.
    pub fn with_config(mut self, config: CadenceConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, CadenceError> {
        let temp_dir = tempfile::TempDir::new().map_err(|e| CadenceError::Storage {
            source: e.into(),
        })?;
        let db_path = temp_dir.path().join("test.db");
        let db_path = db_path.to_string_lossy().to_string();

        let store: Arc<dyn CampaignStore> = Arc::new(SqliteStore::open(&db_path).await?);
        let channel = Arc::new(MockChannel::new());
        let tracker = Arc::new(DeliveryTracker::new(
            store.clone(),
            channel.clone(),
            &self.config.delivery,
        ));
        let orchestrator = Arc::new(Orchestrator::new(
            store.clone(),
            tracker.clone(),
            &self.config.engine,
        ));
        let service = CampaignService::new(store.clone(), orchestrator.clone());

        Ok(TestHarness {
            store,
            channel,
            tracker,
            orchestrator,
            service,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete engine stack over a temp database and mock channel.
pub struct TestHarness {
    pub store: Arc<dyn CampaignStore>,
    pub channel: Arc<MockChannel>,
    pub tracker: Arc<DeliveryTracker>,
    pub orchestrator: Arc<Orchestrator>,
    pub service: CampaignService,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Seed a group directly into the store.
    pub async fn seed_group(&self, name: &str) -> Result<Group, CadenceError> {
        let group = Group {
            id: GroupId::generate(),
            name: name.to_string(),
            description: None,
            created_at: Utc::now(),
        };
        self.store.insert_group(&group).await?;
        Ok(group)
    }

    /// Seed an active recipient through the service (phone is canonicalized).
    pub async fn seed_recipient(
        &self,
        name: &str,
        phone: &str,
        groups: &[&str],
    ) -> Result<Recipient, CadenceError> {
        let mut spec = fixtures::recipient_spec(name, phone);
        spec.groups = groups.iter().map(|g| g.to_string()).collect();
        self.service.upsert_recipient(spec).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn harness_builds_a_working_stack() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.seed_group("Customers").await.unwrap();
        let recipient = harness
            .seed_recipient("Alice", "+1 (555) 123-4567", &["Customers"])
            .await
            .unwrap();
        assert_eq!(recipient.phone, "+15551234567");

        let groups = harness.service.list_groups().await.unwrap();
        assert_eq!(groups.len(), 1);
    }
}

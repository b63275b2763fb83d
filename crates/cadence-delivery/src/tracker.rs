// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Batch dispatch and retry sweep over the delivery channel.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use cadence_config::model::DeliveryConfig;
use cadence_core::{
    AttemptStatus, CadenceError, CampaignStore, ChannelError, DeliveryAttempt,
    DeliveryBatchResult, DeliveryChannel, Recipient, RecipientStatus, RenderedMessage, ScheduleId,
};

use crate::retry::RetryPolicy;

/// One unit of work for a dispatch: a recipient and their rendered message.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub recipient: Recipient,
    pub message: RenderedMessage,
}

/// Outcome of one retry sweep over due retrying attempts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrySweep {
    pub attempted: usize,
    pub sent: u32,
    pub failed: u32,
    pub rescheduled: u32,
    /// Terminal `(sent, failed)` deltas per schedule, so the orchestrator
    /// can fold late retry outcomes into schedule counters.
    pub by_schedule: HashMap<ScheduleId, (u64, u64)>,
}

impl RetrySweep {
    fn record_terminal(&mut self, schedule_id: &ScheduleId, sent: u64, failed: u64) {
        let entry = self.by_schedule.entry(schedule_id.clone()).or_default();
        entry.0 += sent;
        entry.1 += failed;
    }
}

/// Tracks delivery attempts and drives the channel.
///
/// Attempts are keyed by `(schedule_id, run_at, recipient_id)`; concurrent
/// retries are safe because every mutation targets that unique record. The
/// fan-out semaphore bounds concurrent channel calls across all batches to
/// keep the outbound rate bounded.
pub struct DeliveryTracker {
    store: Arc<dyn CampaignStore>,
    channel: Arc<dyn DeliveryChannel>,
    policy: RetryPolicy,
    fanout: Arc<Semaphore>,
    send_timeout: Duration,
}

impl DeliveryTracker {
    pub fn new(
        store: Arc<dyn CampaignStore>,
        channel: Arc<dyn DeliveryChannel>,
        config: &DeliveryConfig,
    ) -> Self {
        Self {
            store,
            channel,
            policy: RetryPolicy::from_config(config),
            fanout: Arc::new(Semaphore::new(config.fanout_concurrency)),
            send_timeout: Duration::from_secs(config.send_timeout_secs),
        }
    }

    /// Dispatch one schedule run to its recipients.
    ///
    /// Creates one pending attempt per recipient, fans out to the channel,
    /// and aggregates the outcomes. Idempotent: a `(schedule_id, run_at)`
    /// pair whose attempts are all terminal returns the stored result
    /// without touching the channel, and a partially-completed pair only
    /// re-drives its unsettled recipients.
    pub async fn dispatch(
        &self,
        schedule_id: &ScheduleId,
        run_at: DateTime<Utc>,
        deliveries: Vec<Delivery>,
    ) -> Result<DeliveryBatchResult, CadenceError> {
        let existing = self.store.attempts_for_run(schedule_id, run_at).await?;
        if !existing.is_empty() && existing.iter().all(|a| a.status.is_terminal()) {
            debug!(
                schedule_id = %schedule_id,
                run_at = %run_at,
                "run already completed, returning stored result"
            );
            return Ok(aggregate(&existing));
        }

        let mut by_recipient: HashMap<_, _> = existing
            .into_iter()
            .map(|a| (a.recipient_id.clone(), a))
            .collect();

        let mut settled = Vec::new();
        let mut work = Vec::new();
        for delivery in deliveries {
            match by_recipient.remove(&delivery.recipient.id) {
                Some(attempt) if attempt.status.is_terminal() => settled.push(attempt),
                Some(attempt) => work.push((attempt, delivery)),
                None => {
                    let now = Utc::now();
                    let attempt = DeliveryAttempt {
                        id: uuid::Uuid::new_v4().to_string(),
                        schedule_id: schedule_id.clone(),
                        recipient_id: delivery.recipient.id.clone(),
                        run_at,
                        payload: encode_payload(&delivery.message)?,
                        status: AttemptStatus::Pending,
                        attempt_count: 0,
                        next_retry_at: None,
                        last_error: None,
                        created_at: now,
                        updated_at: now,
                    };
                    self.store.insert_attempt(&attempt).await?;
                    work.push((attempt, delivery));
                }
            }
        }
        // Attempts from a previous partial run whose recipients are no
        // longer targeted stay settled as they are.
        settled.extend(by_recipient.into_values().filter(|a| a.status.is_terminal()));

        let mut outcomes = self.fan_out(work).await;
        outcomes.extend(settled);
        Ok(aggregate(&outcomes))
    }

    /// Re-dispatch retrying attempts whose backoff has elapsed.
    ///
    /// Invoked from the orchestrator tick. Attempts whose recipient has
    /// vanished or been blocked since the original run fail permanently.
    pub async fn process_due_retries(&self, now: DateTime<Utc>) -> Result<RetrySweep, CadenceError> {
        let due = self.store.due_retries(now).await?;
        let mut sweep = RetrySweep {
            attempted: due.len(),
            ..RetrySweep::default()
        };
        if due.is_empty() {
            return Ok(sweep);
        }

        let mut work = Vec::new();
        for attempt in due {
            let recipient = self.store.get_recipient(&attempt.recipient_id).await?;
            let delivery = match recipient {
                Some(recipient) if recipient.status != RecipientStatus::Blocked => {
                    match decode_payload(&attempt.payload) {
                        Ok(message) => Delivery { recipient, message },
                        Err(_) => {
                            sweep.failed += 1;
                            sweep.record_terminal(&attempt.schedule_id, 0, 1);
                            self.fail_attempt(attempt, "stored payload could not be decoded")
                                .await;
                            continue;
                        }
                    }
                }
                Some(_) => {
                    sweep.failed += 1;
                    sweep.record_terminal(&attempt.schedule_id, 0, 1);
                    self.fail_attempt(attempt, "recipient blocked").await;
                    continue;
                }
                None => {
                    sweep.failed += 1;
                    sweep.record_terminal(&attempt.schedule_id, 0, 1);
                    self.fail_attempt(attempt, "recipient no longer exists").await;
                    continue;
                }
            };
            work.push((attempt, delivery));
        }

        for outcome in self.fan_out(work).await {
            match outcome.status {
                AttemptStatus::Sent => {
                    sweep.sent += 1;
                    sweep.record_terminal(&outcome.schedule_id, 1, 0);
                }
                AttemptStatus::Failed => {
                    sweep.failed += 1;
                    sweep.record_terminal(&outcome.schedule_id, 0, 1);
                }
                AttemptStatus::Retrying => sweep.rescheduled += 1,
                AttemptStatus::Pending => {}
            }
        }
        Ok(sweep)
    }

    /// Drive each `(attempt, delivery)` pair through one channel try,
    /// bounded by the fan-out semaphore.
    async fn fan_out(&self, work: Vec<(DeliveryAttempt, Delivery)>) -> Vec<DeliveryAttempt> {
        let mut join_set = JoinSet::new();
        for (attempt, delivery) in work {
            let store = self.store.clone();
            let channel = self.channel.clone();
            let fanout = self.fanout.clone();
            let policy = self.policy;
            let send_timeout = self.send_timeout;
            join_set.spawn(async move {
                let _permit = fanout.acquire_owned().await.ok();
                attempt_once(store, channel, policy, send_timeout, attempt, delivery).await
            });
        }

        let mut outcomes = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(attempt) => outcomes.push(attempt),
                Err(e) => warn!(error = %e, "delivery task aborted"),
            }
        }
        outcomes
    }

    async fn fail_attempt(&self, mut attempt: DeliveryAttempt, reason: &str) {
        attempt.status = AttemptStatus::Failed;
        attempt.last_error = Some(reason.to_string());
        attempt.next_retry_at = None;
        attempt.updated_at = Utc::now();
        if let Err(e) = self.store.update_attempt(&attempt).await {
            warn!(attempt_id = %attempt.id, error = %e, "failed to persist attempt failure");
        }
        if let Err(e) = self
            .store
            .bump_recipient_counters(&attempt.recipient_id, 0, 1)
            .await
        {
            warn!(error = %e, "failed to bump recipient failure counter");
        }
    }
}

/// One channel try for one attempt, applying the retry policy to the outcome.
///
/// Persistence failures are logged, not propagated: the attempt record stays
/// in its prior state and the next dispatch or sweep re-drives it.
async fn attempt_once(
    store: Arc<dyn CampaignStore>,
    channel: Arc<dyn DeliveryChannel>,
    policy: RetryPolicy,
    send_timeout: Duration,
    mut attempt: DeliveryAttempt,
    delivery: Delivery,
) -> DeliveryAttempt {
    attempt.attempt_count += 1;

    let outcome = tokio::time::timeout(
        send_timeout,
        channel.deliver(&delivery.recipient, &delivery.message),
    )
    .await;

    let now = Utc::now();
    let mut sent_delta = 0;
    let mut failed_delta = 0;
    match outcome {
        Ok(Ok(receipt)) => {
            debug!(
                attempt_id = %attempt.id,
                message_ref = %receipt.message_ref,
                tries = attempt.attempt_count,
                "delivery succeeded"
            );
            attempt.status = AttemptStatus::Sent;
            attempt.next_retry_at = None;
            attempt.last_error = None;
            sent_delta = 1;
        }
        Ok(Err(ChannelError::Permanent { reason })) => {
            debug!(attempt_id = %attempt.id, reason, "permanent delivery failure");
            attempt.status = AttemptStatus::Failed;
            attempt.next_retry_at = None;
            attempt.last_error = Some(reason);
            failed_delta = 1;
        }
        Ok(Err(ChannelError::Transient { reason })) => {
            apply_transient(&mut attempt, &policy, now, reason, &mut failed_delta);
        }
        Err(_elapsed) => {
            let reason = format!("channel call timed out after {send_timeout:?}");
            apply_transient(&mut attempt, &policy, now, reason, &mut failed_delta);
        }
    }
    attempt.updated_at = now;

    if let Err(e) = store.update_attempt(&attempt).await {
        warn!(attempt_id = %attempt.id, error = %e, "failed to persist attempt outcome");
    }
    if (sent_delta, failed_delta) != (0, 0)
        && let Err(e) = store
            .bump_recipient_counters(&attempt.recipient_id, sent_delta, failed_delta)
            .await
    {
        warn!(error = %e, "failed to bump recipient counters");
    }

    attempt
}

fn apply_transient(
    attempt: &mut DeliveryAttempt,
    policy: &RetryPolicy,
    now: DateTime<Utc>,
    reason: String,
    failed_delta: &mut u64,
) {
    if policy.exhausted(attempt.attempt_count) {
        debug!(attempt_id = %attempt.id, reason, "retry budget exhausted");
        attempt.status = AttemptStatus::Failed;
        attempt.next_retry_at = None;
        attempt.last_error = Some(format!("retry budget exhausted: {reason}"));
        *failed_delta = 1;
    } else {
        let delay = policy.backoff_delay(attempt.attempt_count);
        debug!(
            attempt_id = %attempt.id,
            reason,
            retry_in_secs = delay.as_secs(),
            "transient delivery failure, will retry"
        );
        attempt.status = AttemptStatus::Retrying;
        attempt.next_retry_at =
            Some(now + chrono::Duration::seconds(delay.as_secs().min(i64::MAX as u64) as i64));
        attempt.last_error = Some(reason);
    }
}

fn encode_payload(message: &RenderedMessage) -> Result<String, CadenceError> {
    serde_json::to_string(message)
        .map_err(|e| CadenceError::Internal(format!("payload serialization failed: {e}")))
}

fn decode_payload(payload: &str) -> Result<RenderedMessage, CadenceError> {
    serde_json::from_str(payload)
        .map_err(|e| CadenceError::Internal(format!("payload deserialization failed: {e}")))
}

/// Aggregate a run's attempts into its batch result.
fn aggregate(attempts: &[DeliveryAttempt]) -> DeliveryBatchResult {
    let mut result = DeliveryBatchResult::default();
    for attempt in attempts {
        match attempt.status {
            AttemptStatus::Sent => result.sent += 1,
            AttemptStatus::Failed => result.failed += 1,
            AttemptStatus::Retrying | AttemptStatus::Pending => result.retrying += 1,
        }
        if attempt.status != AttemptStatus::Sent
            && let Some(reason) = &attempt.last_error
        {
            result.failure_reasons.push(reason.clone());
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cadence_core::{ChannelReceipt, RecipientId};
    use cadence_storage::SqliteStore;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Channel whose per-phone outcomes are scripted up front.
    ///
    /// Phones in `transient` fail transiently for their first N calls, then
    /// succeed; phones in `permanent` always fail permanently.
    struct ScriptedChannel {
        transient: Mutex<HashMap<String, u32>>,
        permanent: Vec<String>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedChannel {
        fn reliable() -> Self {
            Self {
                transient: Mutex::new(HashMap::new()),
                permanent: Vec::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing_transiently(phone: &str, times: u32) -> Self {
            let mut transient = HashMap::new();
            transient.insert(phone.to_string(), times);
            Self {
                transient: Mutex::new(transient),
                permanent: Vec::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing_permanently(phone: &str) -> Self {
            Self {
                transient: Mutex::new(HashMap::new()),
                permanent: vec![phone.to_string()],
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl DeliveryChannel for ScriptedChannel {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn deliver(
            &self,
            recipient: &Recipient,
            _message: &RenderedMessage,
        ) -> Result<ChannelReceipt, ChannelError> {
            self.calls.lock().unwrap().push(recipient.phone.clone());
            if self.permanent.contains(&recipient.phone) {
                return Err(ChannelError::Permanent {
                    reason: "invalid number".to_string(),
                });
            }
            let mut transient = self.transient.lock().unwrap();
            if let Some(remaining) = transient.get_mut(&recipient.phone)
                && *remaining > 0
            {
                *remaining -= 1;
                return Err(ChannelError::Transient {
                    reason: "rate limited".to_string(),
                });
            }
            Ok(ChannelReceipt {
                message_ref: format!("msg-{}", uuid::Uuid::new_v4()),
            })
        }
    }

    async fn open_store() -> (Arc<dyn CampaignStore>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("tracker.db");
        let store = SqliteStore::open(db_path.to_str().unwrap()).await.unwrap();
        (Arc::new(store), dir)
    }

    fn make_recipient(phone: &str) -> Recipient {
        let now = Utc::now();
        Recipient {
            id: RecipientId::generate(),
            name: "Test".to_string(),
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

    fn delivery_for(recipient: &Recipient) -> Delivery {
        Delivery {
            recipient: recipient.clone(),
            message: RenderedMessage {
                text: format!("Hi {}", recipient.name),
                media: None,
            },
        }
    }

    fn tracker_with(
        store: Arc<dyn CampaignStore>,
        channel: Arc<dyn DeliveryChannel>,
    ) -> DeliveryTracker {
        let config = DeliveryConfig {
            send_timeout_secs: 2,
            ..DeliveryConfig::default()
        };
        DeliveryTracker::new(store, channel, &config)
    }

    #[tokio::test]
    async fn successful_batch_marks_all_sent() {
        let (store, _dir) = open_store().await;
        let channel = Arc::new(ScriptedChannel::reliable());
        let tracker = tracker_with(store.clone(), channel.clone());

        let recipients: Vec<_> = (0..3)
            .map(|i| make_recipient(&format!("+155500000{i:02}")))
            .collect();
        for r in &recipients {
            store.upsert_recipient(r).await.unwrap();
        }

        let schedule_id = ScheduleId::generate();
        let run_at = Utc::now();
        let result = tracker
            .dispatch(
                &schedule_id,
                run_at,
                recipients.iter().map(delivery_for).collect(),
            )
            .await
            .unwrap();

        assert_eq!(result.sent, 3);
        assert_eq!(result.failed, 0);
        assert_eq!(result.retrying, 0);
        assert!(result.failure_reasons.is_empty());

        // One attempt per recipient, all terminal.
        let attempts = store.attempts_for_run(&schedule_id, run_at).await.unwrap();
        assert_eq!(attempts.len(), 3);
        assert!(attempts.iter().all(|a| a.status == AttemptStatus::Sent));

        // Recipient counters reflect the send.
        let fetched = store.get_recipient(&recipients[0].id).await.unwrap().unwrap();
        assert_eq!(fetched.messages_sent, 1);
    }

    #[tokio::test]
    async fn permanent_failure_fails_without_retry() {
        let (store, _dir) = open_store().await;
        let channel = Arc::new(ScriptedChannel::failing_permanently("+15550009999"));
        let tracker = tracker_with(store.clone(), channel.clone());

        let bad = make_recipient("+15550009999");
        store.upsert_recipient(&bad).await.unwrap();

        let schedule_id = ScheduleId::generate();
        let run_at = Utc::now();
        let result = tracker
            .dispatch(&schedule_id, run_at, vec![delivery_for(&bad)])
            .await
            .unwrap();

        assert_eq!(result.failed, 1);
        assert_eq!(result.failure_reasons, vec!["invalid number".to_string()]);

        let attempts = store.attempts_for_run(&schedule_id, run_at).await.unwrap();
        assert_eq!(attempts[0].status, AttemptStatus::Failed);
        assert_eq!(attempts[0].attempt_count, 1);
        assert!(attempts[0].next_retry_at.is_none());
    }

    #[tokio::test]
    async fn transient_failure_schedules_backoff_retry() {
        let (store, _dir) = open_store().await;
        let channel = Arc::new(ScriptedChannel::failing_transiently("+15550001111", 1));
        let tracker = tracker_with(store.clone(), channel.clone());

        let flaky = make_recipient("+15550001111");
        store.upsert_recipient(&flaky).await.unwrap();

        let schedule_id = ScheduleId::generate();
        let run_at = Utc::now();
        let result = tracker
            .dispatch(&schedule_id, run_at, vec![delivery_for(&flaky)])
            .await
            .unwrap();
        assert_eq!(result.retrying, 1);

        let attempts = store.attempts_for_run(&schedule_id, run_at).await.unwrap();
        let attempt = &attempts[0];
        assert_eq!(attempt.status, AttemptStatus::Retrying);
        assert_eq!(attempt.attempt_count, 1);
        let retry_at = attempt.next_retry_at.unwrap();
        // First backoff is the 30s base.
        let delta = (retry_at - attempt.updated_at).num_seconds();
        assert!((29..=31).contains(&delta), "unexpected backoff: {delta}s");

        // Sweep before the backoff elapses: nothing to do.
        let sweep = tracker.process_due_retries(Utc::now()).await.unwrap();
        assert_eq!(sweep.attempted, 0);

        // Sweep after the backoff: the retry succeeds on the same record.
        let sweep = tracker.process_due_retries(retry_at).await.unwrap();
        assert_eq!(sweep.attempted, 1);
        assert_eq!(sweep.sent, 1);

        let attempts = store.attempts_for_run(&schedule_id, run_at).await.unwrap();
        assert_eq!(attempts.len(), 1, "retry must not create a second record");
        assert_eq!(attempts[0].status, AttemptStatus::Sent);
        assert_eq!(attempts[0].attempt_count, 2);
    }

    #[tokio::test]
    async fn retry_budget_exhaustion_fails_the_attempt() {
        let (store, _dir) = open_store().await;
        // More transient failures than the budget allows.
        let channel = Arc::new(ScriptedChannel::failing_transiently("+15550002222", 10));
        let tracker = tracker_with(store.clone(), channel.clone());

        let flaky = make_recipient("+15550002222");
        store.upsert_recipient(&flaky).await.unwrap();

        let schedule_id = ScheduleId::generate();
        let run_at = Utc::now();
        tracker
            .dispatch(&schedule_id, run_at, vec![delivery_for(&flaky)])
            .await
            .unwrap();

        // Drive sweeps until the budget (5 tries) is spent.
        for _ in 0..4 {
            let attempts = store.attempts_for_run(&schedule_id, run_at).await.unwrap();
            let Some(retry_at) = attempts[0].next_retry_at else {
                break;
            };
            tracker.process_due_retries(retry_at).await.unwrap();
        }

        let attempts = store.attempts_for_run(&schedule_id, run_at).await.unwrap();
        assert_eq!(attempts[0].status, AttemptStatus::Failed);
        assert_eq!(attempts[0].attempt_count, 5);
        assert!(
            attempts[0]
                .last_error
                .as_deref()
                .unwrap()
                .contains("retry budget exhausted")
        );
    }

    #[tokio::test]
    async fn redispatch_of_completed_run_is_a_no_op() {
        let (store, _dir) = open_store().await;
        let channel = Arc::new(ScriptedChannel::reliable());
        let tracker = tracker_with(store.clone(), channel.clone());

        let recipient = make_recipient("+15550003333");
        store.upsert_recipient(&recipient).await.unwrap();

        let schedule_id = ScheduleId::generate();
        let run_at = Utc::now();
        let first = tracker
            .dispatch(&schedule_id, run_at, vec![delivery_for(&recipient)])
            .await
            .unwrap();
        assert_eq!(channel.call_count(), 1);

        let second = tracker
            .dispatch(&schedule_id, run_at, vec![delivery_for(&recipient)])
            .await
            .unwrap();
        assert_eq!(second, first, "stored result must be returned");
        assert_eq!(channel.call_count(), 1, "no duplicate sends");

        let attempts = store.attempts_for_run(&schedule_id, run_at).await.unwrap();
        assert_eq!(attempts.len(), 1);
    }

    #[tokio::test]
    async fn partial_run_only_redrives_unsettled_recipients() {
        let (store, _dir) = open_store().await;
        let channel = Arc::new(ScriptedChannel::failing_transiently("+15550004444", 1));
        let tracker = tracker_with(store.clone(), channel.clone());

        let ok = make_recipient("+15550005555");
        let flaky = make_recipient("+15550004444");
        store.upsert_recipient(&ok).await.unwrap();
        store.upsert_recipient(&flaky).await.unwrap();

        let schedule_id = ScheduleId::generate();
        let run_at = Utc::now();
        let deliveries = vec![delivery_for(&ok), delivery_for(&flaky)];
        let first = tracker
            .dispatch(&schedule_id, run_at, deliveries.clone())
            .await
            .unwrap();
        assert_eq!(first.sent, 1);
        assert_eq!(first.retrying, 1);
        assert_eq!(channel.call_count(), 2);

        // Orchestrator crash-retry of the same run: the sent recipient is
        // settled, only the retrying one is driven again.
        let second = tracker
            .dispatch(&schedule_id, run_at, deliveries)
            .await
            .unwrap();
        assert_eq!(channel.call_count(), 3);
        assert_eq!(second.sent, 2);

        let attempts = store.attempts_for_run(&schedule_id, run_at).await.unwrap();
        assert_eq!(attempts.len(), 2);
    }

    #[tokio::test]
    async fn blocked_recipient_fails_permanently_on_retry_sweep() {
        let (store, _dir) = open_store().await;
        let channel = Arc::new(ScriptedChannel::failing_transiently("+15550006666", 5));
        let tracker = tracker_with(store.clone(), channel.clone());

        let mut recipient = make_recipient("+15550006666");
        store.upsert_recipient(&recipient).await.unwrap();

        let schedule_id = ScheduleId::generate();
        let run_at = Utc::now();
        tracker
            .dispatch(&schedule_id, run_at, vec![delivery_for(&recipient)])
            .await
            .unwrap();

        // Recipient is blocked mid-flight.
        recipient.status = RecipientStatus::Blocked;
        store.upsert_recipient(&recipient).await.unwrap();

        let attempts = store.attempts_for_run(&schedule_id, run_at).await.unwrap();
        let retry_at = attempts[0].next_retry_at.unwrap();
        let sweep = tracker.process_due_retries(retry_at).await.unwrap();
        assert_eq!(sweep.failed, 1);

        let attempts = store.attempts_for_run(&schedule_id, run_at).await.unwrap();
        assert_eq!(attempts[0].status, AttemptStatus::Failed);
        assert_eq!(
            attempts[0].last_error.as_deref(),
            Some("recipient blocked")
        );
    }

    #[tokio::test]
    async fn empty_batch_yields_empty_result() {
        let (store, _dir) = open_store().await;
        let channel = Arc::new(ScriptedChannel::reliable());
        let tracker = tracker_with(store, channel);

        let result = tracker
            .dispatch(&ScheduleId::generate(), Utc::now(), vec![])
            .await
            .unwrap();
        assert_eq!(result, DeliveryBatchResult::default());
    }
}

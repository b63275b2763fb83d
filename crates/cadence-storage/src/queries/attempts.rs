// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery attempt queries.
//!
//! Attempts are keyed uniquely by `(schedule_id, run_at, recipient_id)`;
//! retries update the same row rather than inserting duplicates.

use chrono::{DateTime, Utc};
use rusqlite::params;

use cadence_core::CadenceError;
use cadence_core::traits::store::AttemptTotals;
use cadence_core::types::{DeliveryAttempt, RecipientId, ScheduleId};

use crate::codec;
use crate::database::{Database, map_tr_err};

const COLUMNS: &str = "id, schedule_id, recipient_id, run_at, payload, status, attempt_count, \
                       next_retry_at, last_error, created_at, updated_at";

fn row_to_attempt(row: &rusqlite::Row<'_>) -> Result<DeliveryAttempt, rusqlite::Error> {
    Ok(DeliveryAttempt {
        id: row.get(0)?,
        schedule_id: ScheduleId(row.get(1)?),
        recipient_id: RecipientId(row.get(2)?),
        run_at: codec::decode_ts(3, &row.get::<_, String>(3)?)?,
        payload: row.get(4)?,
        status: codec::decode_enum(5, &row.get::<_, String>(5)?)?,
        attempt_count: row.get::<_, i64>(6)? as u32,
        next_retry_at: codec::decode_opt_ts(7, row.get::<_, Option<String>>(7)?.as_deref())?,
        last_error: row.get(8)?,
        created_at: codec::decode_ts(9, &row.get::<_, String>(9)?)?,
        updated_at: codec::decode_ts(10, &row.get::<_, String>(10)?)?,
    })
}

/// Insert a new attempt record.
///
/// Violating the `(schedule_id, run_at, recipient_id)` uniqueness constraint
/// is a storage error; callers check for an existing record first.
pub async fn insert_attempt(db: &Database, attempt: &DeliveryAttempt) -> Result<(), CadenceError> {
    let a = attempt.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO delivery_attempts (id, schedule_id, recipient_id, run_at, payload, \
                 status, attempt_count, next_retry_at, last_error, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    a.id,
                    a.schedule_id.0,
                    a.recipient_id.0,
                    codec::encode_ts(a.run_at),
                    a.payload,
                    a.status.to_string(),
                    a.attempt_count as i64,
                    codec::encode_opt_ts(a.next_retry_at),
                    a.last_error,
                    codec::encode_ts(a.created_at),
                    codec::encode_ts(a.updated_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Update an attempt's mutable state (status, count, retry time, error).
pub async fn update_attempt(db: &Database, attempt: &DeliveryAttempt) -> Result<(), CadenceError> {
    let a = attempt.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE delivery_attempts SET status = ?2, attempt_count = ?3, \
                 next_retry_at = ?4, last_error = ?5, updated_at = ?6
                 WHERE id = ?1",
                params![
                    a.id,
                    a.status.to_string(),
                    a.attempt_count as i64,
                    codec::encode_opt_ts(a.next_retry_at),
                    a.last_error,
                    codec::encode_ts(a.updated_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// All attempts for one `(schedule, run)` pair, in recipient insertion order.
pub async fn attempts_for_run(
    db: &Database,
    schedule_id: &ScheduleId,
    run_at: DateTime<Utc>,
) -> Result<Vec<DeliveryAttempt>, CadenceError> {
    let schedule_id = schedule_id.0.clone();
    let run_at = codec::encode_ts(run_at);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM delivery_attempts
                 WHERE schedule_id = ?1 AND run_at = ?2
                 ORDER BY created_at ASC, id ASC"
            ))?;
            let rows = stmt.query_map(params![schedule_id, run_at], row_to_attempt)?;
            let mut attempts = Vec::new();
            for row in rows {
                attempts.push(row?);
            }
            Ok(attempts)
        })
        .await
        .map_err(map_tr_err)
}

/// Full delivery history for a schedule, newest run first.
pub async fn attempts_for_schedule(
    db: &Database,
    schedule_id: &ScheduleId,
) -> Result<Vec<DeliveryAttempt>, CadenceError> {
    let schedule_id = schedule_id.0.clone();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM delivery_attempts
                 WHERE schedule_id = ?1
                 ORDER BY run_at DESC, created_at ASC, id ASC"
            ))?;
            let rows = stmt.query_map(params![schedule_id], row_to_attempt)?;
            let mut attempts = Vec::new();
            for row in rows {
                attempts.push(row?);
            }
            Ok(attempts)
        })
        .await
        .map_err(map_tr_err)
}

/// Retrying attempts whose backoff has elapsed at `now`.
pub async fn due_retries(
    db: &Database,
    now: DateTime<Utc>,
) -> Result<Vec<DeliveryAttempt>, CadenceError> {
    let now = codec::encode_ts(now);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM delivery_attempts
                 WHERE status = 'retrying' AND next_retry_at IS NOT NULL AND next_retry_at <= ?1
                 ORDER BY next_retry_at ASC, id ASC"
            ))?;
            let rows = stmt.query_map(params![now], row_to_attempt)?;
            let mut attempts = Vec::new();
            for row in rows {
                attempts.push(row?);
            }
            Ok(attempts)
        })
        .await
        .map_err(map_tr_err)
}

/// Attempt counts by status across all schedules.
pub async fn attempt_totals(db: &Database) -> Result<AttemptTotals, CadenceError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT status, COUNT(*) FROM delivery_attempts GROUP BY status",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            let mut totals = AttemptTotals::default();
            for row in rows {
                let (status, count) = row?;
                let count = count as u64;
                match status.as_str() {
                    "pending" => totals.pending = count,
                    "sent" => totals.sent = count,
                    "failed" => totals.failed = count,
                    "retrying" => totals.retrying = count,
                    _ => {}
                }
            }
            Ok(totals)
        })
        .await
        .map_err(map_tr_err)
}

/// Count of attempts marked sent at or after `since`.
pub async fn sent_since(db: &Database, since: DateTime<Utc>) -> Result<u64, CadenceError> {
    let since = codec::encode_ts(since);
    db.connection()
        .call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM delivery_attempts
                 WHERE status = 'sent' AND updated_at >= ?1",
                params![since],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::tempdir;

    use cadence_core::types::AttemptStatus;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("attempts.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn make_attempt(
        schedule_id: &ScheduleId,
        run_at: DateTime<Utc>,
        status: AttemptStatus,
    ) -> DeliveryAttempt {
        DeliveryAttempt {
            id: uuid::Uuid::new_v4().to_string(),
            schedule_id: schedule_id.clone(),
            recipient_id: RecipientId::generate(),
            run_at,
            payload: "Hi Alice".to_string(),
            status,
            attempt_count: 1,
            next_retry_at: None,
            last_error: None,
            created_at: run_at,
            updated_at: run_at,
        }
    }

    #[tokio::test]
    async fn duplicate_run_recipient_pair_is_rejected() {
        let (db, _dir) = setup_db().await;
        let schedule_id = ScheduleId::generate();
        let run_at = Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap();
        let attempt = make_attempt(&schedule_id, run_at, AttemptStatus::Pending);
        insert_attempt(&db, &attempt).await.unwrap();

        let mut dup = attempt.clone();
        dup.id = uuid::Uuid::new_v4().to_string();
        assert!(insert_attempt(&db, &dup).await.is_err());
    }

    #[tokio::test]
    async fn attempts_for_run_scopes_to_the_pair() {
        let (db, _dir) = setup_db().await;
        let schedule_id = ScheduleId::generate();
        let run_a = Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap();
        let run_b = run_a + Duration::days(1);

        insert_attempt(&db, &make_attempt(&schedule_id, run_a, AttemptStatus::Sent))
            .await
            .unwrap();
        insert_attempt(&db, &make_attempt(&schedule_id, run_b, AttemptStatus::Sent))
            .await
            .unwrap();

        let for_a = attempts_for_run(&db, &schedule_id, run_a).await.unwrap();
        assert_eq!(for_a.len(), 1);
        assert_eq!(for_a[0].run_at, run_a);

        let history = attempts_for_schedule(&db, &schedule_id).await.unwrap();
        assert_eq!(history.len(), 2);
        // Newest run first.
        assert_eq!(history[0].run_at, run_b);
    }

    #[tokio::test]
    async fn update_mutates_the_same_record() {
        let (db, _dir) = setup_db().await;
        let schedule_id = ScheduleId::generate();
        let run_at = Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap();
        let mut attempt = make_attempt(&schedule_id, run_at, AttemptStatus::Pending);
        insert_attempt(&db, &attempt).await.unwrap();

        attempt.status = AttemptStatus::Retrying;
        attempt.attempt_count = 2;
        attempt.next_retry_at = Some(run_at + Duration::seconds(60));
        attempt.last_error = Some("rate limited".to_string());
        update_attempt(&db, &attempt).await.unwrap();

        let fetched = attempts_for_run(&db, &schedule_id, run_at).await.unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].status, AttemptStatus::Retrying);
        assert_eq!(fetched[0].attempt_count, 2);
        assert_eq!(fetched[0].last_error.as_deref(), Some("rate limited"));
    }

    #[tokio::test]
    async fn due_retries_respects_backoff_deadline() {
        let (db, _dir) = setup_db().await;
        let schedule_id = ScheduleId::generate();
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap();

        let mut due = make_attempt(&schedule_id, now, AttemptStatus::Retrying);
        due.next_retry_at = Some(now - Duration::seconds(10));
        insert_attempt(&db, &due).await.unwrap();

        let mut later = make_attempt(&schedule_id, now - Duration::days(1), AttemptStatus::Retrying);
        later.next_retry_at = Some(now + Duration::minutes(10));
        insert_attempt(&db, &later).await.unwrap();

        let ready = due_retries(&db, now).await.unwrap();
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].id, due.id);
    }

    #[tokio::test]
    async fn totals_and_sent_since_aggregate() {
        let (db, _dir) = setup_db().await;
        let schedule_id = ScheduleId::generate();
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap();

        insert_attempt(&db, &make_attempt(&schedule_id, now, AttemptStatus::Sent))
            .await
            .unwrap();
        insert_attempt(
            &db,
            &make_attempt(&schedule_id, now - Duration::days(2), AttemptStatus::Sent),
        )
        .await
        .unwrap();
        insert_attempt(
            &db,
            &make_attempt(&schedule_id, now - Duration::days(3), AttemptStatus::Failed),
        )
        .await
        .unwrap();

        let totals = attempt_totals(&db).await.unwrap();
        assert_eq!(totals.sent, 2);
        assert_eq!(totals.failed, 1);
        assert_eq!(totals.pending, 0);

        let today = sent_since(&db, now - Duration::hours(12)).await.unwrap();
        assert_eq!(today, 1);
    }
}

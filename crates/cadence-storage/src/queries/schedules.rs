// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Schedule CRUD and due-selection queries.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};

use cadence_core::types::{Schedule, ScheduleId, ScheduleStatus, TemplateId};
use cadence_core::CadenceError;

use crate::codec;
use crate::database::{Database, map_tr_err};

const COLUMNS: &str = "id, name, description, template_id, rule, selector, bindings, status, \
                       next_run_at, last_run_at, sent_count, failed_count, pause_reason, \
                       created_at, updated_at";

fn row_to_schedule(row: &rusqlite::Row<'_>) -> Result<Schedule, rusqlite::Error> {
    Ok(Schedule {
        id: ScheduleId(row.get(0)?),
        name: row.get(1)?,
        description: row.get(2)?,
        template_id: TemplateId(row.get(3)?),
        rule: codec::decode_json(4, &row.get::<_, String>(4)?)?,
        selector: codec::decode_json(5, &row.get::<_, String>(5)?)?,
        bindings: codec::decode_json(6, &row.get::<_, String>(6)?)?,
        status: codec::decode_enum(7, &row.get::<_, String>(7)?)?,
        next_run_at: codec::decode_opt_ts(8, row.get::<_, Option<String>>(8)?.as_deref())?,
        last_run_at: codec::decode_opt_ts(9, row.get::<_, Option<String>>(9)?.as_deref())?,
        sent_count: row.get::<_, i64>(10)? as u64,
        failed_count: row.get::<_, i64>(11)? as u64,
        pause_reason: row.get(12)?,
        created_at: codec::decode_ts(13, &row.get::<_, String>(13)?)?,
        updated_at: codec::decode_ts(14, &row.get::<_, String>(14)?)?,
    })
}

/// Insert a new schedule.
pub async fn insert_schedule(db: &Database, schedule: &Schedule) -> Result<(), CadenceError> {
    let s = schedule.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO schedules (id, name, description, template_id, rule, selector, \
                 bindings, status, next_run_at, last_run_at, sent_count, failed_count, \
                 pause_reason, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                params![
                    s.id.0,
                    s.name,
                    s.description,
                    s.template_id.0,
                    codec::encode_json(&s.rule)?,
                    codec::encode_json(&s.selector)?,
                    codec::encode_json(&s.bindings)?,
                    s.status.to_string(),
                    codec::encode_opt_ts(s.next_run_at),
                    codec::encode_opt_ts(s.last_run_at),
                    s.sent_count as i64,
                    s.failed_count as i64,
                    s.pause_reason,
                    codec::encode_ts(s.created_at),
                    codec::encode_ts(s.updated_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a schedule by id.
pub async fn get_schedule(
    db: &Database,
    id: &ScheduleId,
) -> Result<Option<Schedule>, CadenceError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| {
            let schedule = conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM schedules WHERE id = ?1"),
                    params![id],
                    row_to_schedule,
                )
                .optional()?;
            Ok(schedule)
        })
        .await
        .map_err(map_tr_err)
}

/// List schedules in creation order, optionally filtered by status.
pub async fn list_schedules(
    db: &Database,
    status: Option<ScheduleStatus>,
) -> Result<Vec<Schedule>, CadenceError> {
    db.connection()
        .call(move |conn| {
            let mut schedules = Vec::new();
            match status {
                Some(status) => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {COLUMNS} FROM schedules WHERE status = ?1
                         ORDER BY created_at ASC, id ASC"
                    ))?;
                    let rows = stmt.query_map(params![status.to_string()], row_to_schedule)?;
                    for row in rows {
                        schedules.push(row?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {COLUMNS} FROM schedules ORDER BY created_at ASC, id ASC"
                    ))?;
                    let rows = stmt.query_map([], row_to_schedule)?;
                    for row in rows {
                        schedules.push(row?);
                    }
                }
            }
            Ok(schedules)
        })
        .await
        .map_err(map_tr_err)
}

/// Persist all mutable fields of a schedule.
pub async fn update_schedule(db: &Database, schedule: &Schedule) -> Result<(), CadenceError> {
    let s = schedule.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE schedules SET name = ?2, description = ?3, template_id = ?4, rule = ?5, \
                 selector = ?6, bindings = ?7, status = ?8, next_run_at = ?9, last_run_at = ?10, \
                 sent_count = ?11, failed_count = ?12, pause_reason = ?13, updated_at = ?14
                 WHERE id = ?1",
                params![
                    s.id.0,
                    s.name,
                    s.description,
                    s.template_id.0,
                    codec::encode_json(&s.rule)?,
                    codec::encode_json(&s.selector)?,
                    codec::encode_json(&s.bindings)?,
                    s.status.to_string(),
                    codec::encode_opt_ts(s.next_run_at),
                    codec::encode_opt_ts(s.last_run_at),
                    s.sent_count as i64,
                    s.failed_count as i64,
                    s.pause_reason,
                    codec::encode_ts(s.updated_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a schedule by id.
pub async fn delete_schedule(db: &Database, id: &ScheduleId) -> Result<(), CadenceError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| {
            conn.execute("DELETE FROM schedules WHERE id = ?1", params![id])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Active schedules due at or before `now`, ordered by `next_run_at`.
pub async fn due_schedules(
    db: &Database,
    now: DateTime<Utc>,
) -> Result<Vec<Schedule>, CadenceError> {
    let now = codec::encode_ts(now);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM schedules
                 WHERE status = 'active' AND next_run_at IS NOT NULL AND next_run_at <= ?1
                 ORDER BY next_run_at ASC, id ASC"
            ))?;
            let rows = stmt.query_map(params![now], row_to_schedule)?;
            let mut schedules = Vec::new();
            for row in rows {
                schedules.push(row?);
            }
            Ok(schedules)
        })
        .await
        .map_err(map_tr_err)
}

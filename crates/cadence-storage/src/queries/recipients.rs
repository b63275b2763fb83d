// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recipient and group queries.
//!
//! Tag and group membership filters use `json_each` over the JSON array
//! columns, so membership is derived from the recipient's own sets rather
//! than a join table.

use rusqlite::{OptionalExtension, params, params_from_iter};

use cadence_core::CadenceError;
use cadence_core::traits::store::RecipientFilter;
use cadence_core::types::{Group, GroupId, Recipient, RecipientId};

use crate::codec;
use crate::database::{Database, map_tr_err};

const COLUMNS: &str = "id, name, phone, email, location, tags, \"groups\", status, \
                       messages_sent, messages_failed, created_at, updated_at";

fn row_to_recipient(row: &rusqlite::Row<'_>) -> Result<Recipient, rusqlite::Error> {
    Ok(Recipient {
        id: RecipientId(row.get(0)?),
        name: row.get(1)?,
        phone: row.get(2)?,
        email: row.get(3)?,
        location: row.get(4)?,
        tags: codec::decode_json(5, &row.get::<_, String>(5)?)?,
        groups: codec::decode_json(6, &row.get::<_, String>(6)?)?,
        status: codec::decode_enum(7, &row.get::<_, String>(7)?)?,
        messages_sent: row.get::<_, i64>(8)? as u64,
        messages_failed: row.get::<_, i64>(9)? as u64,
        created_at: codec::decode_ts(10, &row.get::<_, String>(10)?)?,
        updated_at: codec::decode_ts(11, &row.get::<_, String>(11)?)?,
    })
}

/// Insert or fully replace a recipient by id.
pub async fn upsert_recipient(db: &Database, recipient: &Recipient) -> Result<(), CadenceError> {
    let r = recipient.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO recipients (id, name, phone, email, location, tags, \"groups\", \
                 status, messages_sent, messages_failed, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                 ON CONFLICT (id) DO UPDATE SET
                     name = excluded.name,
                     phone = excluded.phone,
                     email = excluded.email,
                     location = excluded.location,
                     tags = excluded.tags,
                     \"groups\" = excluded.\"groups\",
                     status = excluded.status,
                     messages_sent = excluded.messages_sent,
                     messages_failed = excluded.messages_failed,
                     updated_at = excluded.updated_at",
                params![
                    r.id.0,
                    r.name,
                    r.phone,
                    r.email,
                    r.location,
                    codec::encode_json(&r.tags)?,
                    codec::encode_json(&r.groups)?,
                    r.status.to_string(),
                    r.messages_sent as i64,
                    r.messages_failed as i64,
                    codec::encode_ts(r.created_at),
                    codec::encode_ts(r.updated_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a recipient by id.
pub async fn get_recipient(
    db: &Database,
    id: &RecipientId,
) -> Result<Option<Recipient>, CadenceError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| {
            let recipient = conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM recipients WHERE id = ?1"),
                    params![id],
                    row_to_recipient,
                )
                .optional()?;
            Ok(recipient)
        })
        .await
        .map_err(map_tr_err)
}

/// List recipients matching the filter, in creation order.
///
/// Ordering by `(created_at, id)` is stable across calls, which selector
/// resolution relies on for determinism.
pub async fn list_recipients(
    db: &Database,
    filter: &RecipientFilter,
) -> Result<Vec<Recipient>, CadenceError> {
    let filter = filter.clone();
    db.connection()
        .call(move |conn| {
            let mut clauses: Vec<&str> = Vec::new();
            let mut args: Vec<String> = Vec::new();
            if let Some(status) = filter.status {
                clauses.push("status = ?");
                args.push(status.to_string());
            }
            if let Some(tag) = filter.tag {
                clauses.push(
                    "EXISTS (SELECT 1 FROM json_each(recipients.tags) WHERE json_each.value = ?)",
                );
                args.push(tag);
            }
            if let Some(group) = filter.group {
                clauses.push(
                    "EXISTS (SELECT 1 FROM json_each(recipients.\"groups\") \
                     WHERE json_each.value = ?)",
                );
                args.push(group);
            }

            let mut sql = format!("SELECT {COLUMNS} FROM recipients");
            if !clauses.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&clauses.join(" AND "));
            }
            sql.push_str(" ORDER BY created_at ASC, id ASC");

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(args), row_to_recipient)?;
            let mut recipients = Vec::new();
            for row in rows {
                recipients.push(row?);
            }
            Ok(recipients)
        })
        .await
        .map_err(map_tr_err)
}

/// Add sent/failed deltas to a recipient's delivery counters.
pub async fn bump_recipient_counters(
    db: &Database,
    id: &RecipientId,
    sent_delta: u64,
    failed_delta: u64,
) -> Result<(), CadenceError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE recipients SET
                     messages_sent = messages_sent + ?2,
                     messages_failed = messages_failed + ?3
                 WHERE id = ?1",
                params![id, sent_delta as i64, failed_delta as i64],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a new group. Group names are unique.
pub async fn insert_group(db: &Database, group: &Group) -> Result<(), CadenceError> {
    let g = group.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO groups (id, name, description, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![g.id.0, g.name, g.description, codec::encode_ts(g.created_at)],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Look up a group by its unique name.
pub async fn get_group_by_name(db: &Database, name: &str) -> Result<Option<Group>, CadenceError> {
    let name = name.to_string();
    db.connection()
        .call(move |conn| {
            let group = conn
                .query_row(
                    "SELECT id, name, description, created_at FROM groups WHERE name = ?1",
                    params![name],
                    |row| {
                        Ok(Group {
                            id: GroupId(row.get(0)?),
                            name: row.get(1)?,
                            description: row.get(2)?,
                            created_at: codec::decode_ts(3, &row.get::<_, String>(3)?)?,
                        })
                    },
                )
                .optional()?;
            Ok(group)
        })
        .await
        .map_err(map_tr_err)
}

/// List all groups in creation order.
pub async fn list_groups(db: &Database) -> Result<Vec<Group>, CadenceError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, description, created_at FROM groups
                 ORDER BY created_at ASC, id ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(Group {
                    id: GroupId(row.get(0)?),
                    name: row.get(1)?,
                    description: row.get(2)?,
                    created_at: codec::decode_ts(3, &row.get::<_, String>(3)?)?,
                })
            })?;
            let mut groups = Vec::new();
            for row in rows {
                groups.push(row?);
            }
            Ok(groups)
        })
        .await
        .map_err(map_tr_err)
}

// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Template CRUD and in-use queries.

use rusqlite::{OptionalExtension, params};

use cadence_core::CadenceError;
use cadence_core::types::{MediaRef, Template, TemplateId};

use crate::codec;
use crate::database::{Database, map_tr_err};

const COLUMNS: &str = "id, name, category, content, media, created_at, updated_at";

fn row_to_template(row: &rusqlite::Row<'_>) -> Result<Template, rusqlite::Error> {
    let media: Option<MediaRef> = match row.get::<_, Option<String>>(4)? {
        Some(text) => Some(codec::decode_json(4, &text)?),
        None => None,
    };
    Ok(Template {
        id: TemplateId(row.get(0)?),
        name: row.get(1)?,
        category: row.get(2)?,
        content: row.get(3)?,
        media,
        created_at: codec::decode_ts(5, &row.get::<_, String>(5)?)?,
        updated_at: codec::decode_ts(6, &row.get::<_, String>(6)?)?,
    })
}

/// Insert a new template.
pub async fn insert_template(db: &Database, template: &Template) -> Result<(), CadenceError> {
    let t = template.clone();
    db.connection()
        .call(move |conn| {
            let media = match &t.media {
                Some(media) => Some(codec::encode_json(media)?),
                None => None,
            };
            conn.execute(
                "INSERT INTO templates (id, name, category, content, media, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    t.id.0,
                    t.name,
                    t.category,
                    t.content,
                    media,
                    codec::encode_ts(t.created_at),
                    codec::encode_ts(t.updated_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a template by id.
pub async fn get_template(
    db: &Database,
    id: &TemplateId,
) -> Result<Option<Template>, CadenceError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| {
            let template = conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM templates WHERE id = ?1"),
                    params![id],
                    row_to_template,
                )
                .optional()?;
            Ok(template)
        })
        .await
        .map_err(map_tr_err)
}

/// List templates in creation order, optionally filtered by category.
pub async fn list_templates(
    db: &Database,
    category: Option<&str>,
) -> Result<Vec<Template>, CadenceError> {
    let category = category.map(|c| c.to_string());
    db.connection()
        .call(move |conn| {
            let mut templates = Vec::new();
            match category {
                Some(category) => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {COLUMNS} FROM templates WHERE category = ?1
                         ORDER BY created_at ASC, id ASC"
                    ))?;
                    let rows = stmt.query_map(params![category], row_to_template)?;
                    for row in rows {
                        templates.push(row?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {COLUMNS} FROM templates ORDER BY created_at ASC, id ASC"
                    ))?;
                    let rows = stmt.query_map([], row_to_template)?;
                    for row in rows {
                        templates.push(row?);
                    }
                }
            }
            Ok(templates)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a template by id.
pub async fn delete_template(db: &Database, id: &TemplateId) -> Result<(), CadenceError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| {
            conn.execute("DELETE FROM templates WHERE id = ?1", params![id])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Whether any active schedule references this template.
pub async fn template_in_use(db: &Database, id: &TemplateId) -> Result<bool, CadenceError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| {
            let in_use: bool = conn.query_row(
                "SELECT EXISTS (
                     SELECT 1 FROM schedules WHERE template_id = ?1 AND status = 'active'
                 )",
                params![id],
                |row| row.get(0),
            )?;
            Ok(in_use)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    use cadence_core::types::MediaKind;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("templates.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn make_template(name: &str, category: &str, media: Option<MediaRef>) -> Template {
        let now = Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap();
        Template {
            id: TemplateId::generate(),
            name: name.to_string(),
            category: category.to_string(),
            content: "Hi {name}!".to_string(),
            media,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn insert_and_get_with_media() {
        let (db, _dir) = setup_db().await;
        let media = MediaRef {
            kind: MediaKind::Image,
            url: "/product-image.jpg".to_string(),
            size_bytes: 1024,
        };
        let template = make_template("Product Launch", "Marketing", Some(media.clone()));
        insert_template(&db, &template).await.unwrap();

        let fetched = get_template(&db, &template.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Product Launch");
        assert_eq!(fetched.media, Some(media));
    }

    #[tokio::test]
    async fn list_filters_by_category() {
        let (db, _dir) = setup_db().await;
        insert_template(&db, &make_template("n1", "Newsletter", None))
            .await
            .unwrap();
        insert_template(&db, &make_template("m1", "Marketing", None))
            .await
            .unwrap();

        let marketing = list_templates(&db, Some("Marketing")).await.unwrap();
        assert_eq!(marketing.len(), 1);
        assert_eq!(marketing[0].name, "m1");

        let all = list_templates(&db, None).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn in_use_reflects_active_schedules_only() {
        use cadence_core::types::{
            RecipientSelector, RecurrenceRule, Schedule, ScheduleId, ScheduleStatus,
        };
        use std::collections::HashMap;

        let (db, _dir) = setup_db().await;
        let template = make_template("t", "Newsletter", None);
        insert_template(&db, &template).await.unwrap();
        assert!(!template_in_use(&db, &template.id).await.unwrap());

        let now = Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap();
        let mut schedule = Schedule {
            id: ScheduleId::generate(),
            name: "s".to_string(),
            description: None,
            template_id: template.id.clone(),
            rule: RecurrenceRule::Triggered,
            selector: RecipientSelector::All,
            bindings: HashMap::new(),
            status: ScheduleStatus::Active,
            next_run_at: None,
            last_run_at: None,
            sent_count: 0,
            failed_count: 0,
            pause_reason: None,
            created_at: now,
            updated_at: now,
        };
        crate::queries::schedules::insert_schedule(&db, &schedule)
            .await
            .unwrap();
        assert!(template_in_use(&db, &template.id).await.unwrap());

        schedule.status = ScheduleStatus::Paused;
        crate::queries::schedules::update_schedule(&db, &schedule)
            .await
            .unwrap();
        assert!(!template_in_use(&db, &template.id).await.unwrap());
    }

    #[tokio::test]
    async fn delete_removes_template() {
        let (db, _dir) = setup_db().await;
        let template = make_template("gone", "Seasonal", None);
        insert_template(&db, &template).await.unwrap();
        delete_template(&db, &template.id).await.unwrap();
        assert!(get_template(&db, &template.id).await.unwrap().is_none());
    }
}

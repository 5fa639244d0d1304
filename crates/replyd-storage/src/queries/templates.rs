// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply template operations.

use replyd_core::types::Template;
use replyd_core::ReplydError;
use rusqlite::{params, Row};

use super::optional;
use crate::database::{map_tr_err, Database};

fn template_from_row(row: &Row<'_>) -> rusqlite::Result<Template> {
    Ok(Template {
        id: row.get(0)?,
        name: row.get(1)?,
        body: row.get(2)?,
        created_at: row.get(3)?,
    })
}

pub async fn create_template(db: &Database, name: &str, body: &str) -> Result<Template, ReplydError> {
    let name = name.to_string();
    let body = body.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "INSERT INTO templates (name, body) VALUES (?1, ?2)
                 RETURNING id, name, body, created_at",
                params![name, body],
                template_from_row,
            )
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_template(db: &Database, id: i64) -> Result<Option<Template>, ReplydError> {
    db.connection()
        .call(move |conn| {
            optional(conn.query_row(
                "SELECT id, name, body, created_at FROM templates WHERE id = ?1",
                params![id],
                template_from_row,
            ))
        })
        .await
        .map_err(map_tr_err)
}

pub async fn list_templates(db: &Database) -> Result<Vec<Template>, ReplydError> {
    db.connection()
        .call(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, name, body, created_at FROM templates ORDER BY id")?;
            let rows = stmt.query_map([], template_from_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a template. Replies created from it keep their content and lose
/// the reference via `ON DELETE SET NULL`.
pub async fn delete_template(db: &Database, id: i64) -> Result<bool, ReplydError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute("DELETE FROM templates WHERE id = ?1", params![id])?;
            Ok::<_, rusqlite::Error>(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::setup_db;

    #[tokio::test]
    async fn template_crud() {
        let (db, _dir) = setup_db().await;

        let t = create_template(&db, "감사", "{고객명}님 감사합니다").await.unwrap();
        assert_eq!(t.name, "감사");
        assert_eq!(get_template(&db, t.id).await.unwrap(), Some(t.clone()));
        assert_eq!(list_templates(&db).await.unwrap().len(), 1);

        assert!(delete_template(&db, t.id).await.unwrap());
        assert!(!delete_template(&db, t.id).await.unwrap());
        assert!(get_template(&db, t.id).await.unwrap().is_none());
    }
}

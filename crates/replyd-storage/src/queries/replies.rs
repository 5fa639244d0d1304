// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply creation and lookup.

use replyd_core::types::{NewReply, Reply, ReplyContext};
use replyd_core::ReplydError;
use rusqlite::{params, Row};
use tracing::debug;

use super::{optional, status_column};
use crate::database::{map_tr_err, Database};

const REPLY_COLUMNS: &str =
    "id, review_id, template_id, content, status, fail_reason, created_at";

fn reply_from_row(row: &Row<'_>) -> rusqlite::Result<Reply> {
    let status: String = row.get(4)?;
    Ok(Reply {
        id: row.get(0)?,
        review_id: row.get(1)?,
        template_id: row.get(2)?,
        content: row.get(3)?,
        status: status_column(4, &status)?,
        fail_reason: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Resolve rendering context for each review id, in input order.
///
/// Ids with no review are omitted. The owning store and platform are
/// joined leniently and come back as `None` when unresolvable.
pub async fn reply_contexts(
    db: &Database,
    review_ids: &[i64],
) -> Result<Vec<ReplyContext>, ReplydError> {
    let review_ids = review_ids.to_vec();
    db.connection()
        .call(move |conn| -> Result<Vec<ReplyContext>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT r.id, r.customer_name, r.subject, s.name, a.platform
                 FROM reviews r
                 LEFT JOIN accounts a ON a.id = r.account_id
                 LEFT JOIN stores s ON s.id = a.store_id
                 WHERE r.id = ?1",
            )?;
            let mut contexts = Vec::with_capacity(review_ids.len());
            for id in review_ids {
                let context = optional(stmt.query_row(params![id], |row| {
                    Ok(ReplyContext {
                        review_id: row.get(0)?,
                        customer_name: row.get(1)?,
                        subject: row.get(2)?,
                        store_name: row.get(3)?,
                        platform: row.get(4)?,
                    })
                }))?;
                contexts.extend(context);
            }
            Ok(contexts)
        })
        .await
        .map_err(map_tr_err)
}

/// Insert each reply together with a PENDING job, all in one transaction.
///
/// A review that no longer exists, or that already has a PENDING or POSTED
/// reply, is skipped. Returns the number of reply/job pairs created.
pub async fn create_replies(
    db: &Database,
    template_id: Option<i64>,
    replies: &[NewReply],
) -> Result<usize, ReplydError> {
    let replies = replies.to_vec();
    let created = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            let tx = conn.transaction()?;
            let mut created = 0;
            {
                let mut review_exists =
                    tx.prepare("SELECT EXISTS (SELECT 1 FROM reviews WHERE id = ?1)")?;
                let mut has_active = tx.prepare(
                    "SELECT EXISTS (
                         SELECT 1 FROM replies
                         WHERE review_id = ?1 AND status IN ('PENDING', 'POSTED'))",
                )?;
                let mut insert_reply = tx.prepare(
                    "INSERT INTO replies (review_id, template_id, content) VALUES (?1, ?2, ?3)",
                )?;
                let mut insert_job =
                    tx.prepare("INSERT INTO reply_jobs (reply_id) VALUES (?1)")?;

                for reply in &replies {
                    let exists: bool =
                        review_exists.query_row(params![reply.review_id], |row| row.get(0))?;
                    let active: bool =
                        has_active.query_row(params![reply.review_id], |row| row.get(0))?;
                    if !exists || active {
                        debug!(review_id = reply.review_id, exists, active, "reply skipped");
                        continue;
                    }
                    let reply_id = insert_reply.insert(params![
                        reply.review_id,
                        template_id,
                        reply.content
                    ])?;
                    insert_job.execute(params![reply_id])?;
                    created += 1;
                }
            }
            tx.commit()?;
            Ok(created)
        })
        .await
        .map_err(map_tr_err)?;
    Ok(created)
}

pub async fn get_reply(db: &Database, id: i64) -> Result<Option<Reply>, ReplydError> {
    db.connection()
        .call(move |conn| {
            optional(conn.query_row(
                &format!("SELECT {REPLY_COLUMNS} FROM replies WHERE id = ?1"),
                params![id],
                reply_from_row,
            ))
        })
        .await
        .map_err(map_tr_err)
}

/// All replies for a review, oldest first.
pub async fn replies_for_review(db: &Database, review_id: i64) -> Result<Vec<Reply>, ReplydError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {REPLY_COLUMNS} FROM replies WHERE review_id = ?1 ORDER BY id"
            ))?;
            let rows = stmt.query_map(params![review_id], reply_from_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
        .await
        .map_err(map_tr_err)
}

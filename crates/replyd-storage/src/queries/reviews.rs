// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Review upsert and listing operations.

use replyd_core::types::{Review, ReviewFilter, ReviewListing, ReviewRow, ReviewUpsert, TabCounts};
use replyd_core::{ReplydError, ReviewTab};
use rusqlite::{params, Row};

use super::{optional, status_column};
use crate::database::{map_tr_err, Database};

const REVIEW_COLUMNS: &str = "r.id, r.account_id, r.external_review_id, r.customer_name, \
                              r.subject, r.content, r.reviewed_at, r.first_seen_at";

fn review_from_row(row: &Row<'_>) -> rusqlite::Result<Review> {
    Ok(Review {
        id: row.get(0)?,
        account_id: row.get(1)?,
        external_review_id: row.get(2)?,
        customer_name: row.get(3)?,
        subject: row.get(4)?,
        content: row.get(5)?,
        reviewed_at: row.get(6)?,
        first_seen_at: row.get(7)?,
    })
}

/// Upsert every review for one account in a single transaction.
///
/// Existing rows keep their id and `first_seen_at`; mutable fields are
/// overwritten. Returns the number of reviews written.
pub async fn upsert_reviews(
    db: &Database,
    account_id: i64,
    reviews: &[ReviewUpsert],
) -> Result<usize, ReplydError> {
    let reviews = reviews.to_vec();
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            let tx = conn.transaction()?;
            let mut written = 0;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO reviews
                         (account_id, external_review_id, customer_name, subject, content, reviewed_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT (account_id, external_review_id) DO UPDATE SET
                         customer_name = excluded.customer_name,
                         subject = excluded.subject,
                         content = excluded.content,
                         reviewed_at = excluded.reviewed_at",
                )?;
                for review in &reviews {
                    written += stmt.execute(params![
                        account_id,
                        review.external_review_id,
                        review.customer_name,
                        review.subject,
                        review.content,
                        review.reviewed_at,
                    ])?;
                }
            }
            tx.commit()?;
            Ok(written)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_review(db: &Database, id: i64) -> Result<Option<Review>, ReplydError> {
    db.connection()
        .call(move |conn| {
            optional(conn.query_row(
                &format!("SELECT {REVIEW_COLUMNS} FROM reviews r WHERE r.id = ?1"),
                params![id],
                review_from_row,
            ))
        })
        .await
        .map_err(map_tr_err)
}

pub async fn find_review(
    db: &Database,
    account_id: i64,
    external_review_id: &str,
) -> Result<Option<Review>, ReplydError> {
    let external_review_id = external_review_id.to_string();
    db.connection()
        .call(move |conn| {
            optional(conn.query_row(
                &format!(
                    "SELECT {REVIEW_COLUMNS} FROM reviews r
                     WHERE r.account_id = ?1 AND r.external_review_id = ?2"
                ),
                params![account_id, external_review_id],
                review_from_row,
            ))
        })
        .await
        .map_err(map_tr_err)
}

/// List reviews newest first, classified into tabs by their latest reply.
///
/// Counts cover every review in the date range; `items` is narrowed to the
/// requested tab.
pub async fn list_reviews(db: &Database, filter: &ReviewFilter) -> Result<ReviewListing, ReplydError> {
    let from = filter.from.clone();
    let to = filter.to.clone();
    let wanted = filter.tab;

    let rows = db
        .connection()
        .call(move |conn| -> Result<Vec<ReviewRow>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {REVIEW_COLUMNS},
                        (SELECT p.status FROM replies p
                         WHERE p.review_id = r.id
                         ORDER BY p.id DESC LIMIT 1)
                 FROM reviews r
                 WHERE (?1 IS NULL OR r.reviewed_at >= ?1)
                   AND (?2 IS NULL OR r.reviewed_at <= ?2)
                 ORDER BY r.reviewed_at DESC, r.id DESC"
            ))?;
            let rows = stmt.query_map(params![from, to], |row| {
                let review = review_from_row(row)?;
                let latest = row
                    .get::<_, Option<String>>(8)?
                    .map(|raw| status_column(8, &raw))
                    .transpose()?;
                Ok(ReviewRow {
                    review,
                    tab: ReviewTab::from_latest_status(latest),
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)?;

    let mut counts = TabCounts {
        all: rows.len(),
        ..TabCounts::default()
    };
    for row in &rows {
        match row.tab {
            ReviewTab::Unregistered => counts.unregistered += 1,
            ReviewTab::Pending => counts.pending += 1,
            ReviewTab::Done => counts.done += 1,
        }
    }

    let items = match wanted {
        Some(tab) => rows.into_iter().filter(|row| row.tab == tab).collect(),
        None => rows,
    };
    Ok(ReviewListing { items, counts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::{seed_account as account, setup_db, upsert};

    #[tokio::test]
    async fn upsert_is_idempotent() {
        let (db, _dir) = setup_db().await;
        let account_id = account(&db, "a").await;
        let batch = vec![
            upsert("r-1", "맛있어요", "2024-05-01T03:00:00Z"),
            upsert("r-2", "별로", "2024-05-02T03:00:00Z"),
        ];

        assert_eq!(upsert_reviews(&db, account_id, &batch).await.unwrap(), 2);
        let first = find_review(&db, account_id, "r-1").await.unwrap().unwrap();

        assert_eq!(upsert_reviews(&db, account_id, &batch).await.unwrap(), 2);
        let again = find_review(&db, account_id, "r-1").await.unwrap().unwrap();
        assert_eq!(first, again);

        let listing = list_reviews(&db, &ReviewFilter::default()).await.unwrap();
        assert_eq!(listing.counts.all, 2);
    }

    #[tokio::test]
    async fn upsert_updates_in_place() {
        let (db, _dir) = setup_db().await;
        let account_id = account(&db, "a").await;

        upsert_reviews(&db, account_id, &[upsert("r-1", "before", "2024-05-01T03:00:00Z")])
            .await
            .unwrap();
        let before = find_review(&db, account_id, "r-1").await.unwrap().unwrap();

        upsert_reviews(&db, account_id, &[upsert("r-1", "after", "2024-05-01T04:00:00Z")])
            .await
            .unwrap();
        let after = get_review(&db, before.id).await.unwrap().unwrap();

        assert_eq!(after.id, before.id);
        assert_eq!(after.first_seen_at, before.first_seen_at);
        assert_eq!(after.content, "after");
        assert_eq!(after.reviewed_at, "2024-05-01T04:00:00Z");
    }

    #[tokio::test]
    async fn same_external_id_is_distinct_across_accounts() {
        let (db, _dir) = setup_db().await;
        let a = account(&db, "a").await;
        let b = account(&db, "b").await;

        upsert_reviews(&db, a, &[upsert("mock-1", "from a", "2024-05-01T03:00:00Z")])
            .await
            .unwrap();
        upsert_reviews(&db, b, &[upsert("mock-1", "from b", "2024-05-01T03:00:00Z")])
            .await
            .unwrap();

        let ra = find_review(&db, a, "mock-1").await.unwrap().unwrap();
        let rb = find_review(&db, b, "mock-1").await.unwrap().unwrap();
        assert_ne!(ra.id, rb.id);
        assert_eq!(ra.content, "from a");
        assert_eq!(rb.content, "from b");
    }

    #[tokio::test]
    async fn listing_orders_and_bounds_by_reviewed_at() {
        let (db, _dir) = setup_db().await;
        let account_id = account(&db, "a").await;
        upsert_reviews(
            &db,
            account_id,
            &[
                upsert("old", "", "2024-04-30T23:00:00Z"),
                upsert("mid", "", "2024-05-01T12:00:00Z"),
                upsert("new", "", "2024-05-02T12:00:00Z"),
            ],
        )
        .await
        .unwrap();

        let all = list_reviews(&db, &ReviewFilter::default()).await.unwrap();
        let order: Vec<_> = all.items.iter().map(|r| r.review.external_review_id.as_str()).collect();
        assert_eq!(order, vec!["new", "mid", "old"]);
        assert!(all.items.iter().all(|r| r.tab == ReviewTab::Unregistered));

        let bounded = list_reviews(
            &db,
            &ReviewFilter {
                from: Some("2024-05-01T00:00:00Z".into()),
                to: Some("2024-05-01T23:59:59Z".into()),
                tab: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(bounded.counts.all, 1);
        assert_eq!(bounded.items[0].review.external_review_id, "mid");
    }
}

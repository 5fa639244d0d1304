// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for operations on storage entities.

pub mod jobs;
pub mod replies;
pub mod reviews;
pub mod stores;
pub mod templates;

use std::str::FromStr;

use replyd_core::ReplyStatus;
use rusqlite::types::Type;

/// Parse a status column, surfacing unknown values as a conversion error.
pub(crate) fn status_column(idx: usize, raw: &str) -> rusqlite::Result<ReplyStatus> {
    ReplyStatus::from_str(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Map "no rows" to `None`.
pub(crate) fn optional<T>(result: rusqlite::Result<T>) -> rusqlite::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use replyd_core::types::{NewAccount, ReviewUpsert};
    use tempfile::TempDir;

    use crate::database::Database;

    pub async fn setup_db() -> (Database, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    /// Create a store with one mock account and return the account id.
    pub async fn seed_account(db: &Database, login: &str) -> i64 {
        let store = super::stores::create_store(db, "테스트 매장").await.unwrap();
        super::stores::create_account(
            db,
            &NewAccount {
                store_id: store.id,
                platform: "mock".into(),
                login_name: login.into(),
                encrypted_credential: format!("sealed-{login}"),
            },
        )
        .await
        .unwrap()
        .id
    }

    pub fn upsert(ext: &str, content: &str, reviewed_at: &str) -> ReviewUpsert {
        ReviewUpsert {
            external_review_id: ext.into(),
            customer_name: "민수".into(),
            subject: "치킨".into(),
            content: content.into(),
            reviewed_at: reviewed_at.into(),
        }
    }

    /// Seed one account with the given external review ids; returns
    /// `(account_id, review_ids)` in input order.
    pub async fn seed_reviews(db: &Database, login: &str, ext_ids: &[&str]) -> (i64, Vec<i64>) {
        let account_id = seed_account(db, login).await;
        let batch: Vec<_> = ext_ids
            .iter()
            .map(|ext| upsert(ext, "좋아요", "2024-05-01T03:00:00Z"))
            .collect();
        super::reviews::upsert_reviews(db, account_id, &batch)
            .await
            .unwrap();
        let mut ids = Vec::new();
        for ext in ext_ids {
            let review = super::reviews::find_review(db, account_id, ext)
                .await
                .unwrap()
                .unwrap();
            ids.push(review.id);
        }
        (account_id, ids)
    }
}

// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply job queue: claim, outcome recording, listing, and re-queue.
//!
//! A job stays PENDING while a dispatch pass holds it. The claim is a token
//! plus an expiry; an expired claim is fair game for the next pass, so a
//! crashed pass delays delivery but never loses it.

use replyd_core::types::{ClaimedJob, DispatchTarget, JobClaim, PostOutcome, ReplyJob};
use replyd_core::{ReplyStatus, ReplydError};
use rusqlite::{params, Row, TransactionBehavior};

use super::{optional, status_column};
use crate::database::{map_tr_err, Database};

const JOB_COLUMNS: &str = "j.id, j.reply_id, j.status, j.retry_count, j.fail_reason, \
                           j.claimed_until, j.created_at, j.updated_at";

fn job_from_row(row: &Row<'_>) -> rusqlite::Result<ReplyJob> {
    let status: String = row.get(2)?;
    Ok(ReplyJob {
        id: row.get(0)?,
        reply_id: row.get(1)?,
        status: status_column(2, &status)?,
        retry_count: row.get(3)?,
        fail_reason: row.get(4)?,
        claimed_until: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Resolve the reply -> review -> account chain behind a job.
///
/// Any missing link yields `None`.
fn target_from_row(row: &Row<'_>) -> rusqlite::Result<Option<DispatchTarget>> {
    let content: Option<String> = row.get(8)?;
    let external_review_id: Option<String> = row.get(9)?;
    let account_id: Option<i64> = row.get(10)?;
    let platform: Option<String> = row.get(11)?;
    let encrypted_credential: Option<String> = row.get(12)?;

    Ok(
        match (content, external_review_id, account_id, platform, encrypted_credential) {
            (Some(content), Some(external_review_id), Some(account_id), Some(platform), Some(encrypted_credential)) => {
                Some(DispatchTarget {
                    account_id,
                    platform,
                    encrypted_credential,
                    external_review_id,
                    content,
                })
            }
            _ => None,
        },
    )
}

/// Atomically claim up to `claim.limit` PENDING jobs that are not held by a
/// live claim, oldest first.
pub async fn claim_pending_jobs(
    db: &Database,
    claim: &JobClaim,
) -> Result<Vec<ClaimedJob>, ReplydError> {
    let token = claim.token.clone();
    let ttl = format!("+{} seconds", claim.ttl_secs);
    let limit = i64::try_from(claim.limit).unwrap_or(i64::MAX);

    db.connection()
        .call(move |conn| -> Result<Vec<ClaimedJob>, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let claimed = {
                let ids: Vec<i64> = {
                    let mut stmt = tx.prepare(
                        "SELECT id FROM reply_jobs
                         WHERE status = 'PENDING'
                           AND (claimed_until IS NULL
                                OR claimed_until < strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                         ORDER BY id ASC
                         LIMIT ?1",
                    )?;
                    let rows = stmt.query_map(params![limit], |row| row.get(0))?;
                    rows.collect::<rusqlite::Result<_>>()?
                };

                let mut mark = tx.prepare(
                    "UPDATE reply_jobs SET
                         claim_token = ?1,
                         claimed_until = strftime('%Y-%m-%dT%H:%M:%fZ', 'now', ?2),
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?3",
                )?;
                let mut load = tx.prepare(&format!(
                    "SELECT {JOB_COLUMNS},
                            p.content, v.external_review_id, a.id, a.platform, a.encrypted_credential
                     FROM reply_jobs j
                     LEFT JOIN replies p ON p.id = j.reply_id
                     LEFT JOIN reviews v ON v.id = p.review_id
                     LEFT JOIN accounts a ON a.id = v.account_id
                     WHERE j.id = ?1"
                ))?;

                let mut claimed = Vec::with_capacity(ids.len());
                for id in ids {
                    mark.execute(params![token, ttl, id])?;
                    claimed.push(load.query_row(params![id], |row| {
                        Ok(ClaimedJob {
                            job: job_from_row(row)?,
                            target: target_from_row(row)?,
                        })
                    })?);
                }
                claimed
            };
            tx.commit()?;
            Ok(claimed)
        })
        .await
        .map_err(map_tr_err)
}

/// Drop a claim without touching the job's status.
pub async fn release_claim(db: &Database, job_id: i64, token: &str) -> Result<(), ReplydError> {
    let token = token.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE reply_jobs SET claim_token = NULL, claimed_until = NULL
                 WHERE id = ?1 AND claim_token = ?2",
                params![job_id, token],
            )?;
            Ok::<_, rusqlite::Error>(())
        })
        .await
        .map_err(map_tr_err)
}

/// Push a held claim's expiry to `ttl_secs` from now.
///
/// Only succeeds while `token` still holds the PENDING job. A pass calls this
/// right before posting, so a job whose claim ran out and was taken over by
/// another pass is never posted twice.
pub async fn renew_claim(
    db: &Database,
    job_id: i64,
    token: &str,
    ttl_secs: u64,
) -> Result<bool, ReplydError> {
    let token = token.to_string();
    let ttl = format!("+{ttl_secs} seconds");
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE reply_jobs SET
                     claimed_until = strftime('%Y-%m-%dT%H:%M:%fZ', 'now', ?3),
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1 AND claim_token = ?2 AND status = 'PENDING'",
                params![job_id, token, ttl],
            )?;
            Ok::<_, rusqlite::Error>(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Record a posting outcome on the job and its reply in one transaction.
///
/// Only applies while the job is PENDING and `token` still holds the claim.
/// Returns `false` when the claim was lost, leaving both rows untouched.
pub async fn record_outcome(
    db: &Database,
    job_id: i64,
    token: &str,
    outcome: &PostOutcome,
) -> Result<bool, ReplydError> {
    let token = token.to_string();
    let outcome = outcome.clone();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let tx = conn.transaction()?;
            let changed = if outcome.success {
                tx.execute(
                    "UPDATE reply_jobs SET
                         status = 'POSTED', fail_reason = '',
                         claim_token = NULL, claimed_until = NULL,
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?1 AND claim_token = ?2 AND status = 'PENDING'",
                    params![job_id, token],
                )?
            } else {
                tx.execute(
                    "UPDATE reply_jobs SET
                         status = 'FAILED', fail_reason = ?3,
                         retry_count = retry_count + 1,
                         claim_token = NULL, claimed_until = NULL,
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?1 AND claim_token = ?2 AND status = 'PENDING'",
                    params![job_id, token, outcome.reason],
                )?
            };
            if changed == 0 {
                return Ok(false);
            }

            let (status, reason) = if outcome.success {
                (ReplyStatus::Posted, "")
            } else {
                (ReplyStatus::Failed, outcome.reason.as_str())
            };
            tx.execute(
                "UPDATE replies SET status = ?1, fail_reason = ?2
                 WHERE id = (SELECT reply_id FROM reply_jobs WHERE id = ?3)",
                params![status.to_string(), reason, job_id],
            )?;
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_job(db: &Database, id: i64) -> Result<Option<ReplyJob>, ReplydError> {
    db.connection()
        .call(move |conn| {
            optional(conn.query_row(
                &format!("SELECT {JOB_COLUMNS} FROM reply_jobs j WHERE j.id = ?1"),
                params![id],
                job_from_row,
            ))
        })
        .await
        .map_err(map_tr_err)
}

/// List jobs newest first, optionally narrowed to one status.
pub async fn list_jobs(
    db: &Database,
    status: Option<ReplyStatus>,
) -> Result<Vec<ReplyJob>, ReplydError> {
    let status = status.map(|s| s.to_string());
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {JOB_COLUMNS} FROM reply_jobs j
                 WHERE (?1 IS NULL OR j.status = ?1)
                 ORDER BY j.id DESC"
            ))?;
            let rows = stmt.query_map(params![status], job_from_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Move a FAILED job and its reply back to PENDING.
///
/// `retry_count` and the previous `fail_reason` are kept until the next
/// outcome. Refused (returns `false`) when the job is missing, not FAILED,
/// or when the review has since gained another PENDING or POSTED reply.
pub async fn requeue_job(db: &Database, id: i64) -> Result<bool, ReplydError> {
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE reply_jobs SET
                     status = 'PENDING', claim_token = NULL, claimed_until = NULL,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1 AND status = 'FAILED'
                   AND NOT EXISTS (
                       SELECT 1 FROM replies other
                       JOIN replies mine ON mine.review_id = other.review_id
                       WHERE mine.id = reply_jobs.reply_id
                         AND other.id != mine.id
                         AND other.status IN ('PENDING', 'POSTED'))",
                params![id],
            )?;
            if changed == 0 {
                return Ok(false);
            }
            tx.execute(
                "UPDATE replies SET status = 'PENDING'
                 WHERE id = (SELECT reply_id FROM reply_jobs WHERE id = ?1)",
                params![id],
            )?;
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::replies::{create_replies, replies_for_review};
    use crate::queries::test_support::{seed_reviews, setup_db};
    use replyd_core::types::NewReply;

    fn claim(token: &str) -> JobClaim {
        JobClaim {
            token: token.into(),
            ttl_secs: 300,
            limit: 100,
        }
    }

    async fn seed_jobs(db: &Database, ext_ids: &[&str]) -> Vec<i64> {
        let (_, ids) = seed_reviews(db, "a", ext_ids).await;
        let replies: Vec<_> = ids
            .iter()
            .map(|&review_id| NewReply {
                review_id,
                content: format!("reply-{review_id}"),
            })
            .collect();
        create_replies(db, None, &replies).await.unwrap();
        ids
    }

    #[tokio::test]
    async fn claim_returns_targets_oldest_first() {
        let (db, _dir) = setup_db().await;
        seed_jobs(&db, &["r-1", "r-2"]).await;

        let claimed = claim_pending_jobs(&db, &claim("t1")).await.unwrap();
        assert_eq!(claimed.len(), 2);
        assert!(claimed[0].job.id < claimed[1].job.id);
        assert_eq!(claimed[0].job.status, ReplyStatus::Pending);
        assert!(claimed[0].job.claimed_until.is_some());

        let target = claimed[0].target.as_ref().unwrap();
        assert_eq!(target.external_review_id, "r-1");
        assert_eq!(target.platform, "mock");
        assert_eq!(target.encrypted_credential, "sealed-a");
        assert!(target.content.starts_with("reply-"));
    }

    #[tokio::test]
    async fn live_claims_are_exclusive() {
        let (db, _dir) = setup_db().await;
        seed_jobs(&db, &["r-1", "r-2", "r-3"]).await;

        let first = claim_pending_jobs(
            &db,
            &JobClaim {
                limit: 2,
                ..claim("t1")
            },
        )
        .await
        .unwrap();
        let second = claim_pending_jobs(&db, &claim("t2")).await.unwrap();
        let third = claim_pending_jobs(&db, &claim("t3")).await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 1);
        assert!(third.is_empty());
        assert!(first.iter().all(|c| c.job.id != second[0].job.id));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn claims_from_separate_connections_do_not_overlap() {
        let (db, dir) = setup_db().await;
        let ext_ids: Vec<String> = (1..=20).map(|i| format!("r-{i}")).collect();
        let ext_refs: Vec<&str> = ext_ids.iter().map(String::as_str).collect();
        seed_jobs(&db, &ext_refs).await;
        let path = dir.path().join("test.db");
        let other = Database::open(path.to_str().unwrap()).await.unwrap();

        let limited = |token: &str| JobClaim {
            limit: 3,
            ..claim(token)
        };
        let mut seen = Vec::new();
        for round in 0..4 {
            let claim_a = limited(&format!("a-{round}"));
            let claim_b = limited(&format!("b-{round}"));
            let (a, b) = tokio::join!(
                claim_pending_jobs(&db, &claim_a),
                claim_pending_jobs(&other, &claim_b)
            );
            seen.extend(a.unwrap().into_iter().map(|c| c.job.id));
            seen.extend(b.unwrap().into_iter().map(|c| c.job.id));
        }

        assert_eq!(seen.len(), 20);
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 20);
    }

    #[tokio::test]
    async fn expired_claims_are_reclaimable() {
        let (db, _dir) = setup_db().await;
        seed_jobs(&db, &["r-1"]).await;

        let first = claim_pending_jobs(&db, &claim("dead-pass")).await.unwrap();
        db.connection()
            .call(|conn| -> Result<usize, rusqlite::Error> {
                conn.execute(
                    "UPDATE reply_jobs SET claimed_until = '2000-01-01T00:00:00.000Z'",
                    [],
                )
            })
            .await
            .unwrap();

        let second = claim_pending_jobs(&db, &claim("live-pass")).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].job.id, first[0].job.id);

        // The stale pass can no longer record its outcome.
        let job_id = first[0].job.id;
        assert!(!record_outcome(&db, job_id, "dead-pass", &PostOutcome::posted()).await.unwrap());
        assert!(record_outcome(&db, job_id, "live-pass", &PostOutcome::posted()).await.unwrap());
    }

    #[tokio::test]
    async fn success_marks_job_and_reply_posted() {
        let (db, _dir) = setup_db().await;
        let review_ids = seed_jobs(&db, &["r-1"]).await;
        let job_id = claim_pending_jobs(&db, &claim("t")).await.unwrap()[0].job.id;

        assert!(record_outcome(&db, job_id, "t", &PostOutcome::posted()).await.unwrap());

        let job = get_job(&db, job_id).await.unwrap().unwrap();
        assert_eq!(job.status, ReplyStatus::Posted);
        assert_eq!(job.retry_count, 0);
        assert!(job.claimed_until.is_none());
        let reply = &replies_for_review(&db, review_ids[0]).await.unwrap()[0];
        assert_eq!(reply.status, ReplyStatus::Posted);

        // A second outcome for the same job is refused.
        assert!(!record_outcome(&db, job_id, "t", &PostOutcome::failed("late")).await.unwrap());
    }

    #[tokio::test]
    async fn success_clears_reason_on_both_rows() {
        let (db, _dir) = setup_db().await;
        let review_ids = seed_jobs(&db, &["r-1"]).await;
        let job_id = claim_pending_jobs(&db, &claim("t")).await.unwrap()[0].job.id;
        let accepted = PostOutcome {
            success: true,
            reason: "accepted".into(),
        };

        assert!(record_outcome(&db, job_id, "t", &accepted).await.unwrap());

        let job = get_job(&db, job_id).await.unwrap().unwrap();
        assert_eq!(job.fail_reason, "");
        let reply = &replies_for_review(&db, review_ids[0]).await.unwrap()[0];
        assert_eq!(reply.status, ReplyStatus::Posted);
        assert_eq!(reply.fail_reason, "");
    }

    #[tokio::test]
    async fn renew_requires_the_live_token() {
        let (db, _dir) = setup_db().await;
        seed_jobs(&db, &["r-1"]).await;
        let job_id = claim_pending_jobs(&db, &claim("first")).await.unwrap()[0].job.id;
        assert!(renew_claim(&db, job_id, "first", 300).await.unwrap());

        db.connection()
            .call(|conn| -> Result<usize, rusqlite::Error> {
                conn.execute(
                    "UPDATE reply_jobs SET claimed_until = '2000-01-01T00:00:00.000Z'",
                    [],
                )
            })
            .await
            .unwrap();
        assert_eq!(claim_pending_jobs(&db, &claim("second")).await.unwrap().len(), 1);

        assert!(!renew_claim(&db, job_id, "first", 300).await.unwrap());
        assert!(renew_claim(&db, job_id, "second", 300).await.unwrap());

        record_outcome(&db, job_id, "second", &PostOutcome::posted()).await.unwrap();
        assert!(!renew_claim(&db, job_id, "second", 300).await.unwrap());
    }

    #[tokio::test]
    async fn failure_records_reason_and_counts_attempt() {
        let (db, _dir) = setup_db().await;
        let review_ids = seed_jobs(&db, &["r-1"]).await;
        let job_id = claim_pending_jobs(&db, &claim("t")).await.unwrap()[0].job.id;

        assert!(record_outcome(&db, job_id, "t", &PostOutcome::failed("rate limited"))
            .await
            .unwrap());

        let job = get_job(&db, job_id).await.unwrap().unwrap();
        assert_eq!(job.status, ReplyStatus::Failed);
        assert_eq!(job.retry_count, 1);
        assert_eq!(job.fail_reason, "rate limited");
        let reply = &replies_for_review(&db, review_ids[0]).await.unwrap()[0];
        assert_eq!(reply.status, ReplyStatus::Failed);
        assert_eq!(reply.fail_reason, "rate limited");

        // FAILED jobs are not claimed again.
        assert!(claim_pending_jobs(&db, &claim("t2")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn release_makes_job_claimable_again() {
        let (db, _dir) = setup_db().await;
        seed_jobs(&db, &["r-1"]).await;
        let job_id = claim_pending_jobs(&db, &claim("t")).await.unwrap()[0].job.id;

        release_claim(&db, job_id, "other").await.unwrap();
        assert!(claim_pending_jobs(&db, &claim("t2")).await.unwrap().is_empty());

        release_claim(&db, job_id, "t").await.unwrap();
        assert_eq!(claim_pending_jobs(&db, &claim("t2")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn broken_chain_yields_no_target() {
        let (db, _dir) = setup_db().await;
        seed_jobs(&db, &["r-1"]).await;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                // Orphan the reply's review without cascading.
                conn.execute_batch(
                    "PRAGMA foreign_keys = OFF;
                     DELETE FROM reviews;
                     PRAGMA foreign_keys = ON;",
                )
            })
            .await
            .unwrap();

        let claimed = claim_pending_jobs(&db, &claim("t")).await.unwrap();
        assert_eq!(claimed.len(), 1);
        assert!(claimed[0].target.is_none());
    }

    #[tokio::test]
    async fn requeue_moves_failed_job_back() {
        let (db, _dir) = setup_db().await;
        let review_ids = seed_jobs(&db, &["r-1"]).await;
        let job_id = claim_pending_jobs(&db, &claim("t")).await.unwrap()[0].job.id;

        assert!(!requeue_job(&db, job_id).await.unwrap(), "PENDING job is not requeued");

        record_outcome(&db, job_id, "t", &PostOutcome::failed("boom")).await.unwrap();
        assert!(requeue_job(&db, job_id).await.unwrap());

        let job = get_job(&db, job_id).await.unwrap().unwrap();
        assert_eq!(job.status, ReplyStatus::Pending);
        assert_eq!(job.retry_count, 1);
        assert_eq!(job.fail_reason, "boom");
        assert_eq!(
            replies_for_review(&db, review_ids[0]).await.unwrap()[0].status,
            ReplyStatus::Pending
        );
        assert_eq!(claim_pending_jobs(&db, &claim("t2")).await.unwrap().len(), 1);
        assert!(!requeue_job(&db, 9999).await.unwrap());
    }

    #[tokio::test]
    async fn requeue_refused_when_review_has_newer_active_reply() {
        let (db, _dir) = setup_db().await;
        let review_ids = seed_jobs(&db, &["r-1"]).await;
        let job_id = claim_pending_jobs(&db, &claim("t")).await.unwrap()[0].job.id;
        record_outcome(&db, job_id, "t", &PostOutcome::failed("boom")).await.unwrap();

        let created = create_replies(
            &db,
            None,
            &[NewReply {
                review_id: review_ids[0],
                content: "retry by hand".into(),
            }],
        )
        .await
        .unwrap();
        assert_eq!(created, 1);

        assert!(!requeue_job(&db, job_id).await.unwrap());
    }

    #[tokio::test]
    async fn list_jobs_filters_by_status() {
        let (db, _dir) = setup_db().await;
        seed_jobs(&db, &["r-1", "r-2"]).await;
        let claimed = claim_pending_jobs(&db, &claim("t")).await.unwrap();
        record_outcome(&db, claimed[0].job.id, "t", &PostOutcome::failed("x"))
            .await
            .unwrap();

        let all = list_jobs(&db, None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].id > all[1].id, "newest first");

        let failed = list_jobs(&db, Some(ReplyStatus::Failed)).await.unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].id, claimed[0].job.id);
        assert_eq!(list_jobs(&db, Some(ReplyStatus::Posted)).await.unwrap().len(), 0);
    }
}

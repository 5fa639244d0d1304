// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Review synchronization from connectors into storage.
//!
//! Each account is one unit of work: its connector fetch must fully succeed
//! before any upsert begins, and all of its upserts commit in one
//! transaction. Accounts are processed concurrently and independently.

use std::sync::Arc;
use std::time::Duration;

use chrono::FixedOffset;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use replyd_config::model::ReplydConfig;
use replyd_connector::ConnectorRegistry;
use replyd_core::types::{Account, ConnectorReview, ReviewUpsert};
use replyd_core::{CredentialCipher, ReplydError, StorageAdapter};

use crate::timestamp;

/// Tuning knobs for a [`Synchronizer`].
#[derive(Debug, Clone, Copy)]
pub struct SyncSettings {
    pub max_concurrency: usize,
    pub connector_timeout: Duration,
    pub timezone: FixedOffset,
}

impl SyncSettings {
    pub fn from_config(config: &ReplydConfig) -> Result<Self, ReplydError> {
        Ok(Self {
            max_concurrency: config.sync.max_concurrency.max(1),
            connector_timeout: config.connectors.timeout(),
            timezone: timestamp::offset_from_hours(config.sync.timezone_offset_hours)?,
        })
    }
}

/// Outcome of a [`Synchronizer::sync_all`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Reviews written across all accounts.
    pub observed: usize,
    pub accounts: usize,
    /// Accounts that contributed nothing because their fetch failed.
    pub failed_accounts: usize,
}

/// Pulls reviews for every account and upserts them.
pub struct Synchronizer {
    storage: Arc<dyn StorageAdapter>,
    connectors: Arc<ConnectorRegistry>,
    cipher: Arc<dyn CredentialCipher>,
    settings: SyncSettings,
}

impl Synchronizer {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        connectors: Arc<ConnectorRegistry>,
        cipher: Arc<dyn CredentialCipher>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            storage,
            connectors,
            cipher,
            settings,
        }
    }

    /// Synchronize one account. Returns the number of reviews written.
    ///
    /// Reviews the platform reports malformed are logged and left out; the
    /// rest of the batch still commits.
    pub async fn sync(&self, account: &Account) -> Result<usize, ReplydError> {
        let connector = self.connectors.require(&account.platform)?;
        let credential = self.cipher.decrypt(&account.encrypted_credential)?;

        let fetched = tokio::time::timeout(
            self.settings.connector_timeout,
            connector.list_reviews(&credential),
        )
        .await
        .map_err(|_| ReplydError::Timeout {
            duration: self.settings.connector_timeout,
        })??;

        let fetched_count = fetched.len();
        let upserts: Vec<ReviewUpsert> = fetched
            .into_iter()
            .filter_map(|review| match validate_review(review, self.settings.timezone) {
                Ok(upsert) => Some(upsert),
                Err(e) => {
                    warn!(account_id = account.id, error = %e, "rejected malformed review");
                    None
                }
            })
            .collect();

        let written = self.storage.upsert_reviews(account.id, &upserts).await?;
        debug!(
            account_id = account.id,
            fetched = fetched_count,
            written,
            "account synchronized"
        );
        Ok(written)
    }

    /// Synchronize the account with id `account_id`.
    pub async fn sync_account(&self, account_id: i64) -> Result<usize, ReplydError> {
        let account = self
            .storage
            .get_account(account_id)
            .await?
            .ok_or(ReplydError::AccountNotFound(account_id))?;
        self.sync(&account).await
    }

    /// Synchronize every account.
    ///
    /// A connector or credential failure on one account is logged and counts
    /// as zero. A storage failure aborts the pass once in-flight accounts
    /// have finished.
    pub async fn sync_all(&self) -> Result<SyncReport, ReplydError> {
        let accounts = self.storage.list_accounts().await?;
        let mut report = SyncReport {
            accounts: accounts.len(),
            ..SyncReport::default()
        };

        let results: Vec<(i64, Result<usize, ReplydError>)> = stream::iter(accounts)
            .map(|account| async move {
                let result = self.sync(&account).await;
                (account.id, result)
            })
            .buffer_unordered(self.settings.max_concurrency)
            .collect()
            .await;

        let mut fatal = None;
        for (account_id, result) in results {
            match result {
                Ok(written) => report.observed += written,
                Err(e @ ReplydError::Storage { .. }) => {
                    if fatal.is_none() {
                        fatal = Some(e);
                    }
                }
                Err(e) => {
                    warn!(account_id, error = %e, "account sync failed");
                    report.failed_accounts += 1;
                }
            }
        }
        if let Some(e) = fatal {
            return Err(e);
        }

        info!(
            accounts = report.accounts,
            failed = report.failed_accounts,
            observed = report.observed,
            "sync pass complete"
        );
        Ok(report)
    }
}

/// Check one connector review and normalize its timestamp.
pub fn validate_review(
    review: ConnectorReview,
    timezone: FixedOffset,
) -> Result<ReviewUpsert, ReplydError> {
    let external_review_id = review.external_review_id.trim().to_string();
    if external_review_id.is_empty() {
        return Err(ReplydError::MalformedReview {
            external_review_id: review.external_review_id,
            reason: "empty external review id".to_string(),
        });
    }
    let reviewed_at = timestamp::normalize_reviewed_at(&review.reviewed_at, timezone)
        .ok_or_else(|| ReplydError::MalformedReview {
            external_review_id: external_review_id.clone(),
            reason: format!("unparseable timestamp `{}`", review.reviewed_at),
        })?;

    Ok(ReviewUpsert {
        external_review_id,
        customer_name: review.customer_name,
        subject: review.subject,
        content: review.content,
        reviewed_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(id: &str, reviewed_at: &str) -> ConnectorReview {
        ConnectorReview {
            external_review_id: id.into(),
            customer_name: "민수".into(),
            subject: "치킨".into(),
            content: "맛있어요".into(),
            reviewed_at: reviewed_at.into(),
        }
    }

    fn kst() -> FixedOffset {
        timestamp::offset_from_hours(9).unwrap()
    }

    #[test]
    fn valid_review_is_normalized() {
        let upsert = validate_review(review(" r-1 ", "2026.03.02 09:00"), kst()).unwrap();
        assert_eq!(upsert.external_review_id, "r-1");
        assert_eq!(upsert.reviewed_at, "2026-03-02T00:00:00Z");
        assert_eq!(upsert.content, "맛있어요");
    }

    #[test]
    fn empty_id_is_malformed() {
        let err = validate_review(review("  ", "2026-03-02"), kst()).unwrap_err();
        assert!(matches!(err, ReplydError::MalformedReview { .. }));
    }

    #[test]
    fn bad_timestamp_is_malformed() {
        let err = validate_review(review("r-2", "yesterday"), kst()).unwrap_err();
        match err {
            ReplydError::MalformedReview {
                external_review_id,
                reason,
            } => {
                assert_eq!(external_review_id, "r-2");
                assert!(reason.contains("yesterday"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn settings_follow_config() {
        let settings = SyncSettings::from_config(&ReplydConfig::default()).unwrap();
        assert_eq!(settings.max_concurrency, 4);
        assert_eq!(settings.connector_timeout, Duration::from_secs(30));
        assert_eq!(settings.timezone.local_minus_utc(), 9 * 3600);
    }
}

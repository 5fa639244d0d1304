// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply job dispatch.
//!
//! A pass claims PENDING jobs under a fresh token, posts each reply through
//! its platform connector, and records the outcome on the job and reply
//! together. Jobs are independent: one job's failure never affects another.
//!
//! ```text
//! PENDING --post ok--> POSTED
//! PENDING --post err-> FAILED (retry_count += 1, kept until re-queued)
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, warn};

use replyd_config::model::ReplydConfig;
use replyd_connector::ConnectorRegistry;
use replyd_core::types::{ClaimedJob, JobClaim, PostOutcome};
use replyd_core::{CredentialCipher, ReplydError, StorageAdapter};

/// Tuning knobs for a [`Dispatcher`].
#[derive(Debug, Clone, Copy)]
pub struct DispatchSettings {
    pub max_concurrency: usize,
    pub claim_ttl_secs: u64,
    pub batch_limit: usize,
    pub connector_timeout: Duration,
}

impl DispatchSettings {
    pub fn from_config(config: &ReplydConfig) -> Self {
        Self {
            max_concurrency: config.dispatch.max_concurrency.max(1),
            claim_ttl_secs: config.dispatch.claim_ttl_secs,
            batch_limit: config.dispatch.batch_limit,
            connector_timeout: config.connectors.timeout(),
        }
    }
}

/// Per-pass dispatch counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub claimed: usize,
    pub posted: usize,
    pub failed: usize,
    /// Jobs released untouched: broken reference chain or no connector.
    pub skipped: usize,
    /// Jobs whose claim expired and was taken over by another pass.
    pub lost: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobResult {
    Posted,
    Failed,
    Skipped,
    Lost,
}

/// Drains pending reply jobs through the connectors.
pub struct Dispatcher {
    storage: Arc<dyn StorageAdapter>,
    connectors: Arc<ConnectorRegistry>,
    cipher: Arc<dyn CredentialCipher>,
    settings: DispatchSettings,
}

impl Dispatcher {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        connectors: Arc<ConnectorRegistry>,
        cipher: Arc<dyn CredentialCipher>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            storage,
            connectors,
            cipher,
            settings,
        }
    }

    /// Claim up to `batch_limit` pending jobs and attempt each one.
    ///
    /// Jobs left over stay PENDING for the next pass. A storage failure
    /// aborts the pass; jobs it still holds become claimable again once the
    /// claim TTL runs out.
    pub async fn dispatch_pending(&self) -> Result<DispatchReport, ReplydError> {
        let claim = JobClaim {
            token: uuid::Uuid::new_v4().to_string(),
            ttl_secs: self.settings.claim_ttl_secs,
            limit: self.settings.batch_limit,
        };
        let claimed = self.storage.claim_pending_jobs(&claim).await?;
        let mut report = DispatchReport {
            claimed: claimed.len(),
            ..DispatchReport::default()
        };
        if claimed.is_empty() {
            debug!("no pending jobs");
            return Ok(report);
        }

        let token = claim.token.as_str();
        let results: Vec<Result<JobResult, ReplydError>> = stream::iter(claimed)
            .map(|job| self.process(job, token))
            .buffer_unordered(self.settings.max_concurrency)
            .collect()
            .await;

        let mut fatal = None;
        for result in results {
            match result {
                Ok(JobResult::Posted) => report.posted += 1,
                Ok(JobResult::Failed) => report.failed += 1,
                Ok(JobResult::Skipped) => report.skipped += 1,
                Ok(JobResult::Lost) => report.lost += 1,
                Err(e) => {
                    error!(error = %e, "job dispatch aborted by storage failure");
                    if fatal.is_none() {
                        fatal = Some(e);
                    }
                }
            }
        }
        if let Some(e) = fatal {
            return Err(e);
        }

        info!(
            claimed = report.claimed,
            posted = report.posted,
            failed = report.failed,
            skipped = report.skipped,
            lost = report.lost,
            "dispatch pass complete"
        );
        Ok(report)
    }

    async fn process(&self, claimed: ClaimedJob, token: &str) -> Result<JobResult, ReplydError> {
        let job_id = claimed.job.id;
        let Some(target) = claimed.target else {
            debug!(job_id, "reply chain incomplete, skipping job");
            self.storage.release_claim(job_id, token).await?;
            return Ok(JobResult::Skipped);
        };
        let Some(connector) = self.connectors.get(&target.platform) else {
            warn!(job_id, platform = %target.platform, "no connector for platform, skipping job");
            self.storage.release_claim(job_id, token).await?;
            return Ok(JobResult::Skipped);
        };

        // The batch claim may have expired and been taken over.
        if !self
            .storage
            .renew_claim(job_id, token, self.settings.claim_ttl_secs)
            .await?
        {
            warn!(job_id, "claim expired and was taken over, not posting");
            return Ok(JobResult::Lost);
        }

        let outcome = match self.cipher.decrypt(&target.encrypted_credential) {
            Ok(credential) => {
                let attempt = tokio::time::timeout(
                    self.settings.connector_timeout,
                    connector.post_reply(&credential, &target.external_review_id, &target.content),
                )
                .await;
                match attempt {
                    Ok(Ok(outcome)) => outcome,
                    Ok(Err(e)) => PostOutcome::failed(e.to_string()),
                    Err(_) => PostOutcome::failed(
                        ReplydError::Timeout {
                            duration: self.settings.connector_timeout,
                        }
                        .to_string(),
                    ),
                }
            }
            Err(e) => PostOutcome::failed(e.to_string()),
        };

        if !self.storage.record_outcome(job_id, token, &outcome).await? {
            warn!(job_id, "claim lost before outcome was recorded");
            return Ok(JobResult::Lost);
        }

        if outcome.success {
            debug!(job_id, account_id = target.account_id, "reply posted");
            Ok(JobResult::Posted)
        } else {
            warn!(
                job_id,
                account_id = target.account_id,
                reason = %outcome.reason,
                "reply post failed"
            );
            Ok(JobResult::Failed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_follow_config() {
        let mut config = ReplydConfig::default();
        config.dispatch.max_concurrency = 0;
        config.dispatch.batch_limit = 7;
        let settings = DispatchSettings::from_config(&config);
        assert_eq!(settings.max_concurrency, 1);
        assert_eq!(settings.batch_limit, 7);
        assert_eq!(settings.claim_ttl_secs, 300);
    }
}

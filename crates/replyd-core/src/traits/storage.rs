// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for the review, reply, and job tables.

use async_trait::async_trait;

use crate::error::ReplydError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    Account, ClaimedJob, JobClaim, NewAccount, NewReply, PostOutcome, Reply, ReplyContext,
    ReplyJob, ReplyStatus, Review, ReviewFilter, ReviewListing, ReviewUpsert, Store, Template,
};

/// Adapter for the persistence backend.
///
/// Every method is one unit of work: it either commits completely or not at
/// all. The pipeline composes these units and never holds a transaction
/// across a connector call.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection).
    async fn initialize(&self) -> Result<(), ReplydError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), ReplydError>;

    // --- Stores and accounts ---

    async fn create_store(&self, name: &str) -> Result<Store, ReplydError>;

    async fn list_stores(&self) -> Result<Vec<Store>, ReplydError>;

    async fn create_account(&self, account: &NewAccount) -> Result<Account, ReplydError>;

    async fn get_account(&self, id: i64) -> Result<Option<Account>, ReplydError>;

    async fn list_accounts(&self) -> Result<Vec<Account>, ReplydError>;

    // --- Templates ---

    async fn create_template(&self, name: &str, body: &str) -> Result<Template, ReplydError>;

    async fn get_template(&self, id: i64) -> Result<Option<Template>, ReplydError>;

    async fn list_templates(&self) -> Result<Vec<Template>, ReplydError>;

    /// Deletes a template. Replies keep their content with a NULL template.
    /// Returns `false` if the template did not exist.
    async fn delete_template(&self, id: i64) -> Result<bool, ReplydError>;

    // --- Reviews ---

    /// Upserts all reviews for one account in a single transaction.
    ///
    /// Keyed on `(account_id, external_review_id)`: existing rows keep their
    /// id and `first_seen_at`. Returns the number of reviews written.
    async fn upsert_reviews(
        &self,
        account_id: i64,
        reviews: &[ReviewUpsert],
    ) -> Result<usize, ReplydError>;

    async fn get_review(&self, id: i64) -> Result<Option<Review>, ReplydError>;

    async fn find_review(
        &self,
        account_id: i64,
        external_review_id: &str,
    ) -> Result<Option<Review>, ReplydError>;

    async fn list_reviews(&self, filter: &ReviewFilter) -> Result<ReviewListing, ReplydError>;

    // --- Replies ---

    /// Resolves rendering context for the given review ids.
    ///
    /// Ids with no review are omitted. A review whose account or store is
    /// missing is returned with `None` display fields.
    async fn reply_contexts(&self, review_ids: &[i64]) -> Result<Vec<ReplyContext>, ReplydError>;

    /// Inserts each reply with a PENDING job, all in one transaction.
    ///
    /// A review that vanished, or that already has a PENDING or POSTED
    /// reply, is skipped. Returns the number of pairs created.
    async fn create_replies(
        &self,
        template_id: Option<i64>,
        replies: &[NewReply],
    ) -> Result<usize, ReplydError>;

    async fn get_reply(&self, id: i64) -> Result<Option<Reply>, ReplydError>;

    async fn replies_for_review(&self, review_id: i64) -> Result<Vec<Reply>, ReplydError>;

    // --- Jobs ---

    /// Atomically claims up to `claim.limit` PENDING jobs not held by a live claim.
    async fn claim_pending_jobs(&self, claim: &JobClaim) -> Result<Vec<ClaimedJob>, ReplydError>;

    /// Drops a claim without changing the job's status.
    async fn release_claim(&self, job_id: i64, token: &str) -> Result<(), ReplydError>;

    /// Extends a held claim by `ttl_secs` from now, just before posting.
    ///
    /// Returns `false` when `token` no longer holds the PENDING job.
    async fn renew_claim(&self, job_id: i64, token: &str, ttl_secs: u64) -> Result<bool, ReplydError>;

    /// Records a posting outcome on the job and its reply in one transaction.
    ///
    /// Only applies while `token` still holds the claim. Returns `false` if
    /// the claim was lost.
    async fn record_outcome(
        &self,
        job_id: i64,
        token: &str,
        outcome: &PostOutcome,
    ) -> Result<bool, ReplydError>;

    async fn get_job(&self, id: i64) -> Result<Option<ReplyJob>, ReplydError>;

    async fn list_jobs(&self, status: Option<ReplyStatus>) -> Result<Vec<ReplyJob>, ReplydError>;

    /// Moves a FAILED job and its reply back to PENDING.
    /// Returns `false` if the job is missing or not FAILED.
    async fn requeue_job(&self, id: i64) -> Result<bool, ReplydError>;
}

// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across adapter traits and the pipeline.
//!
//! Timestamps are ISO 8601 strings in UTC (`%Y-%m-%dT%H:%M:%fZ` when written
//! by the database), matching what the storage layer persists.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a [`PluginAdapter`](crate::PluginAdapter).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Connector,
    Storage,
}

/// Status shared by replies and their dispatch jobs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplyStatus {
    /// Waiting to be posted by the dispatcher.
    Pending,
    /// Posted to the external platform.
    Posted,
    /// The last posting attempt failed. Stays put until re-queued.
    Failed,
}

/// A shop owning one or more platform accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}

/// A connected external account that reviews are pulled from and replies posted to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub store_id: i64,
    /// Platform identifier used to select a connector (e.g. "mock").
    pub platform: String,
    /// Login name shown to operators. Not a secret.
    pub login_name: String,
    /// Vault token for the account credential. Opaque outside the vault.
    pub encrypted_credential: String,
    pub created_at: String,
}

/// Fields for registering a new account. The credential is already encrypted.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub store_id: i64,
    pub platform: String,
    pub login_name: String,
    pub encrypted_credential: String,
}

/// A review as reported by a connector, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorReview {
    pub external_review_id: String,
    pub customer_name: String,
    /// Menu or product label the review is about. May be empty.
    pub subject: String,
    pub content: String,
    /// Raw timestamp text as reported by the platform.
    pub reviewed_at: String,
}

/// A validated review ready to be upserted. `reviewed_at` is RFC 3339 UTC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewUpsert {
    pub external_review_id: String,
    pub customer_name: String,
    pub subject: String,
    pub content: String,
    pub reviewed_at: String,
}

/// A persisted review, unique per `(account_id, external_review_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub account_id: i64,
    pub external_review_id: String,
    pub customer_name: String,
    pub subject: String,
    pub content: String,
    pub reviewed_at: String,
    /// When the review was first synchronized. Never changes after insert.
    pub first_seen_at: String,
}

/// A named reply template with `{placeholder}` tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: i64,
    pub name: String,
    pub body: String,
    pub created_at: String,
}

/// Rendered reply content for one review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub id: i64,
    pub review_id: i64,
    /// `None` once the originating template has been deleted.
    pub template_id: Option<i64>,
    pub content: String,
    pub status: ReplyStatus,
    pub fail_reason: String,
    pub created_at: String,
}

/// The unit of dispatch work paired one-to-one with a [`Reply`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyJob {
    pub id: i64,
    pub reply_id: i64,
    pub status: ReplyStatus,
    pub retry_count: u32,
    pub fail_reason: String,
    /// Set while a dispatch pass holds the job.
    pub claimed_until: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Display fields needed to render a reply for one review.
///
/// `store_name` and `platform` are `None` when the owning account or store
/// could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyContext {
    pub review_id: i64,
    pub customer_name: String,
    pub subject: String,
    pub store_name: Option<String>,
    pub platform: Option<String>,
}

/// A rendered reply waiting to be inserted together with its job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReply {
    pub review_id: i64,
    pub content: String,
}

/// Parameters for claiming pending jobs.
#[derive(Debug, Clone)]
pub struct JobClaim {
    /// Unique token identifying the claiming pass.
    pub token: String,
    /// How long the claim stays valid before another pass may take the job.
    pub ttl_secs: u64,
    /// Maximum number of jobs to claim.
    pub limit: usize,
}

/// Everything the dispatcher needs to post one reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchTarget {
    pub account_id: i64,
    pub platform: String,
    pub encrypted_credential: String,
    pub external_review_id: String,
    pub content: String,
}

/// A job claimed by a dispatch pass.
///
/// `target` is `None` when the reply, review, or account chain is broken.
#[derive(Debug, Clone)]
pub struct ClaimedJob {
    pub job: ReplyJob,
    pub target: Option<DispatchTarget>,
}

/// Result of one posting attempt, as reported by a connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostOutcome {
    pub success: bool,
    /// Human-readable failure reason. Empty on success.
    pub reason: String,
}

impl PostOutcome {
    pub fn posted() -> Self {
        Self {
            success: true,
            reason: String::new(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            reason: reason.into(),
        }
    }
}

/// Operator-facing tab a review falls into, derived from its latest reply.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum ReviewTab {
    /// No reply yet, or the latest reply failed.
    #[strum(serialize = "미등록")]
    Unregistered,
    /// Latest reply is waiting for dispatch.
    #[strum(serialize = "등록대기")]
    Pending,
    /// Latest reply was posted.
    #[strum(serialize = "완료")]
    Done,
}

impl ReviewTab {
    /// Classify a review by the status of its latest reply.
    pub fn from_latest_status(status: Option<ReplyStatus>) -> Self {
        match status {
            Some(ReplyStatus::Pending) => ReviewTab::Pending,
            Some(ReplyStatus::Posted) => ReviewTab::Done,
            Some(ReplyStatus::Failed) | None => ReviewTab::Unregistered,
        }
    }
}

/// Filter for review listings. Bounds are inclusive RFC 3339 timestamps.
#[derive(Debug, Clone, Default)]
pub struct ReviewFilter {
    pub from: Option<String>,
    pub to: Option<String>,
    /// `None` lists every tab.
    pub tab: Option<ReviewTab>,
}

/// One row of a review listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRow {
    pub review: Review,
    pub tab: ReviewTab,
}

/// Per-tab review counts over the filtered date range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TabCounts {
    pub all: usize,
    pub unregistered: usize,
    pub pending: usize,
    pub done: usize,
}

/// A review listing plus tab counts.
#[derive(Debug, Clone, Default)]
pub struct ReviewListing {
    pub items: Vec<ReviewRow>,
    pub counts: TabCounts,
}

// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connector adapter trait for review platforms.

use async_trait::async_trait;
use secrecy::SecretString;

use crate::error::ReplydError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ConnectorReview, PostOutcome};

/// Adapter for one external review platform.
///
/// Implementations must not retain or mutate the credential, and both
/// operations must be safe to call repeatedly. Listing is idempotent;
/// posting may be repeated after a crash (at-least-once).
#[async_trait]
pub trait ConnectorAdapter: PluginAdapter {
    /// Platform identifier this connector serves. Matches `Account::platform`.
    fn platform(&self) -> &str;

    /// Returns every review currently visible on the account.
    async fn list_reviews(
        &self,
        credential: &SecretString,
    ) -> Result<Vec<ConnectorReview>, ReplydError>;

    /// Attempts to post a single reply.
    ///
    /// A rejected post is `Ok(PostOutcome { success: false, .. })`. `Err` is
    /// reserved for transport failures; the dispatcher treats both the same.
    async fn post_reply(
        &self,
        credential: &SecretString,
        external_review_id: &str,
        content: &str,
    ) -> Result<PostOutcome, ReplydError>;
}

// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bulk reply creation from a template.

use std::sync::Arc;

use tracing::{debug, info};

use replyd_core::types::NewReply;
use replyd_core::{ReplydError, StorageAdapter};

use crate::template::{self, TemplateFields};

/// Renders a template for a batch of reviews and queues the replies.
pub struct ReplyGenerator {
    storage: Arc<dyn StorageAdapter>,
}

impl ReplyGenerator {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self { storage }
    }

    /// Create one PENDING reply and job per review, in one transaction.
    ///
    /// Review ids with no review, or whose review already has a PENDING or
    /// POSTED reply, are skipped and not counted. An unknown template is an
    /// error and nothing is created.
    pub async fn create_bulk(
        &self,
        template_id: i64,
        review_ids: &[i64],
    ) -> Result<usize, ReplydError> {
        let template = self
            .storage
            .get_template(template_id)
            .await?
            .ok_or(ReplydError::TemplateNotFound(template_id))?;

        let contexts = self.storage.reply_contexts(review_ids).await?;
        let replies: Vec<NewReply> = contexts
            .iter()
            .map(|ctx| NewReply {
                review_id: ctx.review_id,
                content: template::render(&template.body, &TemplateFields::from(ctx)),
            })
            .collect();
        debug!(
            template_id,
            requested = review_ids.len(),
            resolved = replies.len(),
            "rendered replies"
        );

        let created = self.storage.create_replies(Some(template_id), &replies).await?;
        info!(template_id, created, "bulk replies queued");
        Ok(created)
    }
}

// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted connector for deterministic pipeline tests.
//!
//! `MockConnector` returns the reviews registered for each credential,
//! answers posts with scripted outcomes, and records every post it receives.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;

use replyd_core::types::{AdapterType, ConnectorReview, HealthStatus, PostOutcome};
use replyd_core::{ConnectorAdapter, PluginAdapter, ReplydError};

/// One call to [`ConnectorAdapter::post_reply`] seen by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPost {
    pub credential: String,
    pub external_review_id: String,
    pub content: String,
}

#[derive(Debug, Clone)]
enum ScriptedPost {
    Outcome(PostOutcome),
    Error(String),
}

#[derive(Default)]
struct State {
    reviews: HashMap<String, Vec<ConnectorReview>>,
    failing_credentials: HashSet<String>,
    outcomes: HashMap<String, ScriptedPost>,
    posts: Vec<RecordedPost>,
    list_calls: usize,
}

/// A connector whose behavior is set up by the test.
///
/// Unknown credentials list no reviews. Posts succeed unless an outcome was
/// scripted for the external review id.
#[derive(Clone)]
pub struct MockConnector {
    platform: String,
    latency: Option<Duration>,
    state: Arc<Mutex<State>>,
}

impl MockConnector {
    /// Create a mock serving the `mock` platform.
    pub fn new() -> Self {
        Self::for_platform("mock")
    }

    pub fn for_platform(platform: &str) -> Self {
        Self {
            platform: platform.to_string(),
            latency: None,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Delay every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Set the reviews returned for `credential`.
    pub async fn set_reviews(&self, credential: &str, reviews: Vec<ConnectorReview>) {
        self.state
            .lock()
            .await
            .reviews
            .insert(credential.to_string(), reviews);
    }

    /// Make `list_reviews` fail for `credential`.
    pub async fn fail_listing_for(&self, credential: &str) {
        self.state
            .lock()
            .await
            .failing_credentials
            .insert(credential.to_string());
    }

    /// Answer posts for `external_review_id` with `outcome`.
    pub async fn script_outcome(&self, external_review_id: &str, outcome: PostOutcome) {
        self.state
            .lock()
            .await
            .outcomes
            .insert(external_review_id.to_string(), ScriptedPost::Outcome(outcome));
    }

    /// Make posts for `external_review_id` fail with a transport error.
    pub async fn script_error(&self, external_review_id: &str, message: &str) {
        self.state.lock().await.outcomes.insert(
            external_review_id.to_string(),
            ScriptedPost::Error(message.to_string()),
        );
    }

    /// Every post received so far, in arrival order.
    pub async fn posts(&self) -> Vec<RecordedPost> {
        self.state.lock().await.posts.clone()
    }

    pub async fn post_count(&self) -> usize {
        self.state.lock().await.posts.len()
    }

    pub async fn list_calls(&self) -> usize {
        self.state.lock().await.list_calls
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a review with the given id and content, dated `reviewed_at`.
pub fn review(external_review_id: &str, content: &str, reviewed_at: &str) -> ConnectorReview {
    ConnectorReview {
        external_review_id: external_review_id.to_string(),
        customer_name: "민수".to_string(),
        subject: "치킨".to_string(),
        content: content.to_string(),
        reviewed_at: reviewed_at.to_string(),
    }
}

#[async_trait]
impl PluginAdapter for MockConnector {
    fn name(&self) -> &str {
        "mock-connector"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Connector
    }

    async fn health_check(&self) -> Result<HealthStatus, ReplydError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ReplydError> {
        Ok(())
    }
}

#[async_trait]
impl ConnectorAdapter for MockConnector {
    fn platform(&self) -> &str {
        &self.platform
    }

    async fn list_reviews(
        &self,
        credential: &SecretString,
    ) -> Result<Vec<ConnectorReview>, ReplydError> {
        self.delay().await;
        let mut state = self.state.lock().await;
        state.list_calls += 1;
        let credential = credential.expose_secret();
        if state.failing_credentials.contains(credential) {
            return Err(ReplydError::connector(&self.platform, "listing rejected"));
        }
        Ok(state.reviews.get(credential).cloned().unwrap_or_default())
    }

    async fn post_reply(
        &self,
        credential: &SecretString,
        external_review_id: &str,
        content: &str,
    ) -> Result<PostOutcome, ReplydError> {
        self.delay().await;
        let mut state = self.state.lock().await;
        state.posts.push(RecordedPost {
            credential: credential.expose_secret().to_string(),
            external_review_id: external_review_id.to_string(),
            content: content.to_string(),
        });
        match state.outcomes.get(external_review_id) {
            None => Ok(PostOutcome::posted()),
            Some(ScriptedPost::Outcome(outcome)) => Ok(outcome.clone()),
            Some(ScriptedPost::Error(message)) => {
                Err(ReplydError::connector(&self.platform, message.as_str()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[tokio::test]
    async fn reviews_are_scoped_by_credential() {
        let mock = MockConnector::new();
        mock.set_reviews("a", vec![review("r1", "good", "2026-03-01")]).await;

        assert_eq!(mock.list_reviews(&secret("a")).await.unwrap().len(), 1);
        assert!(mock.list_reviews(&secret("b")).await.unwrap().is_empty());
        assert_eq!(mock.list_calls().await, 2);
    }

    #[tokio::test]
    async fn failing_credential_errors() {
        let mock = MockConnector::new();
        mock.fail_listing_for("bad").await;
        assert!(matches!(
            mock.list_reviews(&secret("bad")).await,
            Err(ReplydError::Connector { .. })
        ));
    }

    #[tokio::test]
    async fn posts_are_recorded_with_scripted_outcomes() {
        let mock = MockConnector::new();
        mock.script_outcome("r2", PostOutcome::failed("rate limited")).await;
        mock.script_error("r3", "connection reset").await;

        assert!(mock.post_reply(&secret("a"), "r1", "thanks").await.unwrap().success);
        let failed = mock.post_reply(&secret("a"), "r2", "thanks").await.unwrap();
        assert_eq!(failed.reason, "rate limited");
        assert!(mock.post_reply(&secret("a"), "r3", "thanks").await.is_err());

        let posts = mock.posts().await;
        assert_eq!(posts.len(), 3);
        assert_eq!(posts[0].external_review_id, "r1");
        assert_eq!(posts[0].credential, "a");
    }

    #[tokio::test(start_paused = true)]
    async fn latency_delays_calls() {
        let mock = MockConnector::new().with_latency(Duration::from_secs(5));
        let started = tokio::time::Instant::now();
        mock.list_reviews(&secret("a")).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(5));
    }
}

// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Simulated review platform for local runs and demos.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use secrecy::SecretString;

use replyd_config::model::MockConnectorConfig;
use replyd_core::types::{ConnectorReview, PostOutcome};
use replyd_core::{AdapterType, ConnectorAdapter, HealthStatus, PluginAdapter, ReplydError};

/// Platform identifier served by [`SimulatedConnector`].
pub const PLATFORM: &str = "mock";

/// Failure reason reported for a simulated rejection.
pub const SIMULATED_FAILURE_REASON: &str = "랜덤 시뮬레이션 실패";

const SUBJECTS: [&str; 4] = ["치킨", "피자", "떡볶이", ""];
const CONTENTS: [&str; 3] = ["맛있어요", "보통이에요", "다음엔 더 빨리 주세요"];

/// Connector that fabricates reviews and randomly rejects posts.
///
/// Every account sees the same external ids `mock-1..mock-N`, the review
/// at index `i` dated `i` hours ago.
pub struct SimulatedConnector {
    failure_rate: f64,
    reviews_per_account: usize,
    rng: Mutex<StdRng>,
}

impl SimulatedConnector {
    pub fn new(config: &MockConnectorConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Deterministic variant for tests.
    pub fn with_seed(config: &MockConnectorConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: &MockConnectorConfig, rng: StdRng) -> Self {
        Self {
            failure_rate: config.failure_rate,
            reviews_per_account: config.reviews_per_account,
            rng: Mutex::new(rng),
        }
    }

    fn with_rng_locked<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> Result<T, ReplydError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| ReplydError::Internal("simulated connector rng poisoned".to_string()))?;
        Ok(f(&mut rng))
    }
}

#[async_trait]
impl PluginAdapter for SimulatedConnector {
    fn name(&self) -> &str {
        "simulated"
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
impl ConnectorAdapter for SimulatedConnector {
    fn platform(&self) -> &str {
        PLATFORM
    }

    async fn list_reviews(
        &self,
        _credential: &SecretString,
    ) -> Result<Vec<ConnectorReview>, ReplydError> {
        let now = Utc::now();
        self.with_rng_locked(|rng| {
            (1..=self.reviews_per_account)
                .map(|i| ConnectorReview {
                    external_review_id: format!("mock-{i}"),
                    customer_name: format!("고객{i}"),
                    subject: SUBJECTS.choose(rng).copied().unwrap_or_default().to_string(),
                    content: CONTENTS.choose(rng).copied().unwrap_or_default().to_string(),
                    reviewed_at: (now - Duration::hours(i as i64))
                        .format("%Y-%m-%dT%H:%M:%SZ")
                        .to_string(),
                })
                .collect()
        })
    }

    async fn post_reply(
        &self,
        _credential: &SecretString,
        _external_review_id: &str,
        _content: &str,
    ) -> Result<PostOutcome, ReplydError> {
        let roll: f64 = self.with_rng_locked(|rng| rng.r#gen())?;
        Ok(if roll >= self.failure_rate {
            PostOutcome::posted()
        } else {
            PostOutcome::failed(SIMULATED_FAILURE_REASON)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(failure_rate: f64, reviews_per_account: usize) -> MockConnectorConfig {
        MockConnectorConfig {
            failure_rate,
            reviews_per_account,
        }
    }

    fn credential() -> SecretString {
        SecretString::from("owner:pw".to_string())
    }

    #[tokio::test]
    async fn lists_stable_ids_newest_first() {
        let connector = SimulatedConnector::with_seed(&config(0.0, 5), 7);
        let reviews = connector.list_reviews(&credential()).await.unwrap();

        let ids: Vec<_> = reviews.iter().map(|r| r.external_review_id.as_str()).collect();
        assert_eq!(ids, ["mock-1", "mock-2", "mock-3", "mock-4", "mock-5"]);
        assert!(reviews.windows(2).all(|w| w[0].reviewed_at > w[1].reviewed_at));
        assert!(reviews.iter().all(|r| SUBJECTS.contains(&r.subject.as_str())));
        assert_eq!(reviews[0].customer_name, "고객1");
    }

    #[tokio::test]
    async fn review_count_follows_config() {
        let connector = SimulatedConnector::with_seed(&config(0.0, 2), 1);
        assert_eq!(connector.list_reviews(&credential()).await.unwrap().len(), 2);

        let empty = SimulatedConnector::with_seed(&config(0.0, 0), 1);
        assert!(empty.list_reviews(&credential()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failure_rate_bounds_are_absolute() {
        let always_ok = SimulatedConnector::with_seed(&config(0.0, 1), 3);
        let always_fail = SimulatedConnector::with_seed(&config(1.0, 1), 3);
        for _ in 0..50 {
            assert!(always_ok.post_reply(&credential(), "mock-1", "감사합니다").await.unwrap().success);
            let outcome = always_fail.post_reply(&credential(), "mock-1", "감사합니다").await.unwrap();
            assert!(!outcome.success);
            assert_eq!(outcome.reason, SIMULATED_FAILURE_REASON);
        }
    }

    #[tokio::test]
    async fn identifies_as_mock_connector() {
        let connector = SimulatedConnector::new(&MockConnectorConfig::default());
        assert_eq!(connector.platform(), PLATFORM);
        assert_eq!(connector.adapter_type(), AdapterType::Connector);
        assert_eq!(connector.health_check().await.unwrap(), HealthStatus::Healthy);
    }
}

// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry of connectors keyed by platform identifier.

use std::collections::HashMap;
use std::sync::Arc;

use replyd_config::model::ConnectorsConfig;
use replyd_core::{ConnectorAdapter, HealthStatus, ReplydError};
use tracing::{debug, warn};

use crate::simulated::{self, SimulatedConnector};

/// Connectors available to the synchronizer and dispatcher.
///
/// Built once at startup and shared read-only; one connector per platform.
#[derive(Clone, Default)]
pub struct ConnectorRegistry {
    connectors: HashMap<String, Arc<dyn ConnectorAdapter>>,
}

impl std::fmt::Debug for ConnectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectorRegistry")
            .field("platforms", &self.platforms())
            .finish()
    }
}

impl ConnectorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the built-in connector for every enabled platform.
    pub fn from_config(config: &ConnectorsConfig) -> Result<Self, ReplydError> {
        let mut registry = Self::new();
        for platform in &config.enabled_platforms {
            match platform.as_str() {
                simulated::PLATFORM => {
                    registry.register(Arc::new(SimulatedConnector::new(&config.mock)));
                }
                other => {
                    return Err(ReplydError::Config(format!(
                        "no built-in connector for platform `{other}`"
                    )));
                }
            }
        }
        Ok(registry)
    }

    /// Register a connector under its own platform identifier.
    ///
    /// A connector already registered for that platform is replaced.
    pub fn register(&mut self, connector: Arc<dyn ConnectorAdapter>) {
        let platform = connector.platform().to_string();
        if self.connectors.contains_key(&platform) {
            warn!(platform = %platform, "replacing registered connector");
        }
        debug!(platform = %platform, connector = connector.name(), "connector registered");
        self.connectors.insert(platform, connector);
    }

    /// Look up the connector for `platform`.
    pub fn get(&self, platform: &str) -> Option<Arc<dyn ConnectorAdapter>> {
        self.connectors.get(platform).cloned()
    }

    /// Like [`get`](Self::get), but a missing platform is an error.
    pub fn require(&self, platform: &str) -> Result<Arc<dyn ConnectorAdapter>, ReplydError> {
        self.get(platform)
            .ok_or_else(|| ReplydError::ConnectorNotFound {
                platform: platform.to_string(),
            })
    }

    /// Registered platform identifiers, sorted.
    pub fn platforms(&self) -> Vec<&str> {
        let mut platforms: Vec<&str> = self.connectors.keys().map(String::as_str).collect();
        platforms.sort_unstable();
        platforms
    }

    /// Health of every registered connector, sorted by platform.
    ///
    /// A health check that errors is reported as unhealthy.
    pub async fn health_check_all(&self) -> Vec<(String, HealthStatus)> {
        let mut report = Vec::with_capacity(self.connectors.len());
        for platform in self.platforms() {
            let Some(connector) = self.connectors.get(platform) else {
                continue;
            };
            let status = match connector.health_check().await {
                Ok(status) => status,
                Err(e) => HealthStatus::Unhealthy(e.to_string()),
            };
            report.push((platform.to_string(), status));
        }
        report
    }

    /// Shut down every connector, logging individual failures.
    pub async fn shutdown_all(&self) {
        for (platform, connector) in &self.connectors {
            if let Err(e) = connector.shutdown().await {
                warn!(platform = %platform, error = %e, "connector shutdown failed");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_registers_the_mock_platform() {
        let registry = ConnectorRegistry::from_config(&ConnectorsConfig::default()).unwrap();
        assert_eq!(registry.platforms(), vec!["mock"]);
        assert_eq!(registry.require("mock").unwrap().platform(), "mock");
    }

    #[test]
    fn unknown_platform_in_config_is_rejected() {
        let config = ConnectorsConfig {
            enabled_platforms: vec!["mock".into(), "baemin".into()],
            ..ConnectorsConfig::default()
        };
        let err = ConnectorRegistry::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("baemin"));
    }

    #[test]
    fn missing_platform_lookup() {
        let registry = ConnectorRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get("mock").is_none());
        assert!(matches!(
            registry.require("mock"),
            Err(ReplydError::ConnectorNotFound { platform }) if platform == "mock"
        ));
    }

    #[test]
    fn register_replaces_same_platform() {
        let config = ConnectorsConfig::default();
        let mut registry = ConnectorRegistry::new();
        registry.register(Arc::new(SimulatedConnector::new(&config.mock)));
        registry.register(Arc::new(SimulatedConnector::new(&config.mock)));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn health_report_covers_each_platform() {
        let registry = ConnectorRegistry::from_config(&ConnectorsConfig::default()).unwrap();
        let report = registry.health_check_all().await;
        assert_eq!(report, vec![("mock".to_string(), HealthStatus::Healthy)]);
        registry.shutdown_all().await;
    }
}

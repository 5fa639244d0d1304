// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end pipeline testing.
//!
//! `TestHarness` assembles the whole pipeline on a temp SQLite database:
//! storage, an unlocked vault, a registry holding a [`MockConnector`], and
//! the synchronizer, reply generator, and dispatcher wired to them.

use std::sync::Arc;

use replyd_config::model::{ReplydConfig, VaultConfig};
use replyd_connector::ConnectorRegistry;
use replyd_core::types::{Account, NewAccount, Store, Template};
use replyd_core::{ConnectorAdapter, CredentialCipher, ReplydError, StorageAdapter};
use replyd_pipeline::{
    DispatchSettings, Dispatcher, ReplyGenerator, SyncSettings, Synchronizer,
};
use replyd_storage::{Database, DatabaseOptions, SqliteStorage};
use replyd_vault::CredentialVault;
use secrecy::SecretString;

use crate::mock_connector::MockConnector;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    connector: MockConnector,
    extra_connectors: Vec<Arc<dyn ConnectorAdapter>>,
    config: ReplydConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = ReplydConfig::default();
        config.vault = VaultConfig {
            kdf_memory_cost: 32768,
            kdf_iterations: 2,
            kdf_parallelism: 1,
        };
        Self {
            connector: MockConnector::new(),
            extra_connectors: Vec::new(),
            config,
        }
    }

    /// Use a pre-configured mock connector.
    pub fn with_connector(mut self, connector: MockConnector) -> Self {
        self.connector = connector;
        self
    }

    /// Register an additional connector for another platform.
    pub fn with_extra_connector(mut self, connector: Arc<dyn ConnectorAdapter>) -> Self {
        self.extra_connectors.push(connector);
        self
    }

    /// Adjust the configuration. The database path is always overridden.
    pub fn with_config(mut self, edit: impl FnOnce(&mut ReplydConfig)) -> Self {
        edit(&mut self.config);
        self
    }

    /// Build the harness, creating all subsystems.
    pub async fn build(self) -> Result<TestHarness, ReplydError> {
        let temp_dir = tempfile::TempDir::new().map_err(ReplydError::storage)?;
        let mut config = self.config;
        config.storage.database_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .into_owned();

        let db = Database::open_with(
            &config.storage.database_path,
            DatabaseOptions::from(&config.storage),
        )
        .await?;
        let storage: Arc<dyn StorageAdapter> = Arc::new(SqliteStorage::from_database(
            config.storage.clone(),
            db.clone(),
        ));

        let passphrase = SecretString::from("test-passphrase".to_string());
        let vault: Arc<dyn CredentialCipher> =
            Arc::new(CredentialVault::create(db.connection(), &passphrase, &config.vault).await?);

        let mut registry = ConnectorRegistry::new();
        registry.register(Arc::new(self.connector.clone()));
        for extra in self.extra_connectors {
            registry.register(extra);
        }
        let connectors = Arc::new(registry);

        let synchronizer = Synchronizer::new(
            storage.clone(),
            connectors.clone(),
            vault.clone(),
            SyncSettings::from_config(&config)?,
        );
        let generator = ReplyGenerator::new(storage.clone());
        let dispatcher = Dispatcher::new(
            storage.clone(),
            connectors.clone(),
            vault.clone(),
            DispatchSettings::from_config(&config),
        );

        Ok(TestHarness {
            connector: self.connector,
            storage,
            db,
            vault,
            connectors,
            synchronizer,
            generator,
            dispatcher,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete pipeline over temp storage with a scripted connector.
pub struct TestHarness {
    /// The scripted connector registered for the `mock` platform.
    pub connector: MockConnector,
    /// SQLite storage adapter (temp DB, cleaned up on drop).
    pub storage: Arc<dyn StorageAdapter>,
    /// Raw database handle, for assertions the adapter does not expose.
    pub db: Database,
    /// Unlocked credential vault.
    pub vault: Arc<dyn CredentialCipher>,
    pub connectors: Arc<ConnectorRegistry>,
    pub synchronizer: Synchronizer,
    pub generator: ReplyGenerator,
    pub dispatcher: Dispatcher,
    pub config: ReplydConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Build a harness with defaults.
    pub async fn new() -> Result<Self, ReplydError> {
        Self::builder().build().await
    }

    /// A second dispatcher over the same storage, as another process would run.
    pub fn new_dispatcher(&self) -> Dispatcher {
        Dispatcher::new(
            self.storage.clone(),
            self.connectors.clone(),
            self.vault.clone(),
            DispatchSettings::from_config(&self.config),
        )
    }

    pub async fn add_store(&self, name: &str) -> Result<Store, ReplydError> {
        self.storage.create_store(name).await
    }

    /// Register an account whose plaintext credential is `credential`.
    pub async fn add_account(
        &self,
        store: &Store,
        platform: &str,
        login_name: &str,
        credential: &str,
    ) -> Result<Account, ReplydError> {
        let encrypted_credential = self.vault.encrypt(credential)?;
        self.storage
            .create_account(&NewAccount {
                store_id: store.id,
                platform: platform.to_string(),
                login_name: login_name.to_string(),
                encrypted_credential,
            })
            .await
    }

    pub async fn add_template(&self, name: &str, body: &str) -> Result<Template, ReplydError> {
        self.storage.create_template(name, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn harness_builds_with_working_vault() {
        let harness = TestHarness::new().await.unwrap();
        let store = harness.add_store("행복치킨").await.unwrap();
        let account = harness
            .add_account(&store, "mock", "owner", "owner:pw")
            .await
            .unwrap();

        assert_ne!(account.encrypted_credential, "owner:pw");
        assert_eq!(harness.connectors.platforms(), vec!["mock"]);
        assert!(harness.storage.list_accounts().await.unwrap().len() == 1);
    }

    #[tokio::test]
    async fn config_edits_are_applied() {
        let harness = TestHarness::builder()
            .with_config(|c| c.dispatch.batch_limit = 2)
            .build()
            .await
            .unwrap();
        assert_eq!(harness.config.dispatch.batch_limit, 2);
        assert!(harness.config.storage.database_path.ends_with("test.db"));
    }
}

// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared startup: open storage, unlock the vault, build connectors.

use std::sync::Arc;

use replyd_config::model::ReplydConfig;
use replyd_connector::ConnectorRegistry;
use replyd_core::{CredentialCipher, ReplydError, StorageAdapter};
use replyd_pipeline::{DispatchSettings, Dispatcher, ReplyGenerator, SyncSettings, Synchronizer};
use replyd_storage::{Database, DatabaseOptions, SqliteStorage};
use replyd_vault::{get_vault_passphrase, CredentialVault};
use tracing::info;

/// Opened storage; enough for commands that never touch credentials.
pub struct Storage {
    pub db: Database,
    pub storage: Arc<dyn StorageAdapter>,
}

impl Storage {
    pub async fn open(config: &ReplydConfig) -> Result<Self, ReplydError> {
        let db = Database::open_with(
            &config.storage.database_path,
            DatabaseOptions::from(&config.storage),
        )
        .await?;
        let storage: Arc<dyn StorageAdapter> = Arc::new(SqliteStorage::from_database(
            config.storage.clone(),
            db.clone(),
        ));
        Ok(Self { db, storage })
    }
}

/// Everything the pipeline needs: storage, unlocked vault, connectors.
pub struct App {
    pub storage: Arc<dyn StorageAdapter>,
    pub vault: Arc<dyn CredentialCipher>,
    pub connectors: Arc<ConnectorRegistry>,
}

impl App {
    /// Open storage and unlock the vault, creating it on first use.
    pub async fn open(config: &ReplydConfig) -> Result<Self, ReplydError> {
        let Storage { db, storage } = Storage::open(config).await?;

        let exists = CredentialVault::exists(db.connection()).await?;
        let passphrase = get_vault_passphrase(!exists)?;
        let vault = CredentialVault::open_or_create(db.connection(), &passphrase, &config.vault)
            .await?;

        let connectors = ConnectorRegistry::from_config(&config.connectors)?;
        info!(platforms = ?connectors.platforms(), "connectors registered");

        Ok(Self {
            storage,
            vault: Arc::new(vault),
            connectors: Arc::new(connectors),
        })
    }

    pub fn synchronizer(&self, config: &ReplydConfig) -> Result<Synchronizer, ReplydError> {
        Ok(Synchronizer::new(
            self.storage.clone(),
            self.connectors.clone(),
            self.vault.clone(),
            SyncSettings::from_config(config)?,
        ))
    }

    pub fn dispatcher(&self, config: &ReplydConfig) -> Dispatcher {
        Dispatcher::new(
            self.storage.clone(),
            self.connectors.clone(),
            self.vault.clone(),
            DispatchSettings::from_config(config),
        )
    }

    pub fn generator(&self) -> ReplyGenerator {
        ReplyGenerator::new(self.storage.clone())
    }
}

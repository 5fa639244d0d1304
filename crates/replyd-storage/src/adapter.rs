// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use replyd_config::model::StorageConfig;
use replyd_core::types::{
    Account, ClaimedJob, JobClaim, NewAccount, NewReply, PostOutcome, Reply, ReplyContext,
    ReplyJob, Review, ReviewFilter, ReviewListing, ReviewUpsert, Store, Template,
};
use replyd_core::{
    AdapterType, HealthStatus, PluginAdapter, ReplyStatus, ReplydError, StorageAdapter,
};

use crate::database::{map_tr_err, Database, DatabaseOptions};
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates every operation to the typed
/// query modules. The database is opened by [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`initialize`](StorageAdapter::initialize) is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Wrap an already opened database.
    pub fn from_database(config: StorageConfig, db: Database) -> Self {
        Self {
            config,
            db: OnceCell::new_with(Some(db)),
        }
    }

    /// Returns the underlying Database, or an error if not initialized.
    pub fn database(&self) -> Result<&Database, ReplydError> {
        self.db.get().ok_or_else(|| ReplydError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, ReplydError> {
        let db = match self.database() {
            Ok(db) => db,
            Err(e) => return Ok(HealthStatus::Unhealthy(e.to_string())),
        };
        let probe = db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err);
        Ok(match probe {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }

    async fn shutdown(&self) -> Result<(), ReplydError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), ReplydError> {
        let path = self.config.database_path.clone();
        let db = Database::open_with(&path, DatabaseOptions::from(&self.config)).await?;
        self.db.set(db).map_err(|_| ReplydError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), ReplydError> {
        self.database()?.checkpoint().await
    }

    // --- Stores and accounts ---

    async fn create_store(&self, name: &str) -> Result<Store, ReplydError> {
        queries::stores::create_store(self.database()?, name).await
    }

    async fn list_stores(&self) -> Result<Vec<Store>, ReplydError> {
        queries::stores::list_stores(self.database()?).await
    }

    async fn create_account(&self, account: &NewAccount) -> Result<Account, ReplydError> {
        queries::stores::create_account(self.database()?, account).await
    }

    async fn get_account(&self, id: i64) -> Result<Option<Account>, ReplydError> {
        queries::stores::get_account(self.database()?, id).await
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, ReplydError> {
        queries::stores::list_accounts(self.database()?).await
    }

    // --- Templates ---

    async fn create_template(&self, name: &str, body: &str) -> Result<Template, ReplydError> {
        queries::templates::create_template(self.database()?, name, body).await
    }

    async fn get_template(&self, id: i64) -> Result<Option<Template>, ReplydError> {
        queries::templates::get_template(self.database()?, id).await
    }

    async fn list_templates(&self) -> Result<Vec<Template>, ReplydError> {
        queries::templates::list_templates(self.database()?).await
    }

    async fn delete_template(&self, id: i64) -> Result<bool, ReplydError> {
        queries::templates::delete_template(self.database()?, id).await
    }

    // --- Reviews ---

    async fn upsert_reviews(
        &self,
        account_id: i64,
        reviews: &[ReviewUpsert],
    ) -> Result<usize, ReplydError> {
        queries::reviews::upsert_reviews(self.database()?, account_id, reviews).await
    }

    async fn get_review(&self, id: i64) -> Result<Option<Review>, ReplydError> {
        queries::reviews::get_review(self.database()?, id).await
    }

    async fn find_review(
        &self,
        account_id: i64,
        external_review_id: &str,
    ) -> Result<Option<Review>, ReplydError> {
        queries::reviews::find_review(self.database()?, account_id, external_review_id).await
    }

    async fn list_reviews(&self, filter: &ReviewFilter) -> Result<ReviewListing, ReplydError> {
        queries::reviews::list_reviews(self.database()?, filter).await
    }

    // --- Replies ---

    async fn reply_contexts(&self, review_ids: &[i64]) -> Result<Vec<ReplyContext>, ReplydError> {
        queries::replies::reply_contexts(self.database()?, review_ids).await
    }

    async fn create_replies(
        &self,
        template_id: Option<i64>,
        replies: &[NewReply],
    ) -> Result<usize, ReplydError> {
        queries::replies::create_replies(self.database()?, template_id, replies).await
    }

    async fn get_reply(&self, id: i64) -> Result<Option<Reply>, ReplydError> {
        queries::replies::get_reply(self.database()?, id).await
    }

    async fn replies_for_review(&self, review_id: i64) -> Result<Vec<Reply>, ReplydError> {
        queries::replies::replies_for_review(self.database()?, review_id).await
    }

    // --- Jobs ---

    async fn claim_pending_jobs(&self, claim: &JobClaim) -> Result<Vec<ClaimedJob>, ReplydError> {
        queries::jobs::claim_pending_jobs(self.database()?, claim).await
    }

    async fn release_claim(&self, job_id: i64, token: &str) -> Result<(), ReplydError> {
        queries::jobs::release_claim(self.database()?, job_id, token).await
    }

    async fn renew_claim(&self, job_id: i64, token: &str, ttl_secs: u64) -> Result<bool, ReplydError> {
        queries::jobs::renew_claim(self.database()?, job_id, token, ttl_secs).await
    }

    async fn record_outcome(
        &self,
        job_id: i64,
        token: &str,
        outcome: &PostOutcome,
    ) -> Result<bool, ReplydError> {
        queries::jobs::record_outcome(self.database()?, job_id, token, outcome).await
    }

    async fn get_job(&self, id: i64) -> Result<Option<ReplyJob>, ReplydError> {
        queries::jobs::get_job(self.database()?, id).await
    }

    async fn list_jobs(&self, status: Option<ReplyStatus>) -> Result<Vec<ReplyJob>, ReplydError> {
        queries::jobs::list_jobs(self.database()?, status).await
    }

    async fn requeue_job(&self, id: i64) -> Result<bool, ReplydError> {
        queries::jobs::requeue_job(self.database()?, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config_for(dir: &tempfile::TempDir) -> StorageConfig {
        StorageConfig {
            database_path: dir.path().join("adapter.db").to_string_lossy().into_owned(),
            ..StorageConfig::default()
        }
    }

    #[tokio::test]
    async fn operations_require_initialize() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(config_for(&dir));

        assert!(matches!(
            storage.list_stores().await,
            Err(ReplydError::Storage { .. })
        ));
        assert!(matches!(
            storage.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
    }

    #[tokio::test]
    async fn initialize_twice_fails() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(config_for(&dir));
        storage.initialize().await.unwrap();
        assert!(storage.initialize().await.is_err());
    }

    #[tokio::test]
    async fn health_and_round_trip_through_adapter() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(config_for(&dir));
        storage.initialize().await.unwrap();

        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.adapter_type(), AdapterType::Storage);

        let store = storage.create_store("s").await.unwrap();
        assert_eq!(storage.list_stores().await.unwrap(), vec![store]);

        storage.close().await.unwrap();
        storage.shutdown().await.unwrap();
    }
}

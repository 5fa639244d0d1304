// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;
use std::time::Duration;

use replyd_config::model::StorageConfig;
use replyd_core::ReplydError;
use tracing::{debug, warn};

use crate::migrations;

/// Connection settings applied when a database is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseOptions {
    pub wal_mode: bool,
    pub busy_timeout: Duration,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            wal_mode: true,
            busy_timeout: Duration::from_millis(5000),
        }
    }
}

impl From<&StorageConfig> for DatabaseOptions {
    fn from(config: &StorageConfig) -> Self {
        Self {
            wal_mode: config.wal_mode,
            busy_timeout: Duration::from_millis(config.busy_timeout_ms),
        }
    }
}

/// Handle to the replyd SQLite database.
///
/// Cloning is cheap and every clone shares the same writer thread.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Open (or create) the database at `path` with default options.
    pub async fn open(path: &str) -> Result<Self, ReplydError> {
        Self::open_with(path, DatabaseOptions::default()).await
    }

    /// Open (or create) the database at `path`, apply PRAGMAs, and run
    /// pending migrations.
    pub async fn open_with(path: &str, options: DatabaseOptions) -> Result<Self, ReplydError> {
        let in_memory = path == ":memory:";
        if !in_memory
            && let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(ReplydError::storage)?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(ReplydError::storage)?;

        let DatabaseOptions {
            wal_mode,
            busy_timeout,
        } = options;
        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            conn.busy_timeout(busy_timeout)?;
            if wal_mode {
                // SQLite silently keeps rollback journaling on filesystems
                // without shared memory support.
                let mode: String =
                    conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
                if !mode.eq_ignore_ascii_case("wal") && !mode.eq_ignore_ascii_case("memory") {
                    warn!(journal_mode = %mode, "WAL mode unavailable, continuing without it");
                }
            }
            conn.execute_batch(
                "PRAGMA foreign_keys = ON;
                 PRAGMA synchronous = NORMAL;",
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        conn.call(|conn| migrations::run_migrations(conn))
            .await
            .map_err(map_tr_err)?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// Returns the shared connection handle.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL into the main database file.
    pub async fn checkpoint(&self) -> Result<(), ReplydError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    /// Checkpoint and close the connection.
    pub async fn close(self) -> Result<(), ReplydError> {
        self.checkpoint().await?;
        self.conn.close().await.map_err(ReplydError::storage)
    }
}

/// Convert a tokio-rusqlite error into `ReplydError::Storage`.
pub fn map_tr_err<E>(e: tokio_rusqlite::Error<E>) -> ReplydError
where
    E: std::error::Error + Send + Sync + 'static,
{
    ReplydError::Storage {
        source: Box::new(e),
    }
}

// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL files under `migrations/` are compiled into the binary and applied
//! when a [`Database`](crate::Database) is opened.

use replyd_core::ReplydError;
use tracing::debug;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
///
/// Refinery records applied versions in `refinery_schema_history`.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), ReplydError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(|e| ReplydError::Storage {
            source: Box::new(e),
        })?;
    for migration in report.applied_migrations() {
        debug!(version = migration.version(), name = %migration.name(), "migration applied");
    }
    Ok(())
}

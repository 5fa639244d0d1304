// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for replyd.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and typed operations for stores,
//! accounts, reviews, templates, replies, and the reply job queue.
//!
//! All writes go through the one background thread owned by [`Database`].
//! Query modules accept `&Database` and call through `connection().call()`.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::{map_tr_err, Database, DatabaseOptions};

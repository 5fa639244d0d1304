// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! Async adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod cipher;
pub mod connector;
pub mod storage;

pub use adapter::PluginAdapter;
pub use cipher::CredentialCipher;
pub use connector::ConnectorAdapter;
pub use storage::StorageAdapter;

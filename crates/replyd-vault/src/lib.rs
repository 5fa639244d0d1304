// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AES-256-GCM credential encryption for replyd.
//!
//! Account credentials are sealed with a random master key. The master key
//! is itself wrapped by a passphrase-derived key (Argon2id) and stored in
//! the `vault_meta` table, so the database never holds a usable key.

pub mod crypto;
pub mod kdf;
pub mod prompt;
pub mod vault;

pub use prompt::get_vault_passphrase;
pub use vault::{mask_secret, CredentialVault};

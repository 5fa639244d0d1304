// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential encryption capability.

use secrecy::SecretString;

use crate::error::ReplydError;

/// Opaque encrypt/decrypt of account credentials.
///
/// Round-trips are deterministic; ciphertext is not (two encryptions of the
/// same plaintext produce different tokens).
pub trait CredentialCipher: Send + Sync {
    /// Encrypts a plaintext credential into a storable token.
    fn encrypt(&self, plaintext: &str) -> Result<String, ReplydError>;

    /// Decrypts a token produced by [`encrypt`](Self::encrypt).
    fn decrypt(&self, token: &str) -> Result<SecretString, ReplydError>;
}

// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential vault: create, unlock, and encrypt account credentials.
//!
//! A random master key encrypts every credential token. The master key is
//! itself sealed under an Argon2id key derived from the operator passphrase
//! and kept in the `vault_meta` table. Tokens live in `accounts` and are
//! opaque to everything but [`CredentialVault`].

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use replyd_config::model::VaultConfig;
use replyd_core::{CredentialCipher, ReplydError};
use rusqlite::{OptionalExtension, params};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::crypto;
use crate::kdf::{self, KdfParams};

/// Version prefix on every credential token.
const TOKEN_PREFIX: &str = "v1:";

/// The unlocked vault, holding the master key in memory.
pub struct CredentialVault {
    master_key: Zeroizing<[u8; 32]>,
}

impl std::fmt::Debug for CredentialVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVault")
            .field("master_key", &"[REDACTED]")
            .finish()
    }
}

struct VaultMeta {
    wrapped_master_key: Vec<u8>,
    salt: Vec<u8>,
    kdf_params: Vec<u8>,
}

impl CredentialVault {
    /// Check whether a vault has been created in this database.
    pub async fn exists(conn: &tokio_rusqlite::Connection) -> Result<bool, ReplydError> {
        conn.call(|conn| -> Result<bool, rusqlite::Error> {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM vault_meta WHERE key = 'wrapped_master_key'",
                [],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
        .await
        .map_err(map_tr_err)
    }

    /// Create a new vault with a random master key wrapped by `passphrase`.
    pub async fn create(
        conn: &tokio_rusqlite::Connection,
        passphrase: &SecretString,
        config: &VaultConfig,
    ) -> Result<Self, ReplydError> {
        if Self::exists(conn).await? {
            return Err(ReplydError::Vault("vault already exists".to_string()));
        }

        let master_key = Zeroizing::new(crypto::generate_random_key()?);
        let salt = kdf::generate_salt()?;
        let params = KdfParams::from(config);
        let wrapping_key = kdf::derive_key(passphrase.expose_secret().as_bytes(), &salt, params)?;
        let wrapped = crypto::seal_combined(&wrapping_key, master_key.as_ref())?;

        let salt_vec = salt.to_vec();
        let params_bytes = params.to_json_bytes();
        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            let tx = conn.transaction()?;
            {
                let mut stmt =
                    tx.prepare("INSERT INTO vault_meta (key, value) VALUES (?1, ?2)")?;
                stmt.execute(params!["wrapped_master_key", wrapped])?;
                stmt.execute(params!["kdf_salt", salt_vec])?;
                stmt.execute(params!["kdf_params", params_bytes])?;
            }
            tx.commit()
        })
        .await
        .map_err(map_tr_err)?;

        info!("credential vault created");
        Ok(Self { master_key })
    }

    /// Unlock an existing vault with `passphrase`.
    ///
    /// The KDF parameters stored at creation are used, not the current config.
    pub async fn unlock(
        conn: &tokio_rusqlite::Connection,
        passphrase: &SecretString,
    ) -> Result<Self, ReplydError> {
        let meta = conn
            .call(|conn| -> Result<Option<VaultMeta>, rusqlite::Error> {
                let get = |key: &str| -> Result<Option<Vec<u8>>, rusqlite::Error> {
                    conn.query_row(
                        "SELECT value FROM vault_meta WHERE key = ?1",
                        params![key],
                        |row| row.get(0),
                    )
                    .optional()
                };
                let (Some(wrapped_master_key), Some(salt), Some(kdf_params)) =
                    (get("wrapped_master_key")?, get("kdf_salt")?, get("kdf_params")?)
                else {
                    return Ok(None);
                };
                Ok(Some(VaultMeta {
                    wrapped_master_key,
                    salt,
                    kdf_params,
                }))
            })
            .await
            .map_err(map_tr_err)?
            .ok_or_else(|| ReplydError::Vault("no vault found -- create one first".to_string()))?;

        let params = KdfParams::from_json_bytes(&meta.kdf_params)?;
        let salt: [u8; 16] = meta
            .salt
            .try_into()
            .map_err(|_| ReplydError::Vault("corrupted salt (expected 16 bytes)".to_string()))?;

        let wrapping_key = kdf::derive_key(passphrase.expose_secret().as_bytes(), &salt, params)?;
        let master_key_bytes = Zeroizing::new(
            crypto::open_combined(&wrapping_key, &meta.wrapped_master_key).map_err(|_| {
                ReplydError::Vault(
                    "invalid passphrase or corrupted vault -- decryption failed".to_string(),
                )
            })?,
        );
        let master_key: [u8; 32] = master_key_bytes.as_slice().try_into().map_err(|_| {
            ReplydError::Vault("corrupted master key (expected 32 bytes)".to_string())
        })?;

        debug!("credential vault unlocked");
        Ok(Self {
            master_key: Zeroizing::new(master_key),
        })
    }

    /// Unlock the vault, creating it first if this database has none.
    pub async fn open_or_create(
        conn: &tokio_rusqlite::Connection,
        passphrase: &SecretString,
        config: &VaultConfig,
    ) -> Result<Self, ReplydError> {
        if Self::exists(conn).await? {
            Self::unlock(conn, passphrase).await
        } else {
            Self::create(conn, passphrase, config).await
        }
    }
}

impl CredentialCipher for CredentialVault {
    fn encrypt(&self, plaintext: &str) -> Result<String, ReplydError> {
        let sealed = crypto::seal_combined(&self.master_key, plaintext.as_bytes())?;
        Ok(format!("{TOKEN_PREFIX}{}", STANDARD.encode(sealed)))
    }

    fn decrypt(&self, token: &str) -> Result<SecretString, ReplydError> {
        let encoded = token
            .strip_prefix(TOKEN_PREFIX)
            .ok_or_else(|| ReplydError::Vault("unrecognized credential token".to_string()))?;
        let sealed = STANDARD
            .decode(encoded)
            .map_err(|e| ReplydError::Vault(format!("credential token is not base64: {e}")))?;
        let plaintext = Zeroizing::new(crypto::open_combined(&self.master_key, &sealed)?);
        let text = std::str::from_utf8(&plaintext)
            .map_err(|_| ReplydError::Vault("credential is not valid UTF-8".to_string()))?;
        Ok(SecretString::from(text.to_owned()))
    }
}

/// Mask a secret for display: the first 4 characters followed by `****`.
///
/// Short values are fully masked.
pub fn mask_secret(value: &str) -> String {
    let mut chars = value.chars();
    let head: String = chars.by_ref().take(4).collect();
    if chars.next().is_none() {
        return "****".to_string();
    }
    format!("{head}****")
}

fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> ReplydError {
    ReplydError::storage(e)
}

// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Argon2id key derivation from a passphrase.

use replyd_config::model::VaultConfig;
use replyd_core::ReplydError;
use ring::rand::{SecureRandom, SystemRandom};
use serde_json::json;
use zeroize::Zeroizing;

/// Argon2id cost parameters, persisted next to the wrapped master key so a
/// vault stays unlockable after the configured defaults change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    pub memory_cost: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl From<&VaultConfig> for KdfParams {
    fn from(config: &VaultConfig) -> Self {
        Self {
            memory_cost: config.kdf_memory_cost,
            iterations: config.kdf_iterations,
            parallelism: config.kdf_parallelism,
        }
    }
}

impl KdfParams {
    pub fn to_json_bytes(self) -> Vec<u8> {
        json!({
            "memory_cost": self.memory_cost,
            "iterations": self.iterations,
            "parallelism": self.parallelism,
        })
        .to_string()
        .into_bytes()
    }

    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, ReplydError> {
        let value: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| ReplydError::Vault(format!("corrupted KDF params: {e}")))?;
        let field = |name: &str| -> Result<u32, ReplydError> {
            value[name]
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| ReplydError::Vault(format!("missing {name} in KDF params")))
        };
        Ok(Self {
            memory_cost: field("memory_cost")?,
            iterations: field("iterations")?,
            parallelism: field("parallelism")?,
        })
    }
}

/// Derive a 32-byte key from `passphrase` with Argon2id v0x13.
///
/// The key is zeroed on drop.
pub fn derive_key(
    passphrase: &[u8],
    salt: &[u8; 16],
    params: KdfParams,
) -> Result<Zeroizing<[u8; 32]>, ReplydError> {
    let argon_params = argon2::Params::new(
        params.memory_cost,
        params.iterations,
        params.parallelism,
        Some(32),
    )
    .map_err(|e| ReplydError::Vault(format!("invalid Argon2id parameters: {e}")))?;

    let argon2 = argon2::Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon_params,
    );

    let mut output = Zeroizing::new([0u8; 32]);
    argon2
        .hash_password_into(passphrase, salt, output.as_mut())
        .map_err(|e| ReplydError::Vault(format!("Argon2id key derivation failed: {e}")))?;
    Ok(output)
}

/// Generate a random 16-byte salt.
pub fn generate_salt() -> Result<[u8; 16], ReplydError> {
    let mut salt = [0u8; 16];
    SystemRandom::new()
        .fill(&mut salt)
        .map_err(|_| ReplydError::Vault("failed to generate random salt".to_string()))?;
    Ok(salt)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: KdfParams = KdfParams {
        memory_cost: 32768,
        iterations: 2,
        parallelism: 1,
    };

    #[test]
    fn derivation_is_deterministic() {
        let a = derive_key(b"passphrase", &[1u8; 16], FAST).unwrap();
        let b = derive_key(b"passphrase", &[1u8; 16], FAST).unwrap();
        assert_eq!(*a, *b);
    }

    #[test]
    fn passphrase_and_salt_both_matter() {
        let base = derive_key(b"one", &[1u8; 16], FAST).unwrap();
        assert_ne!(*base, *derive_key(b"two", &[1u8; 16], FAST).unwrap());
        assert_ne!(*base, *derive_key(b"one", &[2u8; 16], FAST).unwrap());
    }

    #[test]
    fn salts_are_random() {
        assert_ne!(generate_salt().unwrap(), generate_salt().unwrap());
    }

    #[test]
    fn params_survive_json() {
        let bytes = FAST.to_json_bytes();
        assert_eq!(KdfParams::from_json_bytes(&bytes).unwrap(), FAST);
        assert!(KdfParams::from_json_bytes(br#"{"memory_cost": 1}"#).is_err());
        assert!(KdfParams::from_json_bytes(b"not json").is_err());
    }

    #[test]
    fn params_follow_config() {
        let params = KdfParams::from(&VaultConfig::default());
        assert_eq!(params.memory_cost, 65536);
        assert_eq!(params.iterations, 3);
        assert_eq!(params.parallelism, 4);
    }
}

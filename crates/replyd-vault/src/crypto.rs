// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Low-level AES-256-GCM seal/open operations.
//!
//! Every call to [`seal`] draws a fresh 96-bit nonce from the system CSPRNG.

use replyd_core::ReplydError;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};

fn aead_key(key: &[u8; 32]) -> Result<LessSafeKey, ReplydError> {
    let unbound = UnboundKey::new(&AES_256_GCM, key)
        .map_err(|_| ReplydError::Vault("failed to create AES-256-GCM key".to_string()))?;
    Ok(LessSafeKey::new(unbound))
}

fn random_bytes<const N: usize>(what: &str) -> Result<[u8; N], ReplydError> {
    let mut bytes = [0u8; N];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| ReplydError::Vault(format!("failed to generate random {what}")))?;
    Ok(bytes)
}

/// Encrypt plaintext with AES-256-GCM under a random nonce.
///
/// Returns `(ciphertext_with_tag, nonce_bytes)`.
pub fn seal(key: &[u8; 32], plaintext: &[u8]) -> Result<(Vec<u8>, [u8; NONCE_LEN]), ReplydError> {
    let key = aead_key(key)?;
    let nonce_bytes = random_bytes::<NONCE_LEN>("nonce")?;

    let mut in_out = plaintext.to_vec();
    key.seal_in_place_append_tag(
        Nonce::assume_unique_for_key(nonce_bytes),
        Aad::empty(),
        &mut in_out,
    )
    .map_err(|_| ReplydError::Vault("AES-256-GCM encryption failed".to_string()))?;

    Ok((in_out, nonce_bytes))
}

/// Decrypt ciphertext produced by [`seal`]. Fails on a wrong key or any
/// tampering.
pub fn open(
    key: &[u8; 32],
    nonce_bytes: &[u8; NONCE_LEN],
    ciphertext: &[u8],
) -> Result<Vec<u8>, ReplydError> {
    let key = aead_key(key)?;
    let mut in_out = ciphertext.to_vec();
    let plaintext = key
        .open_in_place(
            Nonce::assume_unique_for_key(*nonce_bytes),
            Aad::empty(),
            &mut in_out,
        )
        .map_err(|_| {
            ReplydError::Vault(
                "AES-256-GCM decryption failed -- wrong key or corrupted data".to_string(),
            )
        })?;
    Ok(plaintext.to_vec())
}

/// Seal and prepend the nonce: `nonce || ciphertext || tag`.
pub fn seal_combined(key: &[u8; 32], plaintext: &[u8]) -> Result<Vec<u8>, ReplydError> {
    let (ciphertext, nonce) = seal(key, plaintext)?;
    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Inverse of [`seal_combined`].
pub fn open_combined(key: &[u8; 32], sealed: &[u8]) -> Result<Vec<u8>, ReplydError> {
    if sealed.len() < NONCE_LEN {
        return Err(ReplydError::Vault("sealed value is truncated".to_string()));
    }
    let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
    let nonce: [u8; NONCE_LEN] = nonce
        .try_into()
        .map_err(|_| ReplydError::Vault("sealed value is truncated".to_string()))?;
    open(key, &nonce, ciphertext)
}

/// Generate a random 32-byte key suitable for AES-256-GCM.
pub fn generate_random_key() -> Result<[u8; 32], ReplydError> {
    random_bytes::<32>("key")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_roundtrip() {
        let key = generate_random_key().unwrap();
        let (ciphertext, nonce) = seal(&key, b"owner@example.com:hunter2").unwrap();
        assert_eq!(open(&key, &nonce, &ciphertext).unwrap(), b"owner@example.com:hunter2");
    }

    #[test]
    fn same_plaintext_seals_differently() {
        let key = generate_random_key().unwrap();
        let a = seal_combined(&key, b"same").unwrap();
        let b = seal_combined(&key, b"same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn open_with_wrong_key_fails() {
        let sealed = seal_combined(&generate_random_key().unwrap(), b"secret").unwrap();
        assert!(open_combined(&generate_random_key().unwrap(), &sealed).is_err());
    }

    #[test]
    fn combined_layout_is_nonce_then_ciphertext_and_tag() {
        let key = generate_random_key().unwrap();
        let sealed = seal_combined(&key, b"hello").unwrap();
        assert_eq!(sealed.len(), NONCE_LEN + 5 + 16);
        assert_eq!(open_combined(&key, &sealed).unwrap(), b"hello");
    }

    #[test]
    fn tampered_or_truncated_input_fails() {
        let key = generate_random_key().unwrap();
        let mut sealed = seal_combined(&key, b"do not tamper").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        assert!(open_combined(&key, &sealed).is_err());
        assert!(open_combined(&key, &sealed[..4]).is_err());
    }
}

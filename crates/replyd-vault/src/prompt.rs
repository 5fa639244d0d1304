// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Passphrase acquisition via TTY prompt or the REPLYD_VAULT_KEY environment variable.

use std::io::IsTerminal;

use replyd_core::ReplydError;
use secrecy::SecretString;

/// The environment variable name for providing the vault passphrase.
pub const VAULT_KEY_ENV_VAR: &str = "REPLYD_VAULT_KEY";

/// Get the vault passphrase.
///
/// `REPLYD_VAULT_KEY` wins (for systemd and containers); otherwise an
/// interactive prompt is shown when stdin is a terminal. `confirm` asks twice,
/// for vault creation.
pub fn get_vault_passphrase(confirm: bool) -> Result<SecretString, ReplydError> {
    if let Ok(key) = std::env::var(VAULT_KEY_ENV_VAR) {
        if !key.is_empty() {
            return Ok(SecretString::from(key));
        }
    }

    if !std::io::stdin().is_terminal() {
        return Err(ReplydError::Vault(format!(
            "no passphrase provided -- set {VAULT_KEY_ENV_VAR} or run interactively"
        )));
    }

    let first = read_password(if confirm {
        "New vault passphrase: "
    } else {
        "Vault passphrase: "
    })?;
    if first.is_empty() {
        return Err(ReplydError::Vault("empty passphrase not allowed".to_string()));
    }
    if confirm && read_password("Confirm vault passphrase: ")? != first {
        return Err(ReplydError::Vault("passphrases do not match".to_string()));
    }
    Ok(SecretString::from(first))
}

fn read_password(prompt: &str) -> Result<String, ReplydError> {
    rpassword::prompt_password(prompt)
        .map_err(|e| ReplydError::Vault(format!("failed to read passphrase: {e}")))
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;
    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn passphrase_from_env_var() {
        // SAFETY: env mutation is serialized across tests by `serial`.
        unsafe { std::env::set_var(VAULT_KEY_ENV_VAR, "test-passphrase") };
        let result = get_vault_passphrase(true);
        unsafe { std::env::remove_var(VAULT_KEY_ENV_VAR) };

        assert_eq!(result.unwrap().expose_secret(), "test-passphrase");
    }

    #[test]
    #[serial]
    fn empty_env_var_without_tty_is_rejected() {
        unsafe { std::env::set_var(VAULT_KEY_ENV_VAR, "") };
        // Test stdin is not a terminal.
        let result = get_vault_passphrase(false);
        unsafe { std::env::remove_var(VAULT_KEY_ENV_VAR) };

        assert!(matches!(result, Err(ReplydError::Vault(msg)) if msg.contains(VAULT_KEY_ENV_VAR)));
    }
}

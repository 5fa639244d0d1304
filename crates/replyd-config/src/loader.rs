// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./replyd.toml` > `~/.config/replyd/replyd.toml` > `/etc/replyd/replyd.toml`
//! with environment variable overrides via `REPLYD_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::ReplydConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/replyd/replyd.toml` (system-wide)
/// 3. `~/.config/replyd/replyd.toml` (user XDG config)
/// 4. `./replyd.toml` (local directory)
/// 5. `REPLYD_*` environment variables
pub fn load_config() -> Result<ReplydConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<ReplydConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ReplydConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ReplydConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ReplydConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ReplydConfig::default()))
        .merge(Toml::file("/etc/replyd/replyd.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("replyd/replyd.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("replyd.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `REPLYD_SYNC_INTERVAL_SECS` must map to `sync.interval_secs`,
/// not `sync.interval.secs`.
/// `REPLYD_VAULT_KEY` is the vault passphrase, not a config key, and is skipped.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("REPLYD_")
        .ignore(&["vault_key"])
        .map(|key| {
            let mapped = key
                .as_str()
                .to_ascii_lowercase()
                .replacen("service_", "service.", 1)
                .replacen("storage_", "storage.", 1)
                .replacen("vault_", "vault.", 1)
                .replacen("sync_", "sync.", 1)
                .replacen("dispatch_", "dispatch.", 1)
                .replacen("connectors_mock_", "connectors.mock.", 1)
                .replacen("connectors_", "connectors.", 1);
            mapped.into()
        })
}

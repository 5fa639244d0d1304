// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde attributes cannot express: non-empty paths,
//! positive intervals and concurrency limits, probability ranges, and KDF
//! minimums.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::ReplydConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ReplydConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let level = config.service.log_level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        fail(format!(
            "service.log_level `{}` must be one of {}",
            config.service.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.vault.kdf_memory_cost < 32768 {
        fail(format!(
            "vault.kdf_memory_cost must be at least 32768 (32 MiB), got {}",
            config.vault.kdf_memory_cost
        ));
    }
    if config.vault.kdf_iterations < 2 {
        fail(format!(
            "vault.kdf_iterations must be at least 2, got {}",
            config.vault.kdf_iterations
        ));
    }
    if config.vault.kdf_parallelism < 1 {
        fail(format!(
            "vault.kdf_parallelism must be at least 1, got {}",
            config.vault.kdf_parallelism
        ));
    }

    if config.sync.interval_secs == 0 {
        fail("sync.interval_secs must be at least 1".to_string());
    }
    if config.sync.max_concurrency == 0 {
        fail("sync.max_concurrency must be at least 1".to_string());
    }
    if !(-12..=14).contains(&config.sync.timezone_offset_hours) {
        fail(format!(
            "sync.timezone_offset_hours must be within -12..=14, got {}",
            config.sync.timezone_offset_hours
        ));
    }

    if config.dispatch.interval_secs == 0 {
        fail("dispatch.interval_secs must be at least 1".to_string());
    }
    if config.dispatch.max_concurrency == 0 {
        fail("dispatch.max_concurrency must be at least 1".to_string());
    }
    if config.dispatch.claim_ttl_secs == 0 {
        fail("dispatch.claim_ttl_secs must be at least 1".to_string());
    }
    if config.dispatch.batch_limit == 0 {
        fail("dispatch.batch_limit must be at least 1".to_string());
    }

    if config.connectors.timeout_secs == 0 {
        fail("connectors.timeout_secs must be at least 1".to_string());
    }
    if config.dispatch.claim_ttl_secs <= config.connectors.timeout_secs {
        fail(format!(
            "dispatch.claim_ttl_secs ({}) must exceed connectors.timeout_secs ({})",
            config.dispatch.claim_ttl_secs, config.connectors.timeout_secs
        ));
    }
    let rate = config.connectors.mock.failure_rate;
    if !(0.0..=1.0).contains(&rate) {
        fail(format!(
            "connectors.mock.failure_rate must be within 0.0..=1.0, got {rate}"
        ));
    }

    let mut seen = HashSet::new();
    for platform in &config.connectors.enabled_platforms {
        if platform.trim().is_empty() {
            fail("connectors.enabled_platforms must not contain empty names".to_string());
        } else if !seen.insert(platform.as_str()) {
            fail(format!(
                "duplicate platform `{platform}` in connectors.enabled_platforms"
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for replyd.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level replyd configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReplydConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Credential vault settings.
    #[serde(default)]
    pub vault: VaultConfig,

    /// Review synchronization schedule.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Reply dispatch schedule.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Platform connector settings.
    #[serde(default)]
    pub connectors: ConnectorsConfig,
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name used in log lines.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "replyd".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("replyd").join("replyd.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("replyd.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

/// Credential vault configuration.
///
/// Controls Argon2id key derivation parameters used to protect the vault
/// master key. Defaults follow OWASP recommendations.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Argon2id memory cost in KiB (default: 65536 = 64 MiB).
    #[serde(default = "default_kdf_memory_cost")]
    pub kdf_memory_cost: u32,

    /// Argon2id iteration count (default: 3).
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,

    /// Argon2id parallelism lanes (default: 4).
    #[serde(default = "default_kdf_parallelism")]
    pub kdf_parallelism: u32,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            kdf_memory_cost: default_kdf_memory_cost(),
            kdf_iterations: default_kdf_iterations(),
            kdf_parallelism: default_kdf_parallelism(),
        }
    }
}

fn default_kdf_memory_cost() -> u32 {
    65536 // 64 MiB per OWASP recommendation
}

fn default_kdf_iterations() -> u32 {
    3
}

fn default_kdf_parallelism() -> u32 {
    4
}

/// Review synchronization configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Run the periodic sync task under `replyd serve`.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds between sync passes.
    #[serde(default = "default_sync_interval_secs")]
    pub interval_secs: u64,

    /// Accounts synchronized concurrently within one pass.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// UTC offset applied to upstream timestamps that carry no zone.
    #[serde(default = "default_timezone_offset_hours")]
    pub timezone_offset_hours: i32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_sync_interval_secs(),
            max_concurrency: default_max_concurrency(),
            timezone_offset_hours: default_timezone_offset_hours(),
        }
    }
}

impl SyncConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

fn default_true() -> bool {
    true
}

fn default_sync_interval_secs() -> u64 {
    300
}

fn default_max_concurrency() -> usize {
    4
}

fn default_timezone_offset_hours() -> i32 {
    9 // Asia/Seoul
}

/// Reply dispatch configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Run the periodic dispatch task under `replyd serve`.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds between dispatch passes.
    #[serde(default = "default_dispatch_interval_secs")]
    pub interval_secs: u64,

    /// Jobs posted concurrently within one pass.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Seconds a claim stays valid. A pass that dies mid-flight leaves its
    /// jobs claimable again after this long.
    #[serde(default = "default_claim_ttl_secs")]
    pub claim_ttl_secs: u64,

    /// Maximum jobs claimed per pass.
    #[serde(default = "default_batch_limit")]
    pub batch_limit: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_dispatch_interval_secs(),
            max_concurrency: default_max_concurrency(),
            claim_ttl_secs: default_claim_ttl_secs(),
            batch_limit: default_batch_limit(),
        }
    }
}

impl DispatchConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

fn default_dispatch_interval_secs() -> u64 {
    30
}

fn default_claim_ttl_secs() -> u64 {
    300
}

fn default_batch_limit() -> usize {
    100
}

/// Platform connector configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectorsConfig {
    /// Upper bound on any single connector call, in seconds.
    #[serde(default = "default_connector_timeout_secs")]
    pub timeout_secs: u64,

    /// Platforms whose connectors are registered at startup.
    #[serde(default = "default_enabled_platforms")]
    pub enabled_platforms: Vec<String>,

    /// Simulated connector settings.
    #[serde(default)]
    pub mock: MockConnectorConfig,
}

impl Default for ConnectorsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_connector_timeout_secs(),
            enabled_platforms: default_enabled_platforms(),
            mock: MockConnectorConfig::default(),
        }
    }
}

impl ConnectorsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_connector_timeout_secs() -> u64 {
    30
}

fn default_enabled_platforms() -> Vec<String> {
    vec!["mock".to_string()]
}

/// Settings for the simulated `mock` platform.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MockConnectorConfig {
    /// Probability (0.0-1.0) that a simulated post fails.
    #[serde(default = "default_failure_rate")]
    pub failure_rate: f64,

    /// Reviews reported per account on every listing.
    #[serde(default = "default_reviews_per_account")]
    pub reviews_per_account: usize,
}

impl Default for MockConnectorConfig {
    fn default() -> Self {
        Self {
            failure_rate: default_failure_rate(),
            reviews_per_account: default_reviews_per_account(),
        }
    }
}

fn default_failure_rate() -> f64 {
    0.25
}

fn default_reviews_per_account() -> usize {
    5
}

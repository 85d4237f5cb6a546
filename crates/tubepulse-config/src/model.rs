// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Tubepulse configuration.
///
/// Every section is optional and falls back to its defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TubepulseConfig {
    /// Outbound calls to the video platform.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Per-identity daily quota.
    #[serde(default)]
    pub quota: QuotaConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Outbound call tunables.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Maximum number of upstream calls in flight at once.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Deadline applied by callers around one upstream call.
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    /// Total attempts for retried operations, including the first.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Fixed delay between retry attempts.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            call_timeout_secs: default_call_timeout_secs(),
            retry_attempts: default_retry_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_max_concurrent() -> usize {
    5
}

fn default_call_timeout_secs() -> u64 {
    15
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    500
}

/// Daily quota configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QuotaConfig {
    /// Limit given to accounts recreated during recovery.
    #[serde(default = "default_daily_limit")]
    pub default_daily_limit: i64,

    /// Offset of the reference timezone whose midnight starts a new quota day.
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,

    /// Days of usage history kept before purge.
    #[serde(default = "default_usage_retention_days")]
    pub usage_retention_days: u32,

    /// Fraction of the limit at which a warning is logged.
    #[serde(default = "default_warn_ratio")]
    pub warn_ratio: f64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            default_daily_limit: default_daily_limit(),
            utc_offset_hours: default_utc_offset_hours(),
            usage_retention_days: default_usage_retention_days(),
            warn_ratio: default_warn_ratio(),
        }
    }
}

fn default_daily_limit() -> i64 {
    100
}

fn default_utc_offset_hours() -> i32 {
    9
}

fn default_usage_retention_days() -> u32 {
    90
}

fn default_warn_ratio() -> f64 {
    0.8
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// How long a writer waits on a lock held by another process.
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
        .map(|p| p.join("tubepulse").join("tubepulse.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("tubepulse.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

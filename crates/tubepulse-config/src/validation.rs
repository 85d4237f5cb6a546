// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::TubepulseConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first.
pub fn validate_config(config: &TubepulseConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.upstream.max_concurrent == 0 {
        fail("upstream.max_concurrent must be at least 1".to_string());
    }

    if config.upstream.call_timeout_secs == 0 {
        fail("upstream.call_timeout_secs must be at least 1".to_string());
    }

    if config.upstream.retry_attempts == 0 {
        fail("upstream.retry_attempts must be at least 1".to_string());
    }

    if config.quota.default_daily_limit < 0 {
        fail(format!(
            "quota.default_daily_limit must be non-negative, got {}",
            config.quota.default_daily_limit
        ));
    }

    if !(-12..=14).contains(&config.quota.utc_offset_hours) {
        fail(format!(
            "quota.utc_offset_hours must be between -12 and 14, got {}",
            config.quota.utc_offset_hours
        ));
    }

    let ratio = config.quota.warn_ratio;
    if !(ratio > 0.0 && ratio <= 1.0) {
        fail(format!("quota.warn_ratio must be in (0, 1], got {ratio}"));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        fail(format!(
            "logging.level `{}` is not one of {}",
            config.logging.level,
            LOG_LEVELS.join(", ")
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_passes() {
        assert!(validate_config(&TubepulseConfig::default()).is_ok());
    }

    #[test]
    fn zero_concurrency_fails() {
        let mut config = TubepulseConfig::default();
        config.upstream.max_concurrent = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "max_concurrent"));
    }

    #[test]
    fn collects_all_errors() {
        let mut config = TubepulseConfig::default();
        config.quota.default_daily_limit = -1;
        config.quota.utc_offset_hours = 20;
        config.quota.warn_ratio = 0.0;
        config.storage.database_path = "  ".to_string();
        config.logging.level = "loud".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(has_message(&errors, "default_daily_limit"));
        assert!(has_message(&errors, "utc_offset_hours"));
        assert!(has_message(&errors, "warn_ratio"));
        assert!(has_message(&errors, "database_path"));
        assert!(has_message(&errors, "logging.level"));
    }

    #[test]
    fn log_level_is_case_insensitive() {
        let mut config = TubepulseConfig::default();
        config.logging.level = "DEBUG".to_string();
        assert!(validate_config(&config).is_ok());
    }
}

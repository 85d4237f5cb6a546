// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for Tubepulse.

use thiserror::Error;

/// The primary error type used across all Tubepulse adapter traits and core operations.
#[derive(Debug, Error)]
pub enum TubepulseError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Upstream video platform errors (transport failure, non-success status, bad payload).
    #[error("upstream error: {message}")]
    Upstream {
        message: String,
        /// HTTP-like status code reported by the upstream, when there was one.
        status: Option<u16>,
        /// The upstream refused the call for rate or quota reasons.
        rate_limited: bool,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Requested adapter was not found.
    #[error("adapter not found: {adapter_type}/{name}")]
    AdapterNotFound { adapter_type: String, name: String },

    /// Adapter health check failed.
    #[error("health check failed for {name}: {source}")]
    HealthCheckFailed {
        name: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Reasons the platform gives in 403 bodies when a quota or rate limit is hit.
const QUOTA_REASONS: &[&str] = &[
    "quotaExceeded",
    "rateLimitExceeded",
    "dailyLimitExceeded",
];

impl TubepulseError {
    /// Shorthand for an upstream failure with a status code and no source.
    ///
    /// A 429, or a 403 whose message carries a quota reason such as
    /// `quotaExceeded`, is flagged as rate limited.
    pub fn upstream(message: impl Into<String>, status: Option<u16>) -> Self {
        let message = message.into();
        let rate_limited = match status {
            Some(429) => true,
            Some(403) => QUOTA_REASONS.iter().any(|reason| message.contains(reason)),
            _ => false,
        };
        Self::Upstream {
            message,
            status,
            rate_limited,
            source: None,
        }
    }

    /// An upstream failure the client already knows to be a rate or quota refusal.
    pub fn rate_limited(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Upstream {
            message: message.into(),
            status,
            rate_limited: true,
            source: None,
        }
    }

    /// Status code attached to an upstream failure, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => *status,
            _ => None,
        }
    }

    /// True when the upstream rejected the call for rate or quota reasons.
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            Self::Upstream {
                rate_limited: true,
                ..
            }
        )
    }

    /// Whether retrying the same operation may succeed.
    ///
    /// Storage errors, timeouts, rate-limited and 5xx upstream responses are
    /// transient; other upstream 4xx responses and configuration errors are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Storage { .. } | Self::Timeout { .. } => true,
            Self::Upstream {
                rate_limited: true, ..
            } => true,
            Self::Upstream { status, .. } => match status {
                Some(code) => *code == 429 || *code >= 500,
                None => true,
            },
            _ => false,
        }
    }
}

// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical data model shared across Tubepulse crates.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Sentinel `limit` reported when the identity's account cannot be resolved.
pub const UNRESOLVABLE_LIMIT: i64 = -1;

/// Sentinel `limit` reported for inactive or banned accounts.
pub const BLOCKED_LIMIT: i64 = 0;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "lowercase")]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Upstream,
    Observability,
}

/// What a search result represents.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum VideoKind {
    /// Regular long-form upload.
    #[default]
    Video,
    /// Short-form vertical upload.
    Short,
    /// A channel appearing in search results.
    Channel,
}

/// A video (or channel result) in canonical form.
///
/// Produced by the normalizer; every field has a neutral default so a
/// degraded upstream record still yields a value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: String,
    pub channel_id: String,
    pub channel_title: String,
    /// Absolute publish time. `None` when neither an absolute nor a relative date parsed.
    pub published_at: Option<DateTime<Utc>>,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    /// ISO-8601 duration such as `PT4M13S`. Empty means unknown, not zero.
    pub duration: String,
    pub subscriber_count: u64,
    pub thumbnail_url: String,
    pub keywords: BTreeSet<String>,
    pub kind: VideoKind,
    /// Only populated for channel results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_count: Option<u64>,
}

/// Channel details in canonical form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInfo {
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub subscriber_count: u64,
    pub video_count: u64,
    pub thumbnail_url: String,
    pub banner_url: String,
    pub country: Option<String>,
    pub verified: bool,
    pub handle: String,
}

/// Quota-relevant slice of an identity's account record.
///
/// Owned by the account subsystem. The quota tracker only writes
/// `remaining_today` and `last_reset_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountQuota {
    pub identity: String,
    pub daily_limit: i64,
    pub is_active: bool,
    pub is_banned: bool,
    pub last_reset_date: Option<NaiveDate>,
    /// Denormalized remaining count for fast display reads.
    pub remaining_today: Option<i64>,
}

impl AccountQuota {
    /// A fresh, active account with the given limit.
    pub fn new(identity: impl Into<String>, daily_limit: i64) -> Self {
        Self {
            identity: identity.into(),
            daily_limit,
            is_active: true,
            is_banned: false,
            last_reset_date: None,
            remaining_today: None,
        }
    }

    /// Inactive or banned accounts may not make metered calls.
    pub fn is_blocked(&self) -> bool {
        !self.is_active || self.is_banned
    }
}

/// One labelled metered call within a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEntry {
    pub label: String,
    pub recorded_at: DateTime<Utc>,
}

/// Usage of one identity on one calendar day. Unique per `(identity, day)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub identity: String,
    pub day: NaiveDate,
    /// Number of metered calls; never negative.
    pub count: i64,
    /// Labelled calls in recording order.
    pub entries: Vec<UsageEntry>,
}

/// Result of a quota check or increment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaStatus {
    pub allowed: bool,
    pub used: i64,
    /// Daily limit, or one of the sentinels [`UNRESOLVABLE_LIMIT`] / [`BLOCKED_LIMIT`].
    pub limit: i64,
    pub remaining: i64,
    /// Start of the next quota day.
    pub reset_time: DateTime<Utc>,
}

impl QuotaStatus {
    /// Status computed from counters for an active account.
    pub fn from_usage(used: i64, limit: i64, reset_time: DateTime<Utc>) -> Self {
        Self {
            allowed: used < limit,
            used,
            limit,
            remaining: (limit - used).max(0),
            reset_time,
        }
    }

    /// The account could not be found or recreated.
    pub fn unresolvable(reset_time: DateTime<Utc>) -> Self {
        Self {
            allowed: false,
            used: 0,
            limit: UNRESOLVABLE_LIMIT,
            remaining: 0,
            reset_time,
        }
    }

    /// The account is inactive or banned.
    pub fn blocked(used: i64, reset_time: DateTime<Utc>) -> Self {
        Self {
            allowed: false,
            used,
            limit: BLOCKED_LIMIT,
            remaining: 0,
            reset_time,
        }
    }

    /// Classify this status into a caller-visible outcome.
    ///
    /// An active account configured with a zero limit reports as blocked,
    /// since the zero limit doubles as the blocked sentinel.
    pub fn outcome(&self) -> QuotaOutcome {
        if self.limit == UNRESOLVABLE_LIMIT {
            QuotaOutcome::Unresolvable
        } else if self.limit <= BLOCKED_LIMIT {
            QuotaOutcome::Blocked
        } else if self.allowed {
            QuotaOutcome::Allowed
        } else {
            QuotaOutcome::Exhausted
        }
    }
}

/// Distinct caller-visible quota outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QuotaOutcome {
    Allowed,
    /// Daily limit reached; retry after the reset time.
    Exhausted,
    /// Account inactive or banned; contact an administrator.
    Blocked,
    /// Account record missing and could not be recreated; re-authenticate.
    Unresolvable,
}

impl QuotaOutcome {
    /// Message suitable for end users.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Allowed => "Request allowed.",
            Self::Exhausted => "Daily search quota used up. It resets tomorrow.",
            Self::Blocked => "This account is disabled. Please contact an administrator.",
            Self::Unresolvable => "Your session could not be verified. Please sign in again.",
        }
    }

    /// HTTP status a web layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Allowed => 200,
            Self::Exhausted => 429,
            Self::Blocked => 403,
            Self::Unresolvable => 401,
        }
    }
}

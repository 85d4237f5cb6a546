// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-identity daily quota with atomic increments.
//!
//! Policy outcomes (exhausted, blocked, unresolvable) are returned as
//! [`QuotaStatus`] values carrying sentinels, never as errors. Errors mean the
//! backing store could not be trusted for this call. Writes that only serve
//! display purposes (remaining count, last reset day) are best-effort and log
//! a warning on failure.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Days, Utc};
use tracing::{debug, info, warn};
use tubepulse_config::model::QuotaConfig;
use tubepulse_core::{
    AccountQuota, AccountStore, QuotaStatus, TubepulseError, UsageRecord, UsageStore,
};
use tubepulse_resilience::{RetryPolicy, retry};

use crate::calendar::QuotaCalendar;

/// Attempts at recreating a missing account record.
const RECOVERY_ATTEMPTS: u32 = 3;

/// Pause between recovery attempts.
const RECOVERY_BACKOFF: Duration = Duration::from_millis(200);

/// Daily quota tracker over an account store and a usage store.
pub struct QuotaTracker {
    accounts: Arc<dyn AccountStore>,
    usage: Arc<dyn UsageStore>,
    calendar: QuotaCalendar,
    default_daily_limit: i64,
    warn_ratio: f64,
    retention_days: u32,
    recovery: RetryPolicy,
}

impl QuotaTracker {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        usage: Arc<dyn UsageStore>,
        config: &QuotaConfig,
    ) -> Result<Self, TubepulseError> {
        Ok(Self {
            accounts,
            usage,
            calendar: QuotaCalendar::new(config.utc_offset_hours)?,
            default_daily_limit: config.default_daily_limit,
            warn_ratio: config.warn_ratio,
            retention_days: config.usage_retention_days,
            recovery: RetryPolicy::new(RECOVERY_ATTEMPTS, RECOVERY_BACKOFF),
        })
    }

    /// Replace the retry policy used when recreating missing accounts.
    pub fn with_recovery_policy(mut self, policy: RetryPolicy) -> Self {
        self.recovery = policy;
        self
    }

    pub fn calendar(&self) -> QuotaCalendar {
        self.calendar
    }

    /// Whether `identity` may make another metered call now.
    pub async fn check(&self, identity: &str) -> Result<QuotaStatus, TubepulseError> {
        self.check_at(identity, Utc::now()).await
    }

    /// [`check`](Self::check) as of `now`.
    pub async fn check_at(
        &self,
        identity: &str,
        now: DateTime<Utc>,
    ) -> Result<QuotaStatus, TubepulseError> {
        let today = self.calendar.day_of(now);
        let reset_time = self.calendar.next_reset(now);

        let Some(account) = self.resolve_account(identity).await? else {
            warn!(identity, "quota identity unresolvable");
            return Ok(QuotaStatus::unresolvable(reset_time));
        };
        if account.is_blocked() {
            debug!(
                identity,
                is_active = account.is_active,
                is_banned = account.is_banned,
                "quota check on blocked account"
            );
            return Ok(QuotaStatus::blocked(0, reset_time));
        }

        let used = self
            .usage
            .get_usage(identity, today)
            .await?
            .map_or(0, |record| record.count);

        if account.last_reset_date != Some(today) {
            if let Err(e) = self.accounts.mark_reset(identity, today).await {
                warn!(identity, error = %e, "failed to record quota day rollover");
            }
        }

        let status = QuotaStatus::from_usage(used, account.daily_limit, reset_time);
        self.warn_if_near_limit(identity, &status);
        Ok(status)
    }

    /// Count one metered call for `identity`, optionally labelled.
    pub async fn increment(
        &self,
        identity: &str,
        label: Option<&str>,
    ) -> Result<QuotaStatus, TubepulseError> {
        self.increment_at(identity, label, Utc::now()).await
    }

    /// [`increment`](Self::increment) as of `now`.
    ///
    /// The counter update itself is atomic in the usage store and its failure
    /// is returned. Storing the remaining count on the account afterwards is
    /// best-effort.
    pub async fn increment_at(
        &self,
        identity: &str,
        label: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<QuotaStatus, TubepulseError> {
        let today = self.calendar.day_of(now);
        let reset_time = self.calendar.next_reset(now);

        let record = self.usage.increment_usage(identity, today, label, now).await?;
        debug!(identity, day = %today, count = record.count, "quota usage incremented");

        let account = match self.accounts.get_account(identity).await {
            Ok(account) => account,
            Err(e) => {
                warn!(identity, error = %e, "failed to read account after increment");
                None
            }
        };

        let Some(account) = account else {
            return Ok(QuotaStatus::from_usage(
                record.count,
                self.default_daily_limit,
                reset_time,
            ));
        };
        if account.is_blocked() {
            return Ok(QuotaStatus::blocked(record.count, reset_time));
        }

        let status = QuotaStatus::from_usage(record.count, account.daily_limit, reset_time);
        if let Err(e) = self.accounts.set_remaining(identity, status.remaining).await {
            warn!(identity, error = %e, "failed to store remaining quota");
        }
        self.warn_if_near_limit(identity, &status);
        Ok(status)
    }

    /// Usage for the last `days` quota days including today, oldest first.
    pub async fn history(
        &self,
        identity: &str,
        days: u32,
    ) -> Result<Vec<UsageRecord>, TubepulseError> {
        self.history_at(identity, days, Utc::now()).await
    }

    /// [`history`](Self::history) as of `now`.
    pub async fn history_at(
        &self,
        identity: &str,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<UsageRecord>, TubepulseError> {
        if days == 0 {
            return Ok(Vec::new());
        }
        let to = self.calendar.day_of(now);
        let from = to
            .checked_sub_days(Days::new(u64::from(days - 1)))
            .unwrap_or(chrono::NaiveDate::MIN);
        self.usage.usage_history(identity, from, to).await
    }

    /// Drop usage records older than the retention window.
    pub async fn purge_expired(&self) -> Result<u64, TubepulseError> {
        self.purge_expired_at(Utc::now()).await
    }

    /// [`purge_expired`](Self::purge_expired) as of `now`.
    pub async fn purge_expired_at(&self, now: DateTime<Utc>) -> Result<u64, TubepulseError> {
        let today = self.calendar.day_of(now);
        let Some(cutoff) = today.checked_sub_days(Days::new(u64::from(self.retention_days))) else {
            return Ok(0);
        };
        let removed = self.usage.purge_usage_before(cutoff).await?;
        if removed > 0 {
            info!(removed, cutoff = %cutoff, "purged expired usage records");
        }
        Ok(removed)
    }

    /// Read the account, recreating it once with the default limit if missing.
    ///
    /// `Ok(None)` means the identity could not be resolved. A failed first read
    /// is an error.
    async fn resolve_account(&self, identity: &str) -> Result<Option<AccountQuota>, TubepulseError> {
        if identity.trim().is_empty() {
            return Ok(None);
        }
        if let Some(account) = self.accounts.get_account(identity).await? {
            return Ok(Some(account));
        }

        info!(identity, limit = self.default_daily_limit, "account record missing, recreating");
        let fresh = AccountQuota::new(identity, self.default_daily_limit);
        let recreated = retry(&self.recovery, "account recovery", || {
            self.accounts.upsert_account(&fresh)
        })
        .await;
        if let Err(e) = recreated {
            warn!(identity, error = %e, "account recovery failed");
            return Ok(None);
        }

        match self.accounts.get_account(identity).await {
            Ok(account) => Ok(account),
            Err(e) => {
                warn!(identity, error = %e, "account unreadable after recovery");
                Ok(None)
            }
        }
    }

    fn warn_if_near_limit(&self, identity: &str, status: &QuotaStatus) {
        if status.limit <= 0 {
            return;
        }
        let threshold = status.limit as f64 * self.warn_ratio;
        if status.used >= status.limit {
            debug!(identity, used = status.used, limit = status.limit, "daily quota exhausted");
        } else if status.used as f64 >= threshold {
            warn!(
                identity,
                used = status.used,
                limit = status.limit,
                "approaching daily quota ({:.0}%+)",
                self.warn_ratio * 100.0
            );
        }
    }
}

// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence traits consumed by the quota tracker.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::TubepulseError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{AccountQuota, UsageRecord};

/// Lifecycle of a storage backend.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Opens the backend (connection, migrations).
    async fn initialize(&self) -> Result<(), TubepulseError>;

    /// Flushes pending writes and releases the connection.
    async fn close(&self) -> Result<(), TubepulseError>;
}

/// Read and narrow write access to identity account records.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Read one account by identity.
    async fn get_account(&self, identity: &str) -> Result<Option<AccountQuota>, TubepulseError>;

    /// Insert or replace the quota fields of an account.
    async fn upsert_account(&self, account: &AccountQuota) -> Result<(), TubepulseError>;

    /// Store the denormalized remaining count.
    async fn set_remaining(&self, identity: &str, remaining: i64) -> Result<(), TubepulseError>;

    /// Record the quota day the account was last seen rolling over.
    async fn mark_reset(&self, identity: &str, day: NaiveDate) -> Result<(), TubepulseError>;
}

/// Per-identity, per-day usage counters.
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Atomically create-or-increment the `(identity, day)` counter and append
    /// `label` to the day's log. Returns the record after the increment.
    ///
    /// Two concurrent calls for the same key must never observe the same
    /// pre-increment count.
    async fn increment_usage(
        &self,
        identity: &str,
        day: NaiveDate,
        label: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<UsageRecord, TubepulseError>;

    /// Read the usage record for one day, if any call was made.
    async fn get_usage(
        &self,
        identity: &str,
        day: NaiveDate,
    ) -> Result<Option<UsageRecord>, TubepulseError>;

    /// Records for `identity` between `from` and `to` inclusive, oldest first.
    async fn usage_history(
        &self,
        identity: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<UsageRecord>, TubepulseError>;

    /// Delete every record older than `day`. Returns the number of day records removed.
    async fn purge_usage_before(&self, day: NaiveDate) -> Result<u64, TubepulseError>;
}

// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a gateway over a temp SQLite database and a
//! [`MockUpstream`], and exposes each piece for assertions.

use std::sync::Arc;
use std::time::Duration;

use tubepulse_config::model::{StorageConfig, TubepulseConfig};
use tubepulse_core::{
    AccountQuota, AccountStore, ChannelInfo, StorageAdapter, TubepulseError, Video,
};
use tubepulse_gateway::{GatedCall, Gateway};
use tubepulse_quota::QuotaTracker;
use tubepulse_storage::SqliteStorage;

use crate::mock_upstream::{MockUpstream, Reply};

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    accounts: Vec<AccountQuota>,
    replies: Vec<Reply>,
    max_concurrent: Option<usize>,
    upstream_latency: Duration,
    default_daily_limit: Option<i64>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            accounts: Vec::new(),
            replies: Vec::new(),
            max_concurrent: None,
            upstream_latency: Duration::ZERO,
            default_daily_limit: None,
        }
    }

    /// Seed an active account with the given daily limit.
    pub fn with_account(self, identity: &str, daily_limit: i64) -> Self {
        self.with_account_record(AccountQuota::new(identity, daily_limit))
    }

    /// Seed an arbitrary account record.
    pub fn with_account_record(mut self, account: AccountQuota) -> Self {
        self.accounts.push(account);
        self
    }

    /// Set mock upstream replies.
    pub fn with_replies(mut self, replies: Vec<Reply>) -> Self {
        self.replies = replies;
        self
    }

    pub fn with_max_concurrent(mut self, limit: usize) -> Self {
        self.max_concurrent = Some(limit);
        self
    }

    pub fn with_upstream_latency(mut self, latency: Duration) -> Self {
        self.upstream_latency = latency;
        self
    }

    /// Limit given to accounts recreated on first use.
    pub fn with_default_daily_limit(mut self, limit: i64) -> Self {
        self.default_daily_limit = Some(limit);
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, TubepulseError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| TubepulseError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let mut config = TubepulseConfig {
            storage: StorageConfig {
                database_path: db_path.to_string_lossy().to_string(),
                ..StorageConfig::default()
            },
            ..TubepulseConfig::default()
        };
        config.upstream.retry_backoff_ms = 0;
        if let Some(limit) = self.max_concurrent {
            config.upstream.max_concurrent = limit;
        }
        if let Some(limit) = self.default_daily_limit {
            config.quota.default_daily_limit = limit;
        }

        let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
        storage.initialize().await?;
        for account in &self.accounts {
            storage.upsert_account(account).await?;
        }

        let quota = Arc::new(QuotaTracker::new(
            storage.clone(),
            storage.clone(),
            &config.quota,
        )?);
        let gateway = Gateway::new(&config.upstream, quota);
        let upstream =
            Arc::new(MockUpstream::with_replies(self.replies).with_latency(self.upstream_latency));

        Ok(TestHarness {
            gateway: Arc::new(gateway),
            upstream,
            storage,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with a mock upstream and temp storage.
pub struct TestHarness {
    pub gateway: Arc<Gateway>,
    pub upstream: Arc<MockUpstream>,
    /// SQLite storage (temp DB, cleaned up on drop).
    pub storage: Arc<SqliteStorage>,
    pub config: TubepulseConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Quota-gated search through the mock upstream.
    pub async fn search(
        &self,
        identity: &str,
        query: &str,
    ) -> Result<GatedCall<Vec<Video>>, TubepulseError> {
        self.gateway
            .search(self.upstream.as_ref(), identity, query)
            .await
    }

    /// Quota-gated channel lookup through the mock upstream.
    pub async fn channel(
        &self,
        identity: &str,
        channel_id: &str,
    ) -> Result<GatedCall<ChannelInfo>, TubepulseError> {
        self.gateway
            .channel(self.upstream.as_ref(), identity, channel_id)
            .await
    }

    /// Wait for background quota increments to land.
    pub async fn flush(&self) {
        self.gateway.shutdown().await;
    }

    pub async fn account(&self, identity: &str) -> Result<Option<AccountQuota>, TubepulseError> {
        self.storage.get_account(identity).await
    }
}

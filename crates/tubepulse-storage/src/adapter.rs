// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the storage traits.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use tubepulse_config::model::StorageConfig;
use tubepulse_core::{
    AccountQuota, AccountStore, AdapterType, HealthStatus, PluginAdapter, StorageAdapter,
    TubepulseError, UsageRecord, UsageStore,
};

use crate::database::{Database, DatabaseOptions, map_tr_err};
use crate::queries;

/// SQLite-backed account and usage store.
///
/// The database is opened by [`StorageAdapter::initialize`]; every other
/// operation fails with a storage error until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a store for the configured database. Nothing is opened yet.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Create and initialize in one step.
    pub async fn open(config: StorageConfig) -> Result<Self, TubepulseError> {
        let storage = Self::new(config);
        storage.initialize().await?;
        Ok(storage)
    }

    fn db(&self) -> Result<&Database, TubepulseError> {
        self.db.get().ok_or_else(|| TubepulseError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, TubepulseError> {
        let Ok(db) = self.db() else {
            return Ok(HealthStatus::Unhealthy("not initialized".into()));
        };
        db.connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT 1", [], |row| row.get(0))
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TubepulseError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), TubepulseError> {
        let path = self.config.database_path.clone();
        let db = Database::open_with(&path, DatabaseOptions::from(&self.config)).await?;
        self.db.set(db).map_err(|_| TubepulseError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), TubepulseError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl AccountStore for SqliteStorage {
    async fn get_account(&self, identity: &str) -> Result<Option<AccountQuota>, TubepulseError> {
        queries::accounts::get_account(self.db()?, identity).await
    }

    async fn upsert_account(&self, account: &AccountQuota) -> Result<(), TubepulseError> {
        queries::accounts::upsert_account(self.db()?, account).await
    }

    async fn set_remaining(&self, identity: &str, remaining: i64) -> Result<(), TubepulseError> {
        if !queries::accounts::set_remaining(self.db()?, identity, remaining).await? {
            debug!(identity, "no account row to store remaining count on");
        }
        Ok(())
    }

    async fn mark_reset(&self, identity: &str, day: NaiveDate) -> Result<(), TubepulseError> {
        queries::accounts::mark_reset(self.db()?, identity, day).await?;
        Ok(())
    }
}

#[async_trait]
impl UsageStore for SqliteStorage {
    async fn increment_usage(
        &self,
        identity: &str,
        day: NaiveDate,
        label: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<UsageRecord, TubepulseError> {
        queries::usage::increment(self.db()?, identity, day, label, at).await
    }

    async fn get_usage(
        &self,
        identity: &str,
        day: NaiveDate,
    ) -> Result<Option<UsageRecord>, TubepulseError> {
        queries::usage::get(self.db()?, identity, day).await
    }

    async fn usage_history(
        &self,
        identity: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<UsageRecord>, TubepulseError> {
        queries::usage::history(self.db()?, identity, from, to).await
    }

    async fn purge_usage_before(&self, day: NaiveDate) -> Result<u64, TubepulseError> {
        queries::usage::purge_before(self.db()?, day).await
    }
}

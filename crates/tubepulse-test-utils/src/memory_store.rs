// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory account and usage stores.
//!
//! `MemoryStore` keeps everything behind one async mutex, so increments are
//! atomic within the process. Account writes can be made to fail for testing
//! best-effort paths.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;

use tubepulse_core::{
    AccountQuota, AccountStore, TubepulseError, UsageEntry, UsageRecord, UsageStore,
};

#[derive(Default)]
struct State {
    accounts: HashMap<String, AccountQuota>,
    usage: BTreeMap<(String, NaiveDate), UsageRecord>,
}

/// Process-local store implementing both storage traits.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_account_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account.
    pub async fn with_account(self, account: AccountQuota) -> Self {
        self.state
            .lock()
            .await
            .accounts
            .insert(account.identity.clone(), account);
        self
    }

    /// Make `set_remaining`, `mark_reset` and `upsert_account` fail.
    pub fn fail_account_writes(&self, fail: bool) {
        self.fail_account_writes.store(fail, Ordering::SeqCst);
    }

    /// Remove an account, as if it had been deleted elsewhere.
    pub async fn remove_account(&self, identity: &str) {
        self.state.lock().await.accounts.remove(identity);
    }

    fn check_writable(&self) -> Result<(), TubepulseError> {
        if self.fail_account_writes.load(Ordering::SeqCst) {
            return Err(TubepulseError::Storage {
                source: "account writes disabled".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn get_account(&self, identity: &str) -> Result<Option<AccountQuota>, TubepulseError> {
        Ok(self.state.lock().await.accounts.get(identity).cloned())
    }

    async fn upsert_account(&self, account: &AccountQuota) -> Result<(), TubepulseError> {
        self.check_writable()?;
        self.state
            .lock()
            .await
            .accounts
            .insert(account.identity.clone(), account.clone());
        Ok(())
    }

    async fn set_remaining(&self, identity: &str, remaining: i64) -> Result<(), TubepulseError> {
        self.check_writable()?;
        if let Some(account) = self.state.lock().await.accounts.get_mut(identity) {
            account.remaining_today = Some(remaining);
        }
        Ok(())
    }

    async fn mark_reset(&self, identity: &str, day: NaiveDate) -> Result<(), TubepulseError> {
        self.check_writable()?;
        if let Some(account) = self.state.lock().await.accounts.get_mut(identity) {
            account.last_reset_date = Some(day);
        }
        Ok(())
    }
}

#[async_trait]
impl UsageStore for MemoryStore {
    async fn increment_usage(
        &self,
        identity: &str,
        day: NaiveDate,
        label: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<UsageRecord, TubepulseError> {
        let mut state = self.state.lock().await;
        let record = state
            .usage
            .entry((identity.to_string(), day))
            .or_insert_with(|| UsageRecord {
                identity: identity.to_string(),
                day,
                count: 0,
                entries: Vec::new(),
            });
        record.count += 1;
        if let Some(label) = label {
            record.entries.push(UsageEntry {
                label: label.to_string(),
                recorded_at: at,
            });
        }
        Ok(record.clone())
    }

    async fn get_usage(
        &self,
        identity: &str,
        day: NaiveDate,
    ) -> Result<Option<UsageRecord>, TubepulseError> {
        Ok(self
            .state
            .lock()
            .await
            .usage
            .get(&(identity.to_string(), day))
            .cloned())
    }

    async fn usage_history(
        &self,
        identity: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<UsageRecord>, TubepulseError> {
        let state = self.state.lock().await;
        Ok(state
            .usage
            .values()
            .filter(|r| r.identity == identity && r.day >= from && r.day <= to)
            .cloned()
            .collect())
    }

    async fn purge_usage_before(&self, day: NaiveDate) -> Result<u64, TubepulseError> {
        let mut state = self.state.lock().await;
        let before = state.usage.len();
        state.usage.retain(|(_, d), _| *d >= day);
        Ok((before - state.usage.len()) as u64)
    }
}

// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account quota operations.

use chrono::NaiveDate;
use rusqlite::{OptionalExtension, params};
use tubepulse_core::{AccountQuota, TubepulseError};

use crate::database::{Database, map_tr_err};
use crate::queries::{day_from_sql, day_to_sql};

/// Read one account by identity.
pub async fn get_account(
    db: &Database,
    identity: &str,
) -> Result<Option<AccountQuota>, TubepulseError> {
    let identity = identity.to_string();
    db.connection()
        .call(move |conn| -> rusqlite::Result<Option<AccountQuota>> {
            conn.query_row(
                "SELECT identity, daily_limit, is_active, is_banned, last_reset_date, remaining_today
                 FROM accounts WHERE identity = ?1",
                params![identity],
                |row| {
                    let last_reset: Option<String> = row.get(4)?;
                    Ok(AccountQuota {
                        identity: row.get(0)?,
                        daily_limit: row.get(1)?,
                        is_active: row.get(2)?,
                        is_banned: row.get(3)?,
                        last_reset_date: last_reset
                            .map(|day| day_from_sql(4, &day))
                            .transpose()?,
                        remaining_today: row.get(5)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Insert an account, or overwrite the quota fields of an existing one.
pub async fn upsert_account(db: &Database, account: &AccountQuota) -> Result<(), TubepulseError> {
    let account = account.clone();
    db.connection()
        .call(move |conn| -> rusqlite::Result<()> {
            conn.execute(
                "INSERT INTO accounts
                     (identity, daily_limit, is_active, is_banned, last_reset_date, remaining_today)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(identity) DO UPDATE SET
                     daily_limit = excluded.daily_limit,
                     is_active = excluded.is_active,
                     is_banned = excluded.is_banned,
                     last_reset_date = excluded.last_reset_date,
                     remaining_today = excluded.remaining_today,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![
                    account.identity,
                    account.daily_limit,
                    account.is_active,
                    account.is_banned,
                    account.last_reset_date.map(day_to_sql),
                    account.remaining_today,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Store the denormalized remaining count. Returns whether the account exists.
pub async fn set_remaining(
    db: &Database,
    identity: &str,
    remaining: i64,
) -> Result<bool, TubepulseError> {
    let identity = identity.to_string();
    db.connection()
        .call(move |conn| -> rusqlite::Result<bool> {
            let updated = conn.execute(
                "UPDATE accounts SET remaining_today = ?2,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE identity = ?1",
                params![identity, remaining],
            )?;
            Ok(updated > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Record the quota day the account last rolled over on.
pub async fn mark_reset(
    db: &Database,
    identity: &str,
    day: NaiveDate,
) -> Result<bool, TubepulseError> {
    let identity = identity.to_string();
    let day = day_to_sql(day);
    db.connection()
        .call(move |conn| -> rusqlite::Result<bool> {
            let updated = conn.execute(
                "UPDATE accounts SET last_reset_date = ?2,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE identity = ?1",
                params![identity, day],
            )?;
            Ok(updated > 0)
        })
        .await
        .map_err(map_tr_err)
}

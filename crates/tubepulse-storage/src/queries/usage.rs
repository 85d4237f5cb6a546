// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-day usage counters and their call logs.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use tubepulse_core::{TubepulseError, UsageEntry, UsageRecord};

use crate::database::{Database, map_tr_err};
use crate::queries::{day_from_sql, day_to_sql, timestamp_from_sql, timestamp_to_sql};

/// Create-or-increment the `(identity, day)` counter and append `label`.
///
/// Runs as one `BEGIN IMMEDIATE` transaction around a native upsert, so the
/// read of the old count and the write of the new one cannot interleave with
/// another writer, in this process or any other sharing the file.
pub async fn increment(
    db: &Database,
    identity: &str,
    day: NaiveDate,
    label: Option<&str>,
    at: DateTime<Utc>,
) -> Result<UsageRecord, TubepulseError> {
    let identity = identity.to_string();
    let label = label.map(str::to_string);
    let day_key = day_to_sql(day);
    let at = timestamp_to_sql(at);
    db.connection()
        .call(move |conn| -> rusqlite::Result<UsageRecord> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let count: i64 = tx.query_row(
                "INSERT INTO usage_days (identity, day, count, created_at, updated_at)
                 VALUES (?1, ?2, 1, ?3, ?3)
                 ON CONFLICT(identity, day) DO UPDATE SET
                     count = count + 1,
                     updated_at = excluded.updated_at
                 RETURNING count",
                params![identity, day_key, at],
                |row| row.get(0),
            )?;
            if let Some(label) = label {
                tx.execute(
                    "INSERT INTO usage_log (identity, day, label, recorded_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![identity, day_key, label, at],
                )?;
            }
            let entries = load_entries(&tx, &identity, &day_key)?;
            tx.commit()?;
            Ok(UsageRecord {
                identity,
                day,
                count,
                entries,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Read one day's record, if any call was made that day.
pub async fn get(
    db: &Database,
    identity: &str,
    day: NaiveDate,
) -> Result<Option<UsageRecord>, TubepulseError> {
    let identity = identity.to_string();
    let day_key = day_to_sql(day);
    db.connection()
        .call(move |conn| -> rusqlite::Result<Option<UsageRecord>> {
            let count: Option<i64> = conn
                .query_row(
                    "SELECT count FROM usage_days WHERE identity = ?1 AND day = ?2",
                    params![identity, day_key],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(count) = count else {
                return Ok(None);
            };
            let entries = load_entries(conn, &identity, &day_key)?;
            Ok(Some(UsageRecord {
                identity,
                day,
                count,
                entries,
            }))
        })
        .await
        .map_err(map_tr_err)
}

/// Records for `identity` from `from` to `to` inclusive, oldest first.
pub async fn history(
    db: &Database,
    identity: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<UsageRecord>, TubepulseError> {
    let identity = identity.to_string();
    let from = day_to_sql(from);
    let to = day_to_sql(to);
    db.connection()
        .call(move |conn| -> rusqlite::Result<Vec<UsageRecord>> {
            let days: Vec<(String, i64)> = {
                let mut stmt = conn.prepare(
                    "SELECT day, count FROM usage_days
                     WHERE identity = ?1 AND day >= ?2 AND day <= ?3
                     ORDER BY day ASC",
                )?;
                let rows = stmt.query_map(params![identity, from, to], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })?;
                rows.collect::<Result<_, _>>()?
            };

            days.into_iter()
                .map(|(day_key, count)| -> rusqlite::Result<UsageRecord> {
                    Ok(UsageRecord {
                        identity: identity.clone(),
                        day: day_from_sql(0, &day_key)?,
                        count,
                        entries: load_entries(conn, &identity, &day_key)?,
                    })
                })
                .collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Delete day records and logs older than `day`. Returns day records removed.
pub async fn purge_before(db: &Database, day: NaiveDate) -> Result<u64, TubepulseError> {
    let day_key = day_to_sql(day);
    db.connection()
        .call(move |conn| -> rusqlite::Result<u64> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            tx.execute("DELETE FROM usage_log WHERE day < ?1", params![day_key])?;
            let removed = tx.execute("DELETE FROM usage_days WHERE day < ?1", params![day_key])?;
            tx.commit()?;
            Ok(removed as u64)
        })
        .await
        .map_err(map_tr_err)
}

fn load_entries(
    conn: &Connection,
    identity: &str,
    day_key: &str,
) -> rusqlite::Result<Vec<UsageEntry>> {
    let mut stmt = conn.prepare_cached(
        "SELECT label, recorded_at FROM usage_log
         WHERE identity = ?1 AND day = ?2
         ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![identity, day_key], |row| {
        let recorded_at: String = row.get(1)?;
        Ok(UsageEntry {
            label: row.get(0)?,
            recorded_at: timestamp_from_sql(1, &recorded_at)?,
        })
    })?;
    rows.collect()
}

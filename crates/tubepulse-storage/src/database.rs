// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! Each [`Database`] owns one `tokio-rusqlite` connection whose background
//! thread serializes every statement issued through it. Other processes may
//! open the same file; `busy_timeout` makes their writers wait instead of
//! failing.

use std::fmt::Display;
use std::path::Path;
use std::time::Duration;

use tokio_rusqlite::Connection;
use tracing::debug;
use tubepulse_config::model::StorageConfig;
use tubepulse_core::TubepulseError;

use crate::migrations;

/// Connection PRAGMAs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseOptions {
    pub wal_mode: bool,
    pub busy_timeout: Duration,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            wal_mode: true,
            busy_timeout: Duration::from_millis(5000),
        }
    }
}

impl From<&StorageConfig> for DatabaseOptions {
    fn from(config: &StorageConfig) -> Self {
        Self {
            wal_mode: config.wal_mode,
            busy_timeout: Duration::from_millis(config.busy_timeout_ms),
        }
    }
}

/// Handle to an open, migrated SQLite database.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open `path` with default options.
    pub async fn open(path: &str) -> Result<Self, TubepulseError> {
        Self::open_with(path, DatabaseOptions::default()).await
    }

    /// Open `path`, apply PRAGMAs and run pending migrations.
    ///
    /// Missing parent directories are created. `":memory:"` opens a private
    /// in-memory database.
    pub async fn open_with(path: &str, options: DatabaseOptions) -> Result<Self, TubepulseError> {
        if path != ":memory:" {
            if let Some(parent) = Path::new(path).parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent).map_err(|e| TubepulseError::Storage {
                    source: Box::new(e),
                })?;
            }
        }

        let conn = Connection::open(path).await.map_err(storage_err)?;

        let DatabaseOptions {
            wal_mode,
            busy_timeout,
        } = options;
        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            conn.busy_timeout(busy_timeout)?;
            if wal_mode {
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                    row.get::<_, String>(0)
                })?;
                conn.pragma_update(None, "synchronous", "NORMAL")?;
            }
            conn.pragma_update(None, "foreign_keys", true)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        conn.call(|conn| migrations::run_migrations(conn))
            .await
            .map_err(storage_err)?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The underlying async connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoint the WAL into the main database file.
    pub async fn checkpoint(&self) -> Result<(), TubepulseError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))
            })
            .await
            .map_err(map_tr_err)
    }

    /// Checkpoint and close the connection.
    pub async fn close(self) -> Result<(), TubepulseError> {
        self.checkpoint().await?;
        self.conn.close().await.map_err(storage_err)?;
        debug!("database closed");
        Ok(())
    }
}

/// Map a `tokio-rusqlite` call error into [`TubepulseError::Storage`].
///
/// Pins the closure error type of `Connection::call` to `rusqlite::Error`.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> TubepulseError {
    storage_err(e)
}

fn storage_err(e: impl Display) -> TubepulseError {
    TubepulseError::Storage {
        source: e.to_string().into(),
    }
}

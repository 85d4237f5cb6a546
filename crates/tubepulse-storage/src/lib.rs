// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for Tubepulse.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! connection per process via `tokio-rusqlite`, and the account and usage
//! queries behind the quota tracker. The usage counter is incremented with a
//! native upsert inside an immediate transaction, so increments stay atomic
//! across every process sharing the database file.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::{Database, DatabaseOptions};

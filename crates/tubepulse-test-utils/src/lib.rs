// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Tubepulse integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic tests without a network or a shared database.
//!
//! # Components
//!
//! - [`MockUpstream`] - Scripted video platform client
//! - [`MemoryStore`] - In-memory account and usage store
//! - [`TestHarness`] - Gateway over temp SQLite and the mock upstream

pub mod harness;
pub mod memory_store;
pub mod mock_upstream;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use memory_store::MemoryStore;
pub use mock_upstream::{MockUpstream, Reply};

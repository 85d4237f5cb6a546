// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! Adapters use `#[async_trait]` so they can be held as trait objects and
//! injected into the quota tracker and the gateway at construction time.

pub mod adapter;
pub mod storage;
pub mod upstream;

pub use adapter::PluginAdapter;
pub use storage::{AccountStore, StorageAdapter, UsageStore};
pub use upstream::UpstreamClient;

// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Application-facing surface of Tubepulse.
//!
//! [`Gateway`] is what the rest of an application calls to reach the video
//! platform: it gates each call on the caller's daily quota, bounds upstream
//! concurrency, normalizes payloads and counts usage in the background.
//! [`QueueHealth`] reports admission load for monitoring.

pub mod health;
pub mod pipeline;
pub mod telemetry;

pub use health::QueueHealth;
pub use pipeline::{GatedCall, Gateway};
pub use telemetry::init_tracing;

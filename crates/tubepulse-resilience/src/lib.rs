// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilience primitives for outbound calls.
//!
//! - [`RequestQueue`] bounds how many upstream calls run at once and queues
//!   the rest in arrival order.
//! - [`retry`] / [`retry_if`] re-run an operation under a [`RetryPolicy`].
//! - [`BackgroundTasks`] runs best-effort work detached from the caller while
//!   still logging and counting its failures.

pub mod background;
pub mod queue;
pub mod retry;

pub use background::BackgroundTasks;
pub use queue::{QueueStatus, RequestQueue};
pub use retry::{RetryPolicy, retry, retry_if};

// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any installed recorder collects these.
//! Without a recorder every call is a no-op.

use metrics::{describe_counter, describe_gauge, describe_histogram};
use tubepulse_core::QuotaOutcome;

pub const UPSTREAM_CALLS: &str = "tubepulse_upstream_calls_total";
pub const QUOTA_DECISIONS: &str = "tubepulse_quota_decisions_total";
pub const QUEUE_ACTIVE: &str = "tubepulse_queue_active";
pub const QUEUE_WAITING: &str = "tubepulse_queue_waiting";
pub const UPSTREAM_LATENCY: &str = "tubepulse_upstream_latency_seconds";
pub const BACKGROUND_FAILURES: &str = "tubepulse_background_failures_total";

/// Result of one upstream call, as a metric label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Success,
    RateLimited,
    Failure,
}

impl CallOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::RateLimited => "rate_limited",
            Self::Failure => "failure",
        }
    }
}

/// Register all Tubepulse metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(UPSTREAM_CALLS, "Upstream calls completed, by outcome");
    describe_counter!(QUOTA_DECISIONS, "Quota checks, by outcome");
    describe_gauge!(QUEUE_ACTIVE, "Upstream calls currently running");
    describe_gauge!(QUEUE_WAITING, "Upstream calls waiting for admission");
    describe_histogram!(UPSTREAM_LATENCY, "Upstream call latency in seconds, queue wait included");
    describe_counter!(BACKGROUND_FAILURES, "Failed best-effort background tasks");
}

/// Record a finished upstream call.
pub fn record_upstream_call(outcome: CallOutcome) {
    metrics::counter!(UPSTREAM_CALLS, "outcome" => outcome.as_str()).increment(1);
}

/// Record a quota decision.
pub fn record_quota_decision(outcome: QuotaOutcome) {
    metrics::counter!(QUOTA_DECISIONS, "outcome" => outcome.to_string()).increment(1);
}

/// Set the queue gauges.
pub fn set_queue_depth(active: usize, waiting: usize) {
    metrics::gauge!(QUEUE_ACTIVE).set(active as f64);
    metrics::gauge!(QUEUE_WAITING).set(waiting as f64);
}

/// Record upstream call latency.
pub fn record_upstream_latency(seconds: f64) {
    metrics::histogram!(UPSTREAM_LATENCY).record(seconds);
}

/// Record a failed background task.
pub fn record_background_failure(task: &'static str) {
    metrics::counter!(BACKGROUND_FAILURES, "task" => task).increment(1);
}

// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Point-in-time load report for monitoring.

use serde::Serialize;
use tubepulse_core::HealthStatus;
use tubepulse_resilience::QueueStatus;

/// Snapshot of upstream call admission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueHealth {
    pub active_requests: usize,
    pub queued_requests: usize,
    pub max_concurrent: usize,
    /// Share of slots in use, 0 to 100.
    pub utilization_percent: f64,
    /// Healthy while nothing waits for a slot, degraded otherwise.
    pub readiness: HealthStatus,
}

impl From<QueueStatus> for QueueHealth {
    fn from(status: QueueStatus) -> Self {
        let utilization_percent = if status.limit == 0 {
            0.0
        } else {
            let raw = status.active as f64 / status.limit as f64 * 100.0;
            (raw * 10.0).round() / 10.0
        };
        let readiness = if status.queued == 0 {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded(format!("{} requests waiting", status.queued))
        };
        Self {
            active_requests: status.active,
            queued_requests: status.queued,
            max_concurrent: status.limit,
            utilization_percent,
            readiness,
        }
    }
}

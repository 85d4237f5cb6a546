// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus metrics adapter for Tubepulse.
//!
//! Uses the metrics-rs facade with the Prometheus exporter. Metrics are
//! rendered as Prometheus text format via [`PrometheusAdapter::render`].

pub mod recording;

use async_trait::async_trait;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

use tubepulse_core::{AdapterType, HealthStatus, PluginAdapter, TubepulseError};

pub use recording::{
    CallOutcome, record_background_failure, record_quota_decision, record_upstream_call,
    record_upstream_latency, register_metrics, set_queue_depth,
};

/// Prometheus metrics adapter.
///
/// Holds the handle used to render collected metrics.
pub struct PrometheusAdapter {
    handle: PrometheusHandle,
}

impl PrometheusAdapter {
    /// Install the Prometheus recorder globally.
    ///
    /// Only one recorder can be installed per process; a second call fails.
    pub fn new() -> Result<Self, TubepulseError> {
        let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
            TubepulseError::Internal(format!("failed to install Prometheus recorder: {e}"))
        })?;

        recording::register_metrics();

        tracing::info!("prometheus metrics recorder installed");

        Ok(Self { handle })
    }

    /// Build a recorder without installing it globally.
    ///
    /// The caller decides where the recorder is installed, for example with
    /// `metrics::with_local_recorder` in tests.
    pub fn unregistered() -> (Self, PrometheusRecorder) {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        (Self { handle }, recorder)
    }

    pub fn handle(&self) -> &PrometheusHandle {
        &self.handle
    }

    /// Render all collected metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

#[async_trait]
impl PluginAdapter for PrometheusAdapter {
    fn name(&self) -> &str {
        "prometheus"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Observability
    }

    async fn health_check(&self) -> Result<HealthStatus, TubepulseError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TubepulseError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tubepulse_core::QuotaOutcome;

    #[test]
    fn renders_recorded_metrics() {
        let (adapter, recorder) = PrometheusAdapter::unregistered();
        metrics::with_local_recorder(&recorder, || {
            record_upstream_call(CallOutcome::RateLimited);
            record_quota_decision(QuotaOutcome::Blocked);
            set_queue_depth(3, 2);
        });

        let text = adapter.render();
        assert!(text.contains("tubepulse_upstream_calls_total{outcome=\"rate_limited\"} 1"));
        assert!(text.contains("tubepulse_quota_decisions_total{outcome=\"blocked\"} 1"));
        assert!(text.contains("tubepulse_queue_active 3"));
        assert!(text.contains("tubepulse_queue_waiting 2"));
    }

    #[tokio::test]
    async fn adapter_identity() {
        let (adapter, _recorder) = PrometheusAdapter::unregistered();
        assert_eq!(adapter.name(), "prometheus");
        assert_eq!(adapter.adapter_type(), AdapterType::Observability);
        assert_eq!(adapter.health_check().await.unwrap(), HealthStatus::Healthy);
    }
}

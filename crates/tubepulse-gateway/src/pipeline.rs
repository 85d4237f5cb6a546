// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quota-gated upstream calls.
//!
//! Every metered call runs as check, then queued upstream call, then
//! normalization, then a detached quota increment. The increment only
//! happens after a successful call and never delays the caller.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::debug;
use tubepulse_analytics::MetricCalculator;
use tubepulse_config::model::UpstreamConfig;
use tubepulse_core::{ChannelInfo, QuotaStatus, RawValue, TubepulseError, UpstreamClient, Video};
use tubepulse_normalize::Normalizer;
use tubepulse_prometheus::{
    CallOutcome, record_background_failure, record_quota_decision, record_upstream_call,
    record_upstream_latency, set_queue_depth,
};
use tubepulse_quota::QuotaTracker;
use tubepulse_resilience::{BackgroundTasks, RequestQueue, RetryPolicy, retry_if};

use crate::health::QueueHealth;

const INCREMENT_TASK: &str = "quota_increment";

/// Outcome of a quota-gated call.
#[derive(Debug, Clone, PartialEq)]
pub enum GatedCall<T> {
    /// The call ran. Carries the quota status seen before the call.
    Completed(T, QuotaStatus),
    /// The quota check refused the call; the upstream was not contacted.
    Denied(QuotaStatus),
}

impl<T> GatedCall<T> {
    pub fn status(&self) -> &QuotaStatus {
        match self {
            Self::Completed(_, status) | Self::Denied(status) => status,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Completed(value, _) => Some(value),
            Self::Denied(_) => None,
        }
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied(_))
    }
}

/// Composes quota, admission, retries and normalization for upstream calls.
pub struct Gateway {
    quota: Arc<QuotaTracker>,
    queue: RequestQueue,
    normalizer: Arc<Normalizer>,
    background: BackgroundTasks,
    call_timeout: Duration,
    retry: RetryPolicy,
}

impl Gateway {
    pub fn new(config: &UpstreamConfig, quota: Arc<QuotaTracker>) -> Self {
        Self {
            quota,
            queue: RequestQueue::new(config.max_concurrent),
            normalizer: Arc::new(Normalizer::default()),
            background: BackgroundTasks::new(),
            call_timeout: Duration::from_secs(config.call_timeout_secs),
            retry: RetryPolicy::new(
                config.retry_attempts,
                Duration::from_millis(config.retry_backoff_ms),
            ),
        }
    }

    /// Replace the alias tables used to read upstream payloads.
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = Arc::new(normalizer);
        self
    }

    pub fn quota(&self) -> &QuotaTracker {
        &self.quota
    }

    pub fn queue(&self) -> &RequestQueue {
        &self.queue
    }

    pub fn background(&self) -> &BackgroundTasks {
        &self.background
    }

    /// Current admission load.
    pub fn health(&self) -> QueueHealth {
        let status = self.queue.status();
        set_queue_depth(status.active, status.queued);
        QueueHealth::from(status)
    }

    /// Run `call` for `identity` if its quota allows, then shape the payload.
    ///
    /// `call` may be invoked more than once when it fails with a transient,
    /// non-rate-limited error. Upstream errors are returned as-is and are not
    /// counted against the quota. `label` is recorded in the usage log.
    pub async fn check_then_call<R, T, C, Fut, N>(
        &self,
        identity: &str,
        label: &str,
        call: C,
        normalize: N,
    ) -> Result<GatedCall<T>, TubepulseError>
    where
        C: FnMut() -> Fut,
        Fut: Future<Output = Result<R, TubepulseError>>,
        N: FnOnce(R) -> T,
    {
        let status = self.quota.check(identity).await?;
        record_quota_decision(status.outcome());
        if !status.allowed {
            debug!(identity, outcome = %status.outcome(), "upstream call denied by quota");
            return Ok(GatedCall::Denied(status));
        }

        let started = Instant::now();
        let result = self
            .queue
            .enqueue_with_timeout(self.call_timeout, || {
                retry_if(&self.retry, label, call, |e: &TubepulseError| {
                    e.is_transient() && !e.is_rate_limited()
                })
            })
            .await;
        record_upstream_latency(started.elapsed().as_secs_f64());
        let queue = self.queue.status();
        set_queue_depth(queue.active, queue.queued);

        let raw = match result {
            Ok(raw) => {
                record_upstream_call(CallOutcome::Success);
                raw
            }
            Err(e) => {
                record_upstream_call(if e.is_rate_limited() {
                    CallOutcome::RateLimited
                } else {
                    CallOutcome::Failure
                });
                return Err(e);
            }
        };

        let value = normalize(raw);
        self.spawn_increment(identity, label);
        Ok(GatedCall::Completed(value, status))
    }

    /// Quota-gated search, normalized into videos.
    pub async fn search(
        &self,
        client: &dyn UpstreamClient,
        identity: &str,
        query: &str,
    ) -> Result<GatedCall<Vec<Video>>, TubepulseError> {
        let normalizer = self.normalizer.clone();
        self.check_then_call(
            identity,
            "search",
            || client.search(query),
            move |raws: Vec<RawValue>| normalizer.normalize_videos(&raws),
        )
        .await
    }

    /// [`search`](Self::search) with each video paired with its views per
    /// hour, fastest first. Counts as one search against the quota.
    pub async fn search_ranked(
        &self,
        client: &dyn UpstreamClient,
        identity: &str,
        query: &str,
    ) -> Result<GatedCall<Vec<(Video, u64)>>, TubepulseError> {
        let normalizer = self.normalizer.clone();
        self.check_then_call(
            identity,
            "search",
            || client.search(query),
            move |raws: Vec<RawValue>| {
                let videos = normalizer.normalize_videos(&raws);
                MetricCalculator::new()
                    .rank_by_vph(&videos, Utc::now())
                    .into_iter()
                    .map(|(video, vph)| (video.clone(), vph))
                    .collect()
            },
        )
        .await
    }

    /// Quota-gated channel lookup.
    pub async fn channel(
        &self,
        client: &dyn UpstreamClient,
        identity: &str,
        channel_id: &str,
    ) -> Result<GatedCall<ChannelInfo>, TubepulseError> {
        let normalizer = self.normalizer.clone();
        self.check_then_call(
            identity,
            "channel",
            || client.channel(channel_id),
            move |raw: RawValue| normalizer.normalize_channel(&raw),
        )
        .await
    }

    /// Wait for pending quota increments.
    pub async fn shutdown(&self) {
        self.background.shutdown().await;
    }

    fn spawn_increment(&self, identity: &str, label: &str) {
        let quota = self.quota.clone();
        let identity = identity.to_string();
        let label = label.to_string();
        self.background.spawn_best_effort(INCREMENT_TASK, async move {
            let result = quota.increment(&identity, Some(&label)).await;
            if result.is_err() {
                record_background_failure(INCREMENT_TASK);
            }
            result
        });
    }
}

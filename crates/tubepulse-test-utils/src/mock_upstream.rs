// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock upstream client for deterministic testing.
//!
//! `MockUpstream` implements `UpstreamClient` with scripted replies, records
//! every request, and tracks how many calls ran at the same time.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use tubepulse_core::{
    AdapterType, HealthStatus, PluginAdapter, RawValue, TubepulseError, UpstreamClient,
};

/// One scripted upstream reply.
#[derive(Debug, Clone)]
pub enum Reply {
    /// A successful payload. Search calls return its array items, or the
    /// value itself as a single record when it is not an array.
    Payload(RawValue),
    /// A failed call with an optional status code.
    Failure { message: String, status: Option<u16> },
}

impl Reply {
    /// Payload from a JSON literal.
    pub fn json(value: serde_json::Value) -> Self {
        Self::Payload(RawValue::from(value))
    }

    pub fn failure(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Failure {
            message: message.into(),
            status,
        }
    }
}

/// A mock video platform client.
///
/// Replies are popped from a FIFO queue. When the queue is empty, searches
/// return no records and channel lookups return an empty map.
pub struct MockUpstream {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    requests: Arc<Mutex<Vec<String>>>,
    latency: Duration,
    running: AtomicUsize,
    peak: AtomicUsize,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::with_replies(Vec::new())
    }

    /// Create a mock pre-loaded with the given replies.
    pub fn with_replies(replies: Vec<Reply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::from(replies))),
            requests: Arc::new(Mutex::new(Vec::new())),
            latency: Duration::ZERO,
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Hold every call open for `latency` before replying.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Add a reply to the end of the queue.
    pub async fn push_reply(&self, reply: Reply) {
        self.replies.lock().await.push_back(reply);
    }

    /// Requests seen so far, as `search:<query>` or `channel:<id>`.
    pub async fn requests(&self) -> Vec<String> {
        self.requests.lock().await.clone()
    }

    /// Most calls observed running at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    async fn respond(&self, request: String) -> Result<Option<RawValue>, TubepulseError> {
        self.requests.lock().await.push(request);
        let now_running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now_running, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let reply = self.replies.lock().await.pop_front();
        self.running.fetch_sub(1, Ordering::SeqCst);

        match reply {
            None => Ok(None),
            Some(Reply::Payload(value)) => Ok(Some(value)),
            Some(Reply::Failure { message, status }) => {
                Err(TubepulseError::upstream(message, status))
            }
        }
    }
}

impl Default for MockUpstream {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockUpstream {
    fn name(&self) -> &str {
        "mock-upstream"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Upstream
    }

    async fn health_check(&self) -> Result<HealthStatus, TubepulseError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TubepulseError> {
        Ok(())
    }
}

#[async_trait]
impl UpstreamClient for MockUpstream {
    async fn search(&self, query: &str) -> Result<Vec<RawValue>, TubepulseError> {
        Ok(match self.respond(format!("search:{query}")).await? {
            None => Vec::new(),
            Some(RawValue::Array(items)) => items,
            Some(single) => vec![single],
        })
    }

    async fn channel(&self, channel_id: &str) -> Result<RawValue, TubepulseError> {
        Ok(self
            .respond(format!("channel:{channel_id}"))
            .await?
            .unwrap_or_else(|| RawValue::Map(Default::default())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn replies_in_order_then_defaults() {
        let upstream = MockUpstream::with_replies(vec![
            Reply::json(json!([{"videoId": "a"}, {"videoId": "b"}])),
            Reply::failure("quota", Some(403)),
        ]);

        assert_eq!(upstream.search("one").await.unwrap().len(), 2);
        let err = upstream.search("two").await.unwrap_err();
        assert_eq!(err.status_code(), Some(403));
        assert!(upstream.search("three").await.unwrap().is_empty());
        assert_eq!(
            upstream.requests().await,
            vec!["search:one", "search:two", "search:three"]
        );
    }

    #[tokio::test]
    async fn channel_defaults_to_empty_map() {
        let upstream = MockUpstream::new();
        let payload = upstream.channel("UC1").await.unwrap();
        assert!(payload.as_map().is_some_and(|m| m.is_empty()));
    }

    #[tokio::test]
    async fn non_array_search_payload_is_one_record() {
        let upstream = MockUpstream::with_replies(vec![Reply::json(json!({"videoId": "a"}))]);
        assert_eq!(upstream.search("q").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn pushed_replies_queue_behind_scripted_ones() {
        let upstream = MockUpstream::with_replies(vec![Reply::json(json!([{"videoId": "a"}]))]);
        upstream
            .push_reply(Reply::failure("backend error", Some(503)))
            .await;

        assert_eq!(upstream.search("first").await.unwrap().len(), 1);
        let err = upstream.channel("UC1").await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(upstream.peak_concurrency(), 1);
    }
}

// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Boundary to the third-party video platform.

use async_trait::async_trait;

use crate::error::TubepulseError;
use crate::value::RawValue;

/// Client for the upstream search and detail endpoints.
///
/// Implementations return payloads untouched; shape reconciliation is the
/// normalizer's job. Failures should be [`TubepulseError::Upstream`] with the
/// response status when one was received.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Search the catalog. Each element is one raw result record.
    async fn search(&self, query: &str) -> Result<Vec<RawValue>, TubepulseError>;

    /// Fetch one channel's detail payload.
    async fn channel(&self, channel_id: &str) -> Result<RawValue, TubepulseError>;
}

// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Schema reconciliation for Tubepulse.
//!
//! Upstream search and channel endpoints return records whose field names,
//! nesting and value formats drift. This crate maps them onto the canonical
//! [`Video`](tubepulse_core::Video) and [`ChannelInfo`](tubepulse_core::ChannelInfo)
//! types without ever failing.

pub mod extractor;
pub mod normalizer;
pub mod parse;

pub use extractor::FieldExtractor;
pub use normalizer::{
    ChannelAliases, Normalizer, VideoAliases, extract_video_id, normalize_channel,
    normalize_video,
};
pub use parse::{normalize_duration, parse_count, parse_count_text, parse_published};

// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parsers for the free-text fields upstream records carry.

pub mod duration;
pub mod number;
pub mod relative_date;

pub use duration::{SHORTS_SENTINEL, duration_from_seconds, normalize_duration};
pub use number::{parse_count, parse_count_text};
pub use relative_date::{parse_absolute, parse_published, parse_relative};

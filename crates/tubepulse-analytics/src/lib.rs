// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Derived metrics over normalized videos.

pub mod vph;

pub use vph::{MetricCalculator, decay_factor, vph};

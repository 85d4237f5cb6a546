// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metered access control for Tubepulse.
//!
//! Every identity gets a daily call allowance. A day is a calendar day in a
//! fixed reference timezone; the `(identity, day)` usage key starts a fresh
//! counter at local midnight without any reset job.

pub mod calendar;
pub mod tracker;

pub use calendar::QuotaCalendar;
pub use tracker::QuotaTracker;

// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quota days in a fixed reference timezone.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, TimeDelta, Utc};
use tubepulse_core::TubepulseError;

/// Maps instants to quota days and finds the next reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaCalendar {
    offset: FixedOffset,
}

impl QuotaCalendar {
    /// Calendar whose days start at local midnight in UTC+`utc_offset_hours`.
    pub fn new(utc_offset_hours: i32) -> Result<Self, TubepulseError> {
        utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .map(|offset| Self { offset })
            .ok_or_else(|| {
                TubepulseError::Config(format!(
                    "quota utc offset out of range: {utc_offset_hours} hours"
                ))
            })
    }

    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Quota day containing `at`.
    pub fn day_of(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }

    /// Instant at which `day` begins.
    pub fn start_of(&self, day: NaiveDate) -> DateTime<Utc> {
        let local_midnight = day.and_time(NaiveTime::MIN);
        (local_midnight - TimeDelta::seconds(self.offset.local_minus_utc().into())).and_utc()
    }

    /// Start of the quota day after the one containing `at`.
    pub fn next_reset(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        match self.day_of(at).succ_opt() {
            Some(next) => self.start_of(next),
            None => at,
        }
    }
}

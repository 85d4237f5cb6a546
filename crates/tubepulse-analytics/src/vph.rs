// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Views per hour with a time-decay weighting.
//!
//! Young uploads report views with a lag, so the raw rate is scaled by a
//! factor chosen from the elapsed-days bucket. The curve is not monotone
//! around the one-day mark.

use chrono::{DateTime, Utc};
use tubepulse_core::Video;

/// Below this many views a rate estimate is noise.
pub const MIN_VIEWS: u64 = 50;

/// Minimum age, in hours, before a rate is reported.
pub const MIN_HOURS: f64 = 1.0;

/// `(upper bound in days, factor)`, checked in order with inclusive bounds.
const DECAY_BUCKETS: &[(f64, f64)] = &[
    (0.2, 1.00),
    (0.6, 0.93),
    (1.0, 1.00),
    (2.0, 0.47),
    (3.0, 0.26),
    (7.0, 0.30),
    (14.0, 0.185),
    (30.0, 0.26),
];

/// Factor applied past the last bucket.
const DECAY_TAIL: f64 = 0.11;

/// Decay factor for content that has been public for `days`.
pub fn decay_factor(days: f64) -> f64 {
    DECAY_BUCKETS
        .iter()
        .find(|(upper, _)| days <= *upper)
        .map_or(DECAY_TAIL, |(_, factor)| *factor)
}

/// Decay-weighted views per hour, or 0 when no meaningful rate exists.
pub fn vph(views: u64, published_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> u64 {
    if views < MIN_VIEWS {
        return 0;
    }
    let Some(published_at) = published_at else {
        return 0;
    };

    let hours = (now - published_at).num_milliseconds() as f64 / 3_600_000.0;
    if !hours.is_finite() || hours <= 0.0 || hours < MIN_HOURS {
        return 0;
    }

    let rate = views as f64 / hours * decay_factor(hours / 24.0);
    if !rate.is_finite() || rate < 0.0 {
        return 0;
    }
    rate.round() as u64
}

/// Computes derived metrics for normalized videos.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricCalculator;

impl MetricCalculator {
    pub fn new() -> Self {
        Self
    }

    /// [`vph`] as of now.
    pub fn vph(&self, views: u64, published_at: Option<DateTime<Utc>>) -> u64 {
        vph(views, published_at, Utc::now())
    }

    /// [`vph`] for a normalized video.
    pub fn video_vph(&self, video: &Video, now: DateTime<Utc>) -> u64 {
        vph(video.view_count, video.published_at, now)
    }

    /// Videos paired with their VPH, fastest first. Ties keep input order.
    pub fn rank_by_vph<'a>(&self, videos: &'a [Video], now: DateTime<Utc>) -> Vec<(&'a Video, u64)> {
        let mut ranked: Vec<(&Video, u64)> = videos
            .iter()
            .map(|video| (video, self.video_vph(video, now)))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn below_view_floor_is_zero() {
        assert_eq!(vph(49, Some(now() - Duration::minutes(50)), now()), 0);
        assert_eq!(vph(49, Some(now() - Duration::days(2)), now()), 0);
    }

    #[test]
    fn younger_than_an_hour_is_zero() {
        assert_eq!(vph(1000, Some(now() - Duration::minutes(30)), now()), 0);
    }

    #[test]
    fn missing_or_future_publish_time_is_zero() {
        assert_eq!(vph(1000, None, now()), 0);
        assert_eq!(vph(1000, Some(now() + Duration::hours(3)), now()), 0);
        assert_eq!(vph(1000, Some(now()), now()), 0);
    }

    #[test]
    fn exactly_one_hour() {
        let expected = (3600.0 * decay_factor(1.0 / 24.0)).round() as u64;
        assert_eq!(vph(3600, Some(now() - Duration::hours(1)), now()), expected);
        assert_eq!(expected, 3600);
    }

    #[test]
    fn decay_buckets() {
        assert_eq!(decay_factor(0.0), 1.00);
        assert_eq!(decay_factor(0.2), 1.00);
        assert_eq!(decay_factor(0.21), 0.93);
        assert_eq!(decay_factor(0.6), 0.93);
        assert_eq!(decay_factor(0.9), 1.00);
        assert_eq!(decay_factor(1.0), 1.00);
        assert_eq!(decay_factor(1.5), 0.47);
        assert_eq!(decay_factor(3.0), 0.26);
        assert_eq!(decay_factor(5.0), 0.30);
        assert_eq!(decay_factor(10.0), 0.185);
        assert_eq!(decay_factor(30.0), 0.26);
        assert_eq!(decay_factor(30.01), 0.11);
        assert_eq!(decay_factor(400.0), 0.11);
    }

    #[test]
    fn weighted_rate() {
        // 2 days old: 48h, factor 0.47.
        let published = Some(now() - Duration::days(2));
        assert_eq!(vph(48_000, published, now()), 470);
        // 10 days old: 240h, factor 0.185.
        let published = Some(now() - Duration::days(10));
        assert_eq!(vph(240_000, published, now()), 185);
    }

    #[test]
    fn ranking_orders_by_rate() {
        let slow = Video {
            id: "slow".into(),
            view_count: 1_000,
            published_at: Some(now() - Duration::days(40)),
            ..Video::default()
        };
        let fast = Video {
            id: "fast".into(),
            view_count: 100_000,
            published_at: Some(now() - Duration::hours(4)),
            ..Video::default()
        };
        let videos = vec![slow, fast];
        let ranked = MetricCalculator::new().rank_by_vph(&videos, now());
        assert_eq!(ranked[0].0.id, "fast");
        assert_eq!(ranked[0].1, 25_000);
        assert_eq!(ranked[1].0.id, "slow");
    }

    proptest! {
        #[test]
        fn never_exceeds_raw_rate(views in 50u64..10_000_000_000, minutes in 60i64..5_000_000) {
            let published = Some(now() - Duration::minutes(minutes));
            let hours = (minutes * 60_000) as f64 / 3_600_000.0;
            let raw = (views as f64 / hours).round() as u64;
            prop_assert!(vph(views, published, now()) <= raw);
        }
    }
}

// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Publication timestamps from absolute or relative ("3 days ago", "2주 전") text.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;

static ENGLISH_RELATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([0-9]+)\s*(seconds?|secs?|minutes?|mins?|hours?|hrs?|days?|weeks?|months?|years?)\s+ago").unwrap()
});

static KOREAN_RELATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]+)\s*(초|분|시간|일|주일|주|개월|달|년)\s*전").unwrap()
});

/// Pick the publication time of a record.
///
/// A parseable absolute timestamp wins. Otherwise the relative text is
/// resolved against `now`. Returns `None` when neither parses.
pub fn parse_published(
    absolute: Option<&str>,
    relative: Option<&str>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    absolute
        .and_then(parse_absolute)
        .or_else(|| relative.and_then(|text| parse_relative(text, now)))
}

/// Parse RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS` (read as UTC), a bare
/// `YYYY-MM-DD` (UTC midnight) or a compact `YYYYMMDD` date.
pub fn parse_absolute(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    ["%Y-%m-%d", "%Y%m%d"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Resolve relative text such as "3 days ago", "Streamed 2 hours ago" or
/// "5일 전" against `now`. Months count as 30 days and years as 365.
pub fn parse_relative(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let (amount, unit) = ENGLISH_RELATIVE
        .captures(text)
        .or_else(|| KOREAN_RELATIVE.captures(text))
        .map(|caps| (caps[1].to_string(), caps[2].to_lowercase()))?;
    let amount: i64 = amount.parse().ok()?;
    let offset = unit_duration(&unit)?.checked_mul(amount.try_into().ok()?)?;
    now.checked_sub_signed(offset)
}

fn unit_duration(unit: &str) -> Option<Duration> {
    let unit = unit.trim_end_matches('s');
    let duration = match unit {
        "second" | "sec" | "초" => Duration::seconds(1),
        "minute" | "min" | "분" => Duration::minutes(1),
        "hour" | "hr" | "시간" => Duration::hours(1),
        "day" | "일" => Duration::days(1),
        "week" | "주" | "주일" => Duration::weeks(1),
        "month" | "개월" | "달" => Duration::days(30),
        "year" | "년" => Duration::days(365),
        _ => return None,
    };
    Some(duration)
}

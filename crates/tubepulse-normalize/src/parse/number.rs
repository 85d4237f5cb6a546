// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Abbreviated count parsing ("1.5M", "150K", "2만", "1억 2345만").
//!
//! Korean myriad tiers are tried first, then Latin suffixes, then a plain
//! number. All arithmetic is done on decimal digits so results floor exactly.

use std::sync::LazyLock;

use regex::Regex;
use tubepulse_core::RawValue;

/// A number followed by 천, 만 or 억, where 천 may also prefix 만 or 억 ("3천만").
static KOREAN_TIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]+(?:\.[0-9]+)?)\s*(?:(천)\s*(만|억)?|(만|억))").unwrap()
});

/// The suffix must not run into further Latin letters ("5 months"), but may be
/// followed by anything else, including Hangul ("2.1K회").
static LATIN_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([0-9]+(?:\.[0-9]+)?)\s*([kmbt])(?:[^a-z]|$)").unwrap()
});

static PLAIN_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+(?:\.[0-9]+)?").unwrap());

/// Parse a raw count value.
///
/// Numbers are floored and negatives clamp to 0. Strings go through
/// [`parse_count_text`]. Anything else is 0.
pub fn parse_count(value: &RawValue) -> u64 {
    match value {
        RawValue::Number(n) if n.is_finite() && *n > 0.0 => n.floor() as u64,
        RawValue::String(s) => parse_count_text(s),
        _ => 0,
    }
}

/// Parse a count written as text. Unparseable input yields 0.
pub fn parse_count_text(text: &str) -> u64 {
    let cleaned = text.trim().replace(',', "");
    if cleaned.is_empty() || cleaned.starts_with('-') {
        return 0;
    }

    let mut korean = KOREAN_TIER.captures_iter(&cleaned).peekable();
    if korean.peek().is_some() {
        return korean.fold(0u64, |total, caps| {
            let myriad = caps.get(3).or_else(|| caps.get(4)).map_or(1, |unit| {
                if unit.as_str() == "만" { 10_000 } else { 100_000_000 }
            });
            let thousands = if caps.get(2).is_some() { 1_000 } else { 1 };
            total.saturating_add(scale(&caps[1], thousands * myriad))
        });
    }

    if let Some(caps) = LATIN_SUFFIX.captures(&cleaned) {
        let multiplier = match caps[2].to_ascii_lowercase().as_str() {
            "k" => 1_000,
            "m" => 1_000_000,
            "b" => 1_000_000_000,
            _ => 1_000_000_000_000,
        };
        return scale(&caps[1], multiplier);
    }

    PLAIN_NUMBER
        .find(&cleaned)
        .map_or(0, |m| scale(m.as_str(), 1))
}

/// `digits × multiplier`, floored, where `digits` may carry a fraction.
fn scale(digits: &str, multiplier: u64) -> u64 {
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    let whole: u128 = whole.parse().unwrap_or(u128::MAX);
    let mut result = whole.saturating_mul(u128::from(multiplier));

    // Digits beyond 19 places cannot change the floored value of a u64-sized
    // multiplier.
    let fraction = &fraction[..fraction.len().min(19)];
    if !fraction.is_empty() {
        let numerator: u128 = fraction.parse().unwrap_or(0);
        let denominator = 10u128.pow(fraction.len() as u32);
        result = result.saturating_add(numerator * u128::from(multiplier) / denominator);
    }

    u64::try_from(result).unwrap_or(u64::MAX)
}

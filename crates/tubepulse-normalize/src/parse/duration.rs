// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Duration canonicalization to ISO-8601 (`PT#H#M#S`).

use std::sync::LazyLock;

use regex::Regex;

/// Upstream marker for short-form content in place of a duration.
pub const SHORTS_SENTINEL: &str = "SHORTS";

/// Canonical duration reported for the [`SHORTS_SENTINEL`].
pub const SHORTS_DURATION: &str = "PT0S";

static ISO_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^P(?:[0-9]+D)?(?:T(?:[0-9]+H)?(?:[0-9]+M)?(?:[0-9]+(?:\.[0-9]+)?S)?)?$").unwrap()
});

static CLOCK_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:([0-9]+):)?([0-9]+):)?([0-9]+)$").unwrap()
});

/// Canonicalize a duration string.
///
/// ISO-8601 input passes through unchanged. Clock notation (`H:MM:SS`,
/// `MM:SS`, `SS`) is converted. The shorts sentinel maps to
/// [`SHORTS_DURATION`]. Anything else yields `""`.
pub fn normalize_duration(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.eq_ignore_ascii_case(SHORTS_SENTINEL) {
        return SHORTS_DURATION.to_string();
    }
    if is_iso_duration(trimmed) {
        return trimmed.to_string();
    }

    let Some(caps) = CLOCK_DURATION.captures(trimmed) else {
        return String::new();
    };
    let field = |i: usize| -> Option<u64> {
        caps.get(i).map_or(Some(0), |m| m.as_str().parse().ok())
    };
    match (field(1), field(2), field(3)) {
        (Some(h), Some(m), Some(s)) => {
            let total = h
                .saturating_mul(3600)
                .saturating_add(m.saturating_mul(60))
                .saturating_add(s);
            duration_from_seconds(total)
        }
        _ => String::new(),
    }
}

/// Format a whole number of seconds as `PT#H#M#S`, omitting leading zero units.
pub fn duration_from_seconds(total: u64) -> String {
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("PT{hours}H{minutes}M{seconds}S")
    } else if minutes > 0 {
        format!("PT{minutes}M{seconds}S")
    } else {
        format!("PT{seconds}S")
    }
}

fn is_iso_duration(text: &str) -> bool {
    // "P" and "PT" alone match the pattern but carry no components.
    text.len() > 2 && ISO_DURATION.is_match(text)
}

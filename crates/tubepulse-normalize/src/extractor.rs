// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Null-safe, multi-alias field reads over [`RawValue`] records.
//!
//! Every read takes an ordered alias list of dot-separated paths. The first
//! alias that exists and holds a value of the wanted type wins; later aliases
//! are only consulted when earlier ones are absent or mistyped.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;
use tubepulse_core::RawValue;

use crate::parse::number::{parse_count, parse_count_text};

/// Reader over one raw record.
#[derive(Debug, Clone, Copy)]
pub struct FieldExtractor<'a> {
    record: &'a RawValue,
}

impl<'a> FieldExtractor<'a> {
    pub fn new(record: &'a RawValue) -> Self {
        Self { record }
    }

    /// The record being read.
    pub fn record(&self) -> &'a RawValue {
        self.record
    }

    /// First aliased value accepted by `accept`.
    pub fn find<S, F>(&self, aliases: &[S], accept: F) -> Option<&'a RawValue>
    where
        S: AsRef<str>,
        F: Fn(&RawValue) -> bool,
    {
        aliases.iter().find_map(|alias| {
            let value = self.record.path(alias.as_ref())?;
            if accept(value) {
                return Some(value);
            }
            if !matches!(value, RawValue::Null) {
                debug!(
                    alias = alias.as_ref(),
                    found = value.type_name(),
                    "skipping mistyped alias"
                );
            }
            None
        })
    }

    /// First non-blank text value.
    ///
    /// Besides plain strings, accepts the `{"simpleText": ..}` and
    /// `{"runs": [{"text": ..}]}` text objects some endpoints return.
    pub fn string<S: AsRef<str>>(&self, aliases: &[S]) -> Option<String> {
        self.find(aliases, |v| text_of(v).is_some())
            .and_then(text_of)
    }

    /// [`string`](Self::string), or `""` when no alias matches.
    pub fn string_or_default<S: AsRef<str>>(&self, aliases: &[S]) -> String {
        self.string(aliases).unwrap_or_default()
    }

    /// First numeric or numeric-looking value, parsed as a non-negative count.
    ///
    /// Returns 0 when nothing matches or the matched value does not parse.
    pub fn count<S: AsRef<str>>(&self, aliases: &[S]) -> u64 {
        let Some(value) = self.find(aliases, |v| match v {
            RawValue::Number(_) => true,
            _ => text_of(v).is_some(),
        }) else {
            return 0;
        };

        match value {
            RawValue::Number(_) => parse_count(value),
            _ => text_of(value).map_or(0, |text| parse_count_text(&text)),
        }
    }

    /// First boolean value. The strings `"true"` and `"false"` also count.
    pub fn flag<S: AsRef<str>>(&self, aliases: &[S]) -> Option<bool> {
        aliases
            .iter()
            .filter_map(|alias| self.record.path(alias.as_ref()))
            .find_map(|v| match v {
                RawValue::Bool(b) => Some(*b),
                RawValue::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
                RawValue::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
                _ => None,
            })
    }

    /// First array value.
    pub fn array<S: AsRef<str>>(&self, aliases: &[S]) -> Option<&'a [RawValue]> {
        self.find(aliases, |v| v.as_array().is_some())
            .and_then(RawValue::as_array)
    }

    /// First map value.
    pub fn map<S: AsRef<str>>(&self, aliases: &[S]) -> Option<&'a BTreeMap<String, RawValue>> {
        self.find(aliases, |v| v.as_map().is_some())
            .and_then(RawValue::as_map)
    }

    /// First string-list value as a set.
    ///
    /// An array contributes its non-blank string items; a single string is
    /// split on commas.
    pub fn string_set<S: AsRef<str>>(&self, aliases: &[S]) -> BTreeSet<String> {
        let Some(value) = self.find(aliases, |v| {
            matches!(v, RawValue::Array(_)) || matches!(v, RawValue::String(s) if !s.trim().is_empty())
        }) else {
            return BTreeSet::new();
        };

        match value {
            RawValue::Array(items) => items
                .iter()
                .filter_map(RawValue::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            RawValue::String(s) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            _ => BTreeSet::new(),
        }
    }
}

/// Text content of a value, if it is textual and not blank.
pub(crate) fn text_of(value: &RawValue) -> Option<String> {
    match value {
        RawValue::String(s) if !s.trim().is_empty() => Some(s.clone()),
        RawValue::Map(map) => {
            if let Some(text) = map.get("simpleText").and_then(RawValue::as_str) {
                return (!text.trim().is_empty()).then(|| text.to_string());
            }
            let joined: String = map
                .get("runs")?
                .as_array()?
                .iter()
                .filter_map(|run| run.get("text").and_then(RawValue::as_str))
                .collect();
            (!joined.trim().is_empty()).then_some(joined)
        }
        _ => None,
    }
}

// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raw upstream record to canonical [`Video`] / [`ChannelInfo`].
//!
//! Normalization never fails. A field that cannot be resolved degrades to its
//! default (empty string, zero, `None`) so one malformed record cannot abort a
//! whole result page. Records that end up without an id are dropped by
//! [`Normalizer::normalize_videos`].

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::debug;
use tubepulse_core::{ChannelInfo, RawValue, Video, VideoKind};

use crate::extractor::{FieldExtractor, text_of};
use crate::parse::{
    SHORTS_SENTINEL, duration_from_seconds, normalize_duration, parse_published,
};

static WATCH_URL_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:youtube\.com/(?:watch\?(?:[^#]*&)?v=|shorts/|embed/|live/)|youtu\.be/)([A-Za-z0-9_-]{11})",
    )
    .unwrap()
});

/// Size keys of a keyed thumbnail map, best first.
const THUMBNAIL_SIZES: &[&str] = &["maxres", "high", "medium", "standard", "default"];

/// Keys of a metadata envelope around a channel record.
const CHANNEL_ENVELOPES: &[&str] = &["metadata", "meta"];

/// Keys of a results array whose first element is the channel record.
const CHANNEL_RESULT_LISTS: &[&str] = &["items", "results"];

fn aliases(paths: &[&str]) -> Vec<String> {
    paths.iter().map(|p| (*p).to_string()).collect()
}

/// Ordered alias paths for each [`Video`] field.
#[derive(Debug, Clone)]
pub struct VideoAliases {
    pub id: Vec<String>,
    pub url: Vec<String>,
    pub title: Vec<String>,
    pub description: Vec<String>,
    pub channel_id: Vec<String>,
    pub channel_title: Vec<String>,
    pub published_at: Vec<String>,
    pub published_relative: Vec<String>,
    pub view_count: Vec<String>,
    pub like_count: Vec<String>,
    pub comment_count: Vec<String>,
    /// ISO or clock strings, or a number of seconds.
    pub duration: Vec<String>,
    pub subscriber_count: Vec<String>,
    pub thumbnails: Vec<String>,
    pub keywords: Vec<String>,
    pub kind_tag: Vec<String>,
    pub short_flag: Vec<String>,
    pub video_count: Vec<String>,
}

impl Default for VideoAliases {
    fn default() -> Self {
        Self {
            id: aliases(&["id.videoId", "videoId", "video_id", "id"]),
            url: aliases(&[
                "url",
                "link",
                "watchUrl",
                "webpage_url",
                "navigationEndpoint.commandMetadata.webCommandMetadata.url",
            ]),
            title: aliases(&["snippet.title", "title", "name"]),
            description: aliases(&[
                "snippet.description",
                "description",
                "descriptionSnippet",
            ]),
            channel_id: aliases(&[
                "snippet.channelId",
                "channelId",
                "channel_id",
                "channel.id",
                "author.channelId",
            ]),
            channel_title: aliases(&[
                "snippet.channelTitle",
                "channelTitle",
                "channel_title",
                "channel.name",
                "author.name",
                "uploader",
            ]),
            published_at: aliases(&[
                "snippet.publishedAt",
                "publishedAt",
                "published_at",
                "uploadDate",
                "upload_date",
            ]),
            published_relative: aliases(&[
                "publishedTimeText",
                "publishedTime",
                "published",
                "uploaded",
            ]),
            view_count: aliases(&[
                "statistics.viewCount",
                "viewCount",
                "view_count",
                "views",
                "viewCountText",
            ]),
            like_count: aliases(&["statistics.likeCount", "likeCount", "like_count", "likes"]),
            comment_count: aliases(&[
                "statistics.commentCount",
                "commentCount",
                "comment_count",
                "comments",
            ]),
            duration: aliases(&[
                "contentDetails.duration",
                "duration",
                "lengthText",
                "length",
                "lengthSeconds",
            ]),
            subscriber_count: aliases(&[
                "statistics.subscriberCount",
                "subscriberCount",
                "subscriber_count",
                "subscribers",
                "channel.subscribers",
            ]),
            thumbnails: aliases(&[
                "snippet.thumbnails",
                "thumbnails",
                "thumbnail.thumbnails",
                "thumbnail",
                "thumbnailUrl",
                "thumbnail_url",
            ]),
            keywords: aliases(&["snippet.tags", "tags", "keywords"]),
            kind_tag: aliases(&["type", "resultType", "kind", "id.kind"]),
            short_flag: aliases(&["isShort", "is_short", "isShorts"]),
            video_count: aliases(&[
                "statistics.videoCount",
                "videoCount",
                "video_count",
                "videos",
            ]),
        }
    }
}

/// Ordered alias paths for each [`ChannelInfo`] field.
#[derive(Debug, Clone)]
pub struct ChannelAliases {
    pub channel_id: Vec<String>,
    pub title: Vec<String>,
    pub description: Vec<String>,
    pub subscriber_count: Vec<String>,
    pub video_count: Vec<String>,
    pub thumbnails: Vec<String>,
    pub banner: Vec<String>,
    pub country: Vec<String>,
    pub verified: Vec<String>,
    pub handle: Vec<String>,
}

impl Default for ChannelAliases {
    fn default() -> Self {
        Self {
            channel_id: aliases(&["channelId", "channel_id", "externalId", "snippet.channelId", "id"]),
            title: aliases(&["snippet.title", "title", "name"]),
            description: aliases(&["snippet.description", "description"]),
            subscriber_count: aliases(&[
                "statistics.subscriberCount",
                "subscriberCount",
                "subscriber_count",
                "subscribers",
                "subscriberCountText",
            ]),
            video_count: aliases(&[
                "statistics.videoCount",
                "videoCount",
                "video_count",
                "videos",
                "videosCountText",
            ]),
            thumbnails: aliases(&[
                "snippet.thumbnails",
                "thumbnails",
                "avatar.thumbnails",
                "avatar",
                "thumbnail",
                "thumbnailUrl",
            ]),
            banner: aliases(&[
                "brandingSettings.image.bannerExternalUrl",
                "banner.thumbnails",
                "banner",
                "bannerUrl",
                "banner_url",
            ]),
            country: aliases(&["snippet.country", "country"]),
            verified: aliases(&["verified", "isVerified", "is_verified"]),
            handle: aliases(&["snippet.customUrl", "handle", "customUrl", "vanityUrl"]),
        }
    }
}

/// Converts raw upstream records into canonical values.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    video: VideoAliases,
    channel: ChannelAliases,
}

impl Normalizer {
    pub fn new(video: VideoAliases, channel: ChannelAliases) -> Self {
        Self { video, channel }
    }

    pub fn video_aliases(&self) -> &VideoAliases {
        &self.video
    }

    pub fn channel_aliases(&self) -> &ChannelAliases {
        &self.channel
    }

    /// Normalize a video-like record, resolving relative dates against now.
    pub fn normalize_video(&self, raw: &RawValue) -> Video {
        self.normalize_video_at(raw, Utc::now())
    }

    /// Normalize a video-like record, resolving relative dates against `now`.
    pub fn normalize_video_at(&self, raw: &RawValue, now: DateTime<Utc>) -> Video {
        let a = &self.video;
        let x = FieldExtractor::new(raw);

        let kind = self.detect_kind(&x);
        let channel_id = x.string_or_default(&a.channel_id);
        let mut id = self.video_id(&x);
        if id.is_empty() && kind == VideoKind::Channel {
            id.clone_from(&channel_id);
        }

        let published_at = parse_published(
            x.string(&a.published_at).as_deref(),
            x.string(&a.published_relative).as_deref(),
            now,
        );

        Video {
            id,
            title: x.string_or_default(&a.title),
            description: x.string_or_default(&a.description),
            channel_id,
            channel_title: x.string_or_default(&a.channel_title),
            published_at,
            view_count: x.count(&a.view_count),
            like_count: x.count(&a.like_count),
            comment_count: x.count(&a.comment_count),
            duration: self.duration(&x),
            subscriber_count: x.count(&a.subscriber_count),
            thumbnail_url: thumbnail_url(&x, &a.thumbnails),
            keywords: x.string_set(&a.keywords),
            video_count: (kind == VideoKind::Channel).then(|| x.count(&a.video_count)),
            kind,
        }
    }

    /// Normalize a page of records, dropping those without an id.
    pub fn normalize_videos(&self, raws: &[RawValue]) -> Vec<Video> {
        let now = Utc::now();
        let videos: Vec<Video> = raws
            .iter()
            .map(|raw| self.normalize_video_at(raw, now))
            .filter(|video| !video.id.is_empty())
            .collect();
        let dropped = raws.len() - videos.len();
        if dropped > 0 {
            debug!(dropped, kept = videos.len(), "dropped records without an id");
        }
        videos
    }

    /// Normalize a channel-detail response.
    ///
    /// A metadata envelope or a results array around the record is unwrapped
    /// one level before fields are resolved.
    pub fn normalize_channel(&self, raw: &RawValue) -> ChannelInfo {
        let a = &self.channel;
        let x = FieldExtractor::new(unwrap_channel(raw));

        ChannelInfo {
            channel_id: x.string_or_default(&a.channel_id),
            title: x.string_or_default(&a.title),
            description: x.string_or_default(&a.description),
            subscriber_count: x.count(&a.subscriber_count),
            video_count: x.count(&a.video_count),
            thumbnail_url: thumbnail_url(&x, &a.thumbnails),
            banner_url: thumbnail_url(&x, &a.banner),
            country: x.string(&a.country),
            verified: x.flag(&a.verified).unwrap_or(false),
            handle: x.string_or_default(&a.handle),
        }
    }

    fn video_id(&self, x: &FieldExtractor<'_>) -> String {
        if let Some(id) = x.string(&self.video.id) {
            return id;
        }
        self.video
            .url
            .iter()
            .filter_map(|alias| x.string(std::slice::from_ref(alias)))
            .find_map(|url| extract_video_id(&url))
            .unwrap_or_default()
    }

    fn duration(&self, x: &FieldExtractor<'_>) -> String {
        let Some(value) = x.find(&self.video.duration, |v| {
            matches!(v, RawValue::Number(_)) || text_of(v).is_some()
        }) else {
            return String::new();
        };
        match value {
            RawValue::Number(seconds) if seconds.is_finite() && *seconds >= 0.0 => {
                duration_from_seconds(seconds.floor() as u64)
            }
            RawValue::Number(_) => String::new(),
            text => text_of(text)
                .map(|text| normalize_duration(&text))
                .unwrap_or_default(),
        }
    }

    /// Type tag, then short flag, then the shorts duration sentinel.
    fn detect_kind(&self, x: &FieldExtractor<'_>) -> VideoKind {
        let tagged = self
            .video
            .kind_tag
            .iter()
            .filter_map(|alias| x.string(std::slice::from_ref(alias)))
            .find_map(|tag| kind_from_tag(&tag));
        if let Some(kind) = tagged {
            return kind;
        }
        if x.flag(&self.video.short_flag) == Some(true) {
            return VideoKind::Short;
        }
        let sentinel = x
            .string(&self.video.duration)
            .is_some_and(|d| d.trim().eq_ignore_ascii_case(SHORTS_SENTINEL));
        if sentinel {
            return VideoKind::Short;
        }
        VideoKind::Video
    }
}

/// Normalize with the default alias tables.
pub fn normalize_video(raw: &RawValue) -> Video {
    Normalizer::default().normalize_video(raw)
}

/// Normalize with the default alias tables.
pub fn normalize_channel(raw: &RawValue) -> ChannelInfo {
    Normalizer::default().normalize_channel(raw)
}

/// Pull the 11-character video id out of a watch, short, embed or share URL.
pub fn extract_video_id(url: &str) -> Option<String> {
    WATCH_URL_ID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Recognized type tags; `None` for tags such as "youtube#searchResult".
fn kind_from_tag(tag: &str) -> Option<VideoKind> {
    let tag = tag.to_lowercase();
    if tag.contains("short") {
        Some(VideoKind::Short)
    } else if tag.contains("channel") {
        Some(VideoKind::Channel)
    } else if tag.contains("video") {
        Some(VideoKind::Video)
    } else {
        None
    }
}

fn unwrap_channel(raw: &RawValue) -> &RawValue {
    match raw {
        RawValue::Array(items) => items.first().unwrap_or(raw),
        RawValue::Map(map) => CHANNEL_ENVELOPES
            .iter()
            .filter_map(|key| map.get(*key))
            .find(|inner| inner.as_map().is_some())
            .or_else(|| {
                CHANNEL_RESULT_LISTS
                    .iter()
                    .filter_map(|key| map.get(*key)?.as_array()?.first())
                    .next()
            })
            .unwrap_or(raw),
        _ => raw,
    }
}

/// Highest-resolution image URL among the aliases.
///
/// Size-ordered arrays (last entry wins) and keyed size maps are preferred;
/// otherwise the first plain string alias is used.
fn thumbnail_url<S: AsRef<str>>(x: &FieldExtractor<'_>, aliases: &[S]) -> String {
    let structured = aliases
        .iter()
        .filter_map(|alias| x.record().path(alias.as_ref()))
        .find_map(|value| match value {
            RawValue::Array(items) => items.iter().rev().find_map(descriptor_url),
            RawValue::Map(map) => keyed_url(map),
            _ => None,
        });
    structured
        .or_else(|| {
            aliases
                .iter()
                .filter_map(|alias| x.record().path(alias.as_ref())?.as_str())
                .find(|url| !url.trim().is_empty())
                .map(str::to_string)
        })
        .unwrap_or_default()
}

fn descriptor_url(item: &RawValue) -> Option<String> {
    let url = match item {
        RawValue::String(url) => url.as_str(),
        RawValue::Map(map) => map.get("url")?.as_str()?,
        _ => return None,
    };
    (!url.trim().is_empty()).then(|| url.to_string())
}

fn keyed_url(map: &BTreeMap<String, RawValue>) -> Option<String> {
    if let Some(url) = map.get("url").and_then(descriptor_url) {
        return Some(url);
    }
    THUMBNAIL_SIZES
        .iter()
        .filter_map(|size| map.get(*size))
        .find_map(descriptor_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawValue {
        RawValue::from(value)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn data_api_search_item() {
        let record = raw(json!({
            "kind": "youtube#searchResult",
            "id": {"kind": "youtube#video", "videoId": "dQw4w9WgXcQ"},
            "snippet": {
                "publishedAt": "2009-10-25T06:57:33Z",
                "channelId": "UCuAXFkgsw1L7xaCfnd5JJOw",
                "title": "Never Gonna Give You Up",
                "description": "The official video",
                "channelTitle": "Rick Astley",
                "tags": ["rick", "80s"],
                "thumbnails": {
                    "default": {"url": "https://i.ytimg.com/vi/dQw4w9WgXcQ/default.jpg"},
                    "high": {"url": "https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg"}
                }
            },
            "statistics": {"viewCount": "1500000000", "likeCount": "17000000", "commentCount": "2300000"},
            "contentDetails": {"duration": "PT3M33S"}
        }));
        let video = normalize_video(&record);

        assert_eq!(video.id, "dQw4w9WgXcQ");
        assert_eq!(video.kind, VideoKind::Video);
        assert_eq!(video.title, "Never Gonna Give You Up");
        assert_eq!(video.channel_title, "Rick Astley");
        assert_eq!(video.view_count, 1_500_000_000);
        assert_eq!(video.like_count, 17_000_000);
        assert_eq!(video.comment_count, 2_300_000);
        assert_eq!(video.duration, "PT3M33S");
        assert_eq!(video.thumbnail_url, "https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg");
        assert_eq!(video.keywords.len(), 2);
        assert_eq!(
            video.published_at,
            Some(Utc.with_ymd_and_hms(2009, 10, 25, 6, 57, 33).unwrap())
        );
        assert_eq!(video.video_count, None);
    }

    #[test]
    fn scraped_item_with_relative_date_and_suffixes() {
        let record = raw(json!({
            "type": "video",
            "videoId": "abcdefghijk",
            "title": {"runs": [{"text": "Scraped title"}]},
            "viewCountText": {"simpleText": "조회수 3.4만회"},
            "publishedTimeText": {"simpleText": "3일 전"},
            "lengthText": {"simpleText": "12:05"},
            "thumbnail": {"thumbnails": [
                {"url": "https://img/small.jpg", "width": 120},
                {"url": "https://img/large.jpg", "width": 720}
            ]}
        }));
        let video = Normalizer::default().normalize_video_at(&record, now());

        assert_eq!(video.id, "abcdefghijk");
        assert_eq!(video.title, "Scraped title");
        assert_eq!(video.view_count, 34_000);
        assert_eq!(video.published_at, Some(now() - Duration::days(3)));
        assert_eq!(video.duration, "PT12M5S");
        assert_eq!(video.thumbnail_url, "https://img/large.jpg");
    }

    #[test]
    fn id_falls_back_to_watch_url() {
        let record = raw(json!({
            "title": "No id here",
            "url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42"
        }));
        assert_eq!(normalize_video(&record).id, "dQw4w9WgXcQ");

        let share = raw(json!({"link": "https://youtu.be/abcdefghijk"}));
        assert_eq!(normalize_video(&share).id, "abcdefghijk");
    }

    #[test]
    fn empty_record_degrades_to_defaults() {
        let video = normalize_video(&RawValue::Null);
        assert_eq!(video, Video::default());

        let video = normalize_video(&raw(json!({})));
        assert!(video.id.is_empty());
        assert_eq!(video.view_count, 0);
        assert_eq!(video.duration, "");
        assert_eq!(video.published_at, None);
        assert_eq!(video.kind, VideoKind::Video);
    }

    #[test]
    fn mistyped_fields_degrade_individually() {
        let record = raw(json!({
            "id": "abcdefghijk",
            "title": 12,
            "viewCount": "lots",
            "likeCount": [1, 2],
            "duration": "live now",
            "publishedAt": "someday"
        }));
        let video = normalize_video(&record);
        assert_eq!(video.id, "abcdefghijk");
        assert_eq!(video.title, "");
        assert_eq!(video.view_count, 0);
        assert_eq!(video.like_count, 0);
        assert_eq!(video.duration, "");
        assert_eq!(video.published_at, None);
    }

    #[test]
    fn text_object_duration_beats_later_numeric_alias() {
        let record = raw(json!({
            "id": "x",
            "lengthText": {"simpleText": "4:05"},
            "lengthSeconds": 999
        }));
        assert_eq!(normalize_video(&record).duration, "PT4M5S");
    }

    #[test]
    fn numeric_duration_is_seconds() {
        let record = raw(json!({"id": "x", "duration": 3725}));
        assert_eq!(normalize_video(&record).duration, "PT1H2M5S");
    }

    #[test]
    fn kind_detection_precedence() {
        let tagged = raw(json!({"id": "a", "type": "SHORTS", "isShort": false}));
        assert_eq!(normalize_video(&tagged).kind, VideoKind::Short);

        let flagged = raw(json!({"id": "a", "isShort": true}));
        assert_eq!(normalize_video(&flagged).kind, VideoKind::Short);

        let sentinel = raw(json!({"id": "a", "duration": "SHORTS"}));
        let video = normalize_video(&sentinel);
        assert_eq!(video.kind, VideoKind::Short);
        assert_eq!(video.duration, "PT0S");

        let video_tag_wins = raw(json!({"id": "a", "type": "video", "isShort": true}));
        assert_eq!(normalize_video(&video_tag_wins).kind, VideoKind::Video);

        let unknown_tag = raw(json!({"id": "a", "type": "playlist", "isShort": true}));
        assert_eq!(normalize_video(&unknown_tag).kind, VideoKind::Short);

        let search_channel = raw(json!({
            "kind": "youtube#searchResult",
            "id": {"kind": "youtube#channel", "channelId": "UCx"},
            "snippet": {"channelId": "UCx"}
        }));
        let video = normalize_video(&search_channel);
        assert_eq!(video.kind, VideoKind::Channel);
        assert_eq!(video.id, "UCx");
    }

    #[test]
    fn channel_kind_results_carry_video_count() {
        let record = raw(json!({
            "type": "channel",
            "channelId": "UC123",
            "title": "A channel",
            "subscriberCount": "1.2M",
            "videoCount": "340"
        }));
        let video = normalize_video(&record);
        assert_eq!(video.kind, VideoKind::Channel);
        assert_eq!(video.id, "UC123");
        assert_eq!(video.subscriber_count, 1_200_000);
        assert_eq!(video.video_count, Some(340));
    }

    #[test]
    fn page_normalization_drops_idless_records() {
        let page = vec![
            raw(json!({"id": "abcdefghijk", "title": "kept"})),
            raw(json!({"title": "dropped"})),
            raw(json!({"url": "https://www.youtube.com/shorts/shortsid123"})),
        ];
        let videos = Normalizer::default().normalize_videos(&page);
        assert_eq!(videos.len(), 2);
        assert_eq!(videos[1].id, "shortsid123");
    }

    #[test]
    fn custom_aliases_are_honoured() {
        let mut video_aliases = VideoAliases::default();
        video_aliases.title = vec!["headline".to_string()];
        let normalizer = Normalizer::new(video_aliases, ChannelAliases::default());
        let record = raw(json!({"id": "a", "title": "ignored", "headline": "used"}));
        assert_eq!(normalizer.normalize_video(&record).title, "used");
    }

    #[test]
    fn channel_in_metadata_envelope() {
        let record = raw(json!({
            "metadata": {
                "channelId": "UC123",
                "title": "Envelope",
                "subscriberCount": "2만",
                "videoCount": 120,
                "avatar": {"thumbnails": [{"url": "https://a/s.jpg"}, {"url": "https://a/l.jpg"}]},
                "banner": "https://b/banner.jpg",
                "country": "KR",
                "isVerified": "true",
                "handle": "@envelope"
            }
        }));
        let channel = normalize_channel(&record);
        assert_eq!(channel.channel_id, "UC123");
        assert_eq!(channel.title, "Envelope");
        assert_eq!(channel.subscriber_count, 20_000);
        assert_eq!(channel.video_count, 120);
        assert_eq!(channel.thumbnail_url, "https://a/l.jpg");
        assert_eq!(channel.banner_url, "https://b/banner.jpg");
        assert_eq!(channel.country.as_deref(), Some("KR"));
        assert!(channel.verified);
        assert_eq!(channel.handle, "@envelope");
    }

    #[test]
    fn channel_as_first_result() {
        let listed = raw(json!({"items": [
            {"id": "UCfirst", "snippet": {"title": "First", "customUrl": "@first"},
             "statistics": {"subscriberCount": "1000", "videoCount": "10"}},
            {"id": "UCsecond"}
        ]}));
        let channel = normalize_channel(&listed);
        assert_eq!(channel.channel_id, "UCfirst");
        assert_eq!(channel.title, "First");
        assert_eq!(channel.handle, "@first");
        assert_eq!(channel.subscriber_count, 1000);

        let bare = raw(json!([{"channelId": "UCbare"}]));
        assert_eq!(normalize_channel(&bare).channel_id, "UCbare");
    }

    #[test]
    fn channel_missing_everything() {
        let channel = normalize_channel(&raw(json!({"unrelated": true})));
        assert_eq!(channel, ChannelInfo::default());
    }

    #[test]
    fn video_id_extraction() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(extract_video_id("https://example.com/watch?v=short"), None);
    }
}

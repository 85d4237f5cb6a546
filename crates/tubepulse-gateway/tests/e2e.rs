// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests: quota gate, admission queue, normalization and
//! background usage counting against temp SQLite and a mock upstream.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::task::JoinSet;
use tubepulse_config::model::QuotaConfig;
use tubepulse_core::{AccountQuota, HealthStatus, QuotaOutcome, UNRESOLVABLE_LIMIT, VideoKind};
use tubepulse_quota::QuotaTracker;
use tubepulse_test_utils::{MemoryStore, Reply, TestHarness};

fn search_page() -> Reply {
    Reply::json(json!([
        {
            "id": {"kind": "youtube#video", "videoId": "dQw4w9WgXcQ"},
            "snippet": {
                "title": "Official video",
                "channelId": "UC1",
                "channelTitle": "Label",
                "publishedAt": "2024-01-01T00:00:00Z",
                "thumbnails": {"default": {"url": "d.jpg"}, "high": {"url": "h.jpg"}}
            },
            "statistics": {"viewCount": "1500000"},
            "contentDetails": {"duration": "PT3M33S"}
        },
        {
            "title": {"runs": [{"text": "Scraped "}, {"text": "result"}]},
            "url": "https://www.youtube.com/shorts/abcdefghijk",
            "viewCountText": {"simpleText": "2.3만회"},
            "isShort": true
        },
        {}
    ]))
}

#[tokio::test]
async fn search_normalizes_mixed_records_and_counts_usage() {
    let harness = TestHarness::builder()
        .with_account("alice", 10)
        .with_replies(vec![search_page()])
        .build()
        .await
        .unwrap();

    let videos = harness
        .search("alice", "never gonna")
        .await
        .unwrap()
        .into_value()
        .unwrap();

    assert_eq!(videos.len(), 2);
    assert_eq!(videos[0].id, "dQw4w9WgXcQ");
    assert_eq!(videos[0].view_count, 1_500_000);
    assert_eq!(videos[0].thumbnail_url, "h.jpg");
    assert_eq!(videos[0].duration, "PT3M33S");
    assert_eq!(videos[1].id, "abcdefghijk");
    assert_eq!(videos[1].title, "Scraped result");
    assert_eq!(videos[1].view_count, 23_000);
    assert_eq!(videos[1].kind, VideoKind::Short);

    harness.flush().await;
    let account = harness.account("alice").await.unwrap().unwrap();
    assert_eq!(account.remaining_today, Some(9));
    assert_eq!(harness.upstream.requests().await, vec!["search:never gonna"]);
}

#[tokio::test]
async fn daily_limit_denies_after_exhaustion() {
    let harness = TestHarness::builder()
        .with_account("alice", 3)
        .build()
        .await
        .unwrap();

    let mut remaining = Vec::new();
    for _ in 0..3 {
        let call = harness.search("alice", "q").await.unwrap();
        assert!(!call.is_denied());
        harness.flush().await;
        remaining.push(harness.account("alice").await.unwrap().unwrap().remaining_today);
    }
    assert_eq!(remaining, vec![Some(2), Some(1), Some(0)]);

    let denied = harness.search("alice", "q").await.unwrap();
    assert!(denied.is_denied());
    let status = denied.status();
    assert_eq!((status.used, status.limit, status.remaining), (3, 3, 0));
    assert_eq!(status.outcome(), QuotaOutcome::Exhausted);
    assert_eq!(harness.upstream.requests().await.len(), 3);
}

#[tokio::test]
async fn blocked_account_never_reaches_upstream() {
    let mut banned = AccountQuota::new("mallory", 10);
    banned.is_banned = true;
    let harness = TestHarness::builder()
        .with_account_record(banned)
        .build()
        .await
        .unwrap();

    let call = harness.channel("mallory", "UC1").await.unwrap();
    assert_eq!(call.status().outcome(), QuotaOutcome::Blocked);
    assert_ne!(
        QuotaOutcome::Blocked.user_message(),
        QuotaOutcome::Exhausted.user_message()
    );
    assert!(harness.upstream.requests().await.is_empty());
}

#[tokio::test]
async fn unknown_identity_is_recreated_with_default_limit() {
    let harness = TestHarness::builder()
        .with_default_daily_limit(7)
        .with_replies(vec![Reply::json(json!({
            "metadata": {"externalId": "UC9", "title": "Channel", "subscriberCountText": "1.2K subscribers"}
        }))])
        .build()
        .await
        .unwrap();

    let call = harness.channel("newcomer", "UC9").await.unwrap();
    assert_eq!(call.status().limit, 7);
    let channel = call.into_value().unwrap();
    assert_eq!(channel.channel_id, "UC9");
    assert_eq!(channel.subscriber_count, 1_200);
}

#[tokio::test]
async fn rate_limited_upstream_propagates_and_is_not_counted() {
    let harness = TestHarness::builder()
        .with_account("alice", 5)
        .with_replies(vec![Reply::failure("quotaExceeded", Some(429))])
        .build()
        .await
        .unwrap();

    let err = harness.search("alice", "q").await.unwrap_err();
    assert!(err.is_rate_limited());
    harness.flush().await;

    assert_eq!(harness.upstream.requests().await.len(), 1);
    let status = harness.gateway.quota().check("alice").await.unwrap();
    assert_eq!(status.used, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_respect_the_admission_limit() {
    let harness = Arc::new(
        TestHarness::builder()
            .with_max_concurrent(2)
            .with_upstream_latency(Duration::from_millis(40))
            .build()
            .await
            .unwrap(),
    );

    let mut set = JoinSet::new();
    for i in 0..8 {
        let harness = harness.clone();
        set.spawn(async move { harness.search(&format!("user-{i}"), "q").await });
    }
    let mut completed = 0;
    while let Some(joined) = set.join_next().await {
        assert!(!joined.unwrap().unwrap().is_denied());
        completed += 1;
    }

    assert_eq!(completed, 8);
    assert!(harness.upstream.peak_concurrency() <= 2);
    assert_eq!(harness.upstream.requests().await.len(), 8);
    assert_eq!(harness.gateway.health().readiness, HealthStatus::Healthy);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn health_degrades_while_requests_wait() {
    let harness = Arc::new(
        TestHarness::builder()
            .with_account("alice", 100)
            .with_max_concurrent(1)
            .with_upstream_latency(Duration::from_millis(300))
            .build()
            .await
            .unwrap(),
    );

    let mut set = JoinSet::new();
    for _ in 0..3 {
        let harness = harness.clone();
        set.spawn(async move { harness.search("alice", "q").await });
    }
    tokio::time::sleep(Duration::from_millis(150)).await;

    let health = harness.gateway.health();
    assert_eq!(health.max_concurrent, 1);
    assert_eq!(health.active_requests, 1);
    assert_eq!(health.utilization_percent, 100.0);
    assert!(matches!(health.readiness, HealthStatus::Degraded(_)));

    while let Some(joined) = set.join_next().await {
        joined.unwrap().unwrap();
    }
    let health = harness.gateway.health();
    assert_eq!(health.active_requests, 0);
    assert_eq!(health.readiness, HealthStatus::Healthy);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn in_memory_store_counts_concurrent_increments_exactly() {
    let store = Arc::new(
        MemoryStore::new()
            .with_account(AccountQuota::new("alice", 1_000))
            .await,
    );
    let tracker =
        Arc::new(QuotaTracker::new(store.clone(), store.clone(), &QuotaConfig::default()).unwrap());

    const K: i64 = 100;
    let mut set = JoinSet::new();
    for _ in 0..K {
        let tracker = tracker.clone();
        set.spawn(async move { tracker.increment("alice", None).await.unwrap() });
    }
    while let Some(joined) = set.join_next().await {
        joined.unwrap();
    }

    let status = tracker.check("alice").await.unwrap();
    assert_eq!(status.used, K);
    assert_eq!(status.remaining, 1_000 - K);
}

#[tokio::test]
async fn unrecoverable_identity_maps_to_reauthentication() {
    let store = Arc::new(MemoryStore::new());
    store.fail_account_writes(true);
    let tracker = QuotaTracker::new(store.clone(), store.clone(), &QuotaConfig::default())
        .unwrap()
        .with_recovery_policy(tubepulse_resilience::RetryPolicy::once());

    let status = tracker.check("ghost").await.unwrap();
    assert_eq!(status.limit, UNRESOLVABLE_LIMIT);
    assert_eq!(status.outcome(), QuotaOutcome::Unresolvable);
}

#[tokio::test]
async fn account_deleted_mid_day_is_recreated_without_losing_usage() {
    let store = Arc::new(
        MemoryStore::new()
            .with_account(AccountQuota::new("alice", 5))
            .await,
    );
    let tracker = QuotaTracker::new(store.clone(), store.clone(), &QuotaConfig::default()).unwrap();
    tracker.increment("alice", None).await.unwrap();

    store.remove_account("alice").await;
    let status = tracker.check("alice").await.unwrap();
    assert_eq!(status.limit, QuotaConfig::default().default_daily_limit);
    assert_eq!(status.used, 1);
    assert!(status.allowed);
}

#[tokio::test]
async fn ranked_search_orders_by_views_per_hour() {
    let now = chrono::Utc::now();
    let published = |hours: i64| (now - chrono::Duration::hours(hours)).to_rfc3339();
    let harness = TestHarness::builder()
        .with_account("alice", 10)
        .with_replies(vec![Reply::json(json!([
            {"videoId": "slowburn001", "viewCount": 10_000, "publishedAt": published(72)},
            {"videoId": "breakout002", "viewCount": 100_000, "publishedAt": published(2)},
            {"videoId": "tiny0000003", "viewCount": 10, "publishedAt": published(5)}
        ]))])
        .build()
        .await
        .unwrap();

    let ranked = harness
        .gateway
        .search_ranked(harness.upstream.as_ref(), "alice", "trending")
        .await
        .unwrap()
        .into_value()
        .unwrap();

    let ids: Vec<&str> = ranked.iter().map(|(video, _)| video.id.as_str()).collect();
    assert_eq!(ids, vec!["breakout002", "slowburn001", "tiny0000003"]);
    assert!(ranked[0].1 > ranked[1].1);
    assert_eq!(ranked[2].1, 0);

    harness.flush().await;
    let account = harness.account("alice").await.unwrap().unwrap();
    assert_eq!(account.remaining_today, Some(9));
}

//! Integration tests for per-contributor activity collection using wiremock

mod support;

use chrono::Utc;
use core::time::Duration;
use std::sync::Arc;
use contrib_board_lib::facts::{ActivityCollector, ActivitySummary, BatchExecutor, BatchPolicy, Client, PipelineConfig, Throttler};
use serde_json::json;
use support::{commits, days_ago, fast_config, mount_json, mount_status, shas};
use wiremock::matchers::{method, path, path_regex, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REPO: &str = "/repos/acme/widgets";

fn collector(config: &PipelineConfig) -> ActivityCollector {
    collector_with_throttler(config, Throttler::new(config.max_concurrent_requests))
}

fn collector_with_throttler(config: &PipelineConfig, throttler: Arc<Throttler>) -> ActivityCollector {
    let client = Client::new(None, config.api_base_url.as_str()).expect("client");
    let executor = BatchExecutor::new(BatchPolicy::from_config(config), throttler);
    ActivityCollector::new(client, executor, config)
}

async fn mount_history_page(server: &MockServer, page: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("{REPO}/commits")))
        .and(query_param("page", page))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_recent(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("{REPO}/commits")))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_stats(server: &MockServer, additions: u64, deletions: u64) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/repos/acme/widgets/commits/[0-9a-z]+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sha": "ignored",
            "stats": {"additions": additions, "deletions": deletions, "total": additions + deletions}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_collects_full_activity() {
    let server = MockServer::start().await;
    let last_commit = days_ago(3);

    mount_json(
        &server,
        &format!("{REPO}/pulls"),
        json!([
            {"user": {"login": "alice"}, "merged_at": "2024-05-01T10:00:00Z"},
            {"user": {"login": "alice"}, "merged_at": null},
            {"user": {"login": "mallory"}, "merged_at": "2024-05-02T10:00:00Z"},
        ]),
    )
    .await;
    mount_recent(&server, commits(&shas("r", 4), last_commit)).await;
    mount_history_page(&server, "1", commits(&shas("h", 6), days_ago(40))).await;
    mount_stats(&server, 7, 3).await;
    mount_json(
        &server,
        &format!("{REPO}/pulls/comments"),
        json!([{"user": {"login": "alice"}}, {"user": {"login": "bob"}}, {"user": null}]),
    )
    .await;

    let summary = collector(&fast_config(&server, "acme")).collect("alice", "widgets", Utc::now()).await;

    assert_eq!(summary.prs, 2);
    assert_eq!(summary.merged_prs, 1);
    assert_eq!(summary.recent_commits, 4);
    assert_eq!(summary.last_activity.map(|t| t.timestamp()), Some(last_commit.timestamp()));
    assert_eq!(summary.total_commits, 6);
    assert_eq!(summary.commits_analyzed, 6);
    assert_eq!(summary.commits_dropped, 0);
    assert_eq!(summary.additions, 42);
    assert_eq!(summary.deletions, 18);
    assert_eq!(summary.changes, 60);
    assert_eq!(summary.reviews, 1);
}

#[tokio::test]
async fn test_failing_pulls_endpoint_yields_zero_summary() {
    let server = MockServer::start().await;

    mount_status(&server, &format!("{REPO}/pulls"), 500).await;
    mount_recent(&server, commits(&shas("r", 2), days_ago(1))).await;
    mount_history_page(&server, "1", commits(&shas("h", 2), days_ago(1))).await;
    mount_stats(&server, 1, 1).await;
    mount_json(&server, &format!("{REPO}/pulls/comments"), json!([])).await;

    let summary = collector(&fast_config(&server, "acme")).collect("alice", "widgets", Utc::now()).await;

    assert_eq!(summary, ActivitySummary::default());
}

#[tokio::test]
async fn test_history_pagination_and_analysis_limit() {
    let server = MockServer::start().await;

    mount_json(&server, &format!("{REPO}/pulls"), json!([])).await;
    mount_recent(&server, json!([])).await;
    mount_history_page(&server, "1", commits(&shas("a", 100), days_ago(400))).await;
    mount_history_page(&server, "2", commits(&shas("b", 20), days_ago(500))).await;
    mount_stats(&server, 1, 0).await;
    mount_json(&server, &format!("{REPO}/pulls/comments"), json!([])).await;

    let config = PipelineConfig {
        commit_analysis_limit: 50,
        batch_size: 7,
        ..fast_config(&server, "acme")
    };
    let summary = collector(&config).collect("alice", "widgets", Utc::now()).await;

    assert_eq!(summary.total_commits, 120);
    assert_eq!(summary.commits_analyzed, 50);
    assert_eq!(summary.additions, 50);
    assert_eq!(summary.recent_commits, 0);
    assert!(summary.last_activity.is_none());

    let detail_requests = server
        .received_requests()
        .await
        .expect("request recording is enabled")
        .into_iter()
        .filter(|r| r.url.path().starts_with(&format!("{REPO}/commits/")))
        .count();
    assert_eq!(detail_requests, 50);
}

#[tokio::test]
async fn test_history_page_failure_keeps_earlier_pages() {
    let server = MockServer::start().await;

    mount_json(&server, &format!("{REPO}/pulls"), json!([])).await;
    mount_recent(&server, json!([])).await;
    mount_history_page(&server, "1", commits(&shas("a", 100), days_ago(10))).await;
    Mock::given(method("GET"))
        .and(path(format!("{REPO}/commits")))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;
    mount_stats(&server, 2, 2).await;
    mount_json(&server, &format!("{REPO}/pulls/comments"), json!([])).await;

    let summary = collector(&fast_config(&server, "acme")).collect("alice", "widgets", Utc::now()).await;

    assert_eq!(summary.total_commits, 100);
    assert_eq!(summary.changes, 400);
}

#[tokio::test]
async fn test_failing_commit_detail_counts_as_zero() {
    let server = MockServer::start().await;

    mount_json(&server, &format!("{REPO}/pulls"), json!([])).await;
    mount_recent(&server, json!([])).await;
    mount_history_page(&server, "1", commits(&shas("c", 5), days_ago(10))).await;

    // Outranks the catch-all detail mock below.
    Mock::given(method("GET"))
        .and(path(format!("{REPO}/commits/c0002")))
        .respond_with(ResponseTemplate::new(500))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_stats(&server, 10, 5).await;
    mount_json(&server, &format!("{REPO}/pulls/comments"), json!([])).await;

    let config = PipelineConfig {
        retry_attempts: 2,
        ..fast_config(&server, "acme")
    };
    let summary = collector(&config).collect("alice", "widgets", Utc::now()).await;

    assert_eq!(summary.commits_analyzed, 5);
    assert_eq!(summary.commits_dropped, 1);
    assert_eq!(summary.additions, 40);
    assert_eq!(summary.changes, 60);

    let failing_requests = server
        .received_requests()
        .await
        .expect("request recording is enabled")
        .into_iter()
        .filter(|r| r.url.path() == format!("{REPO}/commits/c0002"))
        .count();
    assert_eq!(failing_requests, 3);
}

#[tokio::test]
async fn test_collection_waits_for_rate_limit_pause() {
    let server = MockServer::start().await;

    mount_json(&server, &format!("{REPO}/pulls"), json!([{"user": {"login": "alice"}, "merged_at": null}])).await;
    mount_recent(&server, json!([])).await;
    mount_history_page(&server, "1", json!([])).await;
    mount_json(&server, &format!("{REPO}/pulls/comments"), json!([])).await;

    let config = fast_config(&server, "acme");
    let throttler = Throttler::new(config.max_concurrent_requests);
    let collector = collector_with_throttler(&config, Arc::clone(&throttler));

    assert!(throttler.pause_for(Duration::from_millis(300)));
    let start = tokio::time::Instant::now();
    let summary = collector.collect("alice", "widgets", Utc::now()).await;

    assert!(start.elapsed() >= Duration::from_millis(250));
    assert_eq!(summary.prs, 1);
}

#[tokio::test]
async fn test_rate_limited_listing_pauses_shared_throttler() {
    let server = MockServer::start().await;
    let reset = (Utc::now() + chrono::Duration::minutes(10)).timestamp().to_string();

    Mock::given(method("GET"))
        .and(path(format!("{REPO}/pulls")))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("x-ratelimit-reset", reset.as_str()),
        )
        .mount(&server)
        .await;

    let config = PipelineConfig {
        max_rate_limit_wait: Duration::from_millis(200),
        ..fast_config(&server, "acme")
    };
    let throttler = Throttler::new(config.max_concurrent_requests);
    let collector = collector_with_throttler(&config, Arc::clone(&throttler));

    let summary = collector.collect("alice", "widgets", Utc::now()).await;

    assert_eq!(summary, ActivitySummary::default());
    assert!(throttler.is_paused());

    let start = tokio::time::Instant::now();
    let _ = collector.collect("alice", "widgets", Utc::now()).await;
    assert!(start.elapsed() >= Duration::from_millis(100));
}

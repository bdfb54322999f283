//! Shared helpers for integration tests against a mock GitHub API

#![allow(dead_code, reason = "not every test binary uses every helper")]

use chrono::{DateTime, Duration, Utc};
use contrib_board_lib::facts::PipelineConfig;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Configuration pointing at `server` with all pacing delays removed
pub fn fast_config(server: &MockServer, organization: &str) -> PipelineConfig {
    PipelineConfig {
        organization: organization.to_string(),
        api_base_url: server.uri(),
        rate_limit_delay: core::time::Duration::from_millis(1),
        activity_delay: core::time::Duration::ZERO,
        profile_delay: core::time::Duration::ZERO,
        page_delay: core::time::Duration::ZERO,
        ..PipelineConfig::default()
    }
}

pub fn days_ago(days: i64) -> DateTime<Utc> {
    Utc::now() - Duration::days(days)
}

/// Commit listing entries with the given SHAs, all authored at `date`
pub fn commits(shas: &[String], date: DateTime<Utc>) -> Value {
    Value::Array(
        shas.iter()
            .map(|sha| json!({"sha": sha, "commit": {"author": {"name": "someone", "date": date.to_rfc3339()}}}))
            .collect(),
    )
}

pub fn shas(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{prefix}{i:04}")).collect()
}

pub fn contributor(login: &str, id: u64, contributions: u64, account_type: &str) -> Value {
    json!({
        "login": login,
        "id": id,
        "avatar_url": format!("https://avatars.example/{login}"),
        "html_url": format!("https://github.com/{login}"),
        "contributions": contributions,
        "type": account_type,
    })
}

pub async fn mount_json(server: &MockServer, endpoint: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub async fn mount_status(server: &MockServer, endpoint: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

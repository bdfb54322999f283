//! Integration tests for the GitHub client using wiremock

use contrib_board_lib::facts::{Client, RemoteError, Repository};
use reqwest::StatusCode;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_token_and_media_type_are_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/orgs/acme/repos"))
        .and(header("authorization", "token secret"))
        .and(header("accept", "application/vnd.github.v3+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"name": "widgets"}])))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(Some("secret"), server.uri()).expect("client");

    let repos: Vec<Repository> = client.get("/orgs/acme/repos").await.expect("request succeeds");
    assert_eq!(repos.len(), 1);
    assert_eq!(repos[0].name, "widgets");
}

#[tokio::test]
async fn test_exhausted_quota_is_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/alice"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("x-ratelimit-reset", "1700000000"),
        )
        .mount(&server)
        .await;

    let client = Client::new(None, server.uri()).expect("client");
    let err = client.get::<serde_json::Value>("/users/alice").await.expect_err("quota is exhausted");

    assert!(err.is_rate_limited());
    assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
    match err {
        RemoteError::RateLimited { reset_at, .. } => assert_eq!(reset_at.map(|t| t.timestamp()), Some(1_700_000_000)),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_plain_forbidden_is_not_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/orgs/secret/repos"))
        .respond_with(ResponseTemplate::new(403).insert_header("x-ratelimit-remaining", "4000"))
        .mount(&server)
        .await;

    let client = Client::new(None, server.uri()).expect("client");
    let err = client.get::<serde_json::Value>("/orgs/secret/repos").await.expect_err("forbidden");

    assert!(!err.is_rate_limited());
    assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/alice"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = Client::new(None, server.uri()).expect("client");
    let err = client.get::<serde_json::Value>("/users/alice").await.expect_err("decode fails");

    assert!(matches!(err, RemoteError::Decode(_)));
    assert_eq!(err.status(), None);
}

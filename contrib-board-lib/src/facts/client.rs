//! GitHub API client
//!
//! Minimal GitHub REST client: issues authenticated GET requests, decodes JSON bodies,
//! and classifies non-success responses into [`RemoteError`].

use chrono::{DateTime, Utc};
use core::error::Error;
use core::fmt::{Display, Formatter};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, LINK, RETRY_AFTER};
use serde::de::DeserializeOwned;

const LOG_TARGET: &str = "    client";
const USER_AGENT: &str = "contrib-board";
const GITHUB_V3_MEDIA_TYPE: &str = "application/vnd.github.v3+json";

/// Rate limit information from response headers
#[derive(Debug, Clone, Copy)]
struct RateLimitInfo {
    remaining: usize,
    reset_at: DateTime<Utc>,
}

/// Failure of a single API call
#[derive(Debug)]
pub enum RemoteError {
    /// The server answered with a non-success status.
    Status { status: StatusCode, reason: String },

    /// The server refused the request because the rate limit is exhausted.
    RateLimited { status: StatusCode, reset_at: Option<DateTime<Utc>> },

    /// The request never produced a response.
    Transport(reqwest::Error),

    /// The response body was not the JSON we expected.
    Decode(reqwest::Error),
}

impl RemoteError {
    /// HTTP status of the failed response, if one was received.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } | Self::RateLimited { status, .. } => Some(*status),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }

    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Status { status, reason } => write!(f, "GitHub API error: {} {reason}", status.as_u16()),
            Self::RateLimited { status, reset_at: Some(reset_at) } => {
                write!(f, "GitHub API rate limit exceeded ({}), resets at {}", status.as_u16(), reset_at.format("%T"))
            }
            Self::RateLimited { status, reset_at: None } => write!(f, "GitHub API rate limit exceeded ({})", status.as_u16()),
            Self::Transport(e) => write!(f, "GitHub API request failed: {e}"),
            Self::Decode(e) => write!(f, "could not decode GitHub API response: {e}"),
        }
    }
}

impl Error for RemoteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport(e) | Self::Decode(e) => Some(e),
            Self::Status { .. } | Self::RateLimited { .. } => None,
        }
    }
}

/// One page of a paginated listing
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_next: bool,
}

/// GitHub API client
#[derive(Debug, Clone)]
#[expect(clippy::struct_field_names, reason = "client field stores the underlying HTTP client")]
pub struct Client {
    client: reqwest::Client,
    base_url: String,
}

impl Client {
    /// Create a new client with an optional authentication token and base URL
    pub fn new(token: Option<&str>, base_url: impl Into<String>) -> crate::Result<Self> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_V3_MEDIA_TYPE));

        if let Some(t) = token {
            let mut auth_val = HeaderValue::from_str(&format!("token {t}"))?;
            auth_val.set_sensitive(true);
            let _ = headers.insert(AUTHORIZATION, auth_val);
        } else {
            log::info!(target: LOG_TARGET, "No GitHub token configured, requests are subject to anonymous rate limits");
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Fetch `endpoint` (a path such as `/orgs/foo/repos?per_page=100`) and decode the JSON body.
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, RemoteError> {
        let resp = self.send(endpoint).await?;
        resp.json().await.map_err(RemoteError::Decode)
    }

    /// Fetch one page of a listing, noting whether the `Link` header advertises another page.
    pub async fn get_page<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Page<T>, RemoteError> {
        let resp = self.send(endpoint).await?;
        let has_next = has_next_page(resp.headers());
        let items = resp.json().await.map_err(RemoteError::Decode)?;
        Ok(Page { items, has_next })
    }

    async fn send(&self, endpoint: &str) -> Result<reqwest::Response, RemoteError> {
        let url = format!("{}{endpoint}", self.base_url);
        log::trace!(target: LOG_TARGET, "GET {url}");

        let resp = self.client.get(&url).send().await.map_err(RemoteError::Transport)?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let error = classify_failure(status, resp.headers(), Utc::now());
        log::debug!(target: LOG_TARGET, "GET {url} failed: {error}");
        Err(error)
    }
}

/// Turn a non-success response into a [`RemoteError`].
///
/// GitHub signals exhausted quota with 429, or with 403 plus either `x-ratelimit-remaining: 0`
/// or a `Retry-After` header. Any other 403 is a plain permission failure.
fn classify_failure(status: StatusCode, headers: &HeaderMap, now: DateTime<Utc>) -> RemoteError {
    if matches!(status, StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS) {
        let rate_limit = extract_rate_limit_from_headers(headers);
        let retry_after = parse_retry_after(headers);
        let quota_exhausted = rate_limit.is_some_and(|rl| rl.remaining == 0);

        if status == StatusCode::TOO_MANY_REQUESTS || quota_exhausted || retry_after.is_some() {
            let reset_at = retry_after
                .and_then(chrono::Duration::try_seconds)
                .and_then(|delay| now.checked_add_signed(delay))
                .or_else(|| rate_limit.map(|rl| rl.reset_at));
            return RemoteError::RateLimited { status, reset_at };
        }
    }

    RemoteError::Status {
        status,
        reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
    }
}

/// Parse the `Retry-After` header value as a non-negative number of seconds.
fn parse_retry_after(headers: &HeaderMap) -> Option<i64> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .parse::<i64>()
        .ok()
        .filter(|secs| *secs >= 0)
}

/// Extract rate limit information from API response headers
fn extract_rate_limit_from_headers(headers: &HeaderMap) -> Option<RateLimitInfo> {
    let remaining = headers.get("x-ratelimit-remaining")?.to_str().ok()?.parse::<usize>().ok()?;
    let reset_timestamp = headers.get("x-ratelimit-reset")?.to_str().ok()?.parse::<i64>().ok()?;
    let reset_at = DateTime::from_timestamp(reset_timestamp, 0)?;

    Some(RateLimitInfo { remaining, reset_at })
}

fn has_next_page(headers: &HeaderMap) -> bool {
    headers
        .get(LINK)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|link| link.contains(r#"rel="next""#))
}

//! Wire types for the GitHub REST endpoints the pipeline reads.
//!
//! Only the fields we consume are declared; serde ignores the rest.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// An organization repository
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub disabled: bool,
}

impl Repository {
    /// Archived and disabled repositories are not scanned.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.archived && !self.disabled
    }
}

/// Account kind as reported in the `type` field
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub enum AccountType {
    #[default]
    User,
    Bot,
    Organization,
    #[serde(other)]
    Other,
}

/// Entry of `/repos/{owner}/{repo}/contributors`
#[derive(Debug, Clone, Deserialize)]
pub struct RepoContributor {
    pub login: String,
    pub id: u64,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub contributions: u64,
    #[serde(rename = "type", default)]
    pub account_type: AccountType,
}

impl RepoContributor {
    #[must_use]
    pub fn is_bot(&self) -> bool {
        self.account_type == AccountType::Bot
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub login: String,
}

/// Entry of `/repos/{owner}/{repo}/pulls`
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub user: Option<Account>,
    pub merged_at: Option<DateTime<Utc>>,
}

/// Entry of `/repos/{owner}/{repo}/pulls/comments`
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewComment {
    pub user: Option<Account>,
}

/// Entry of `/repos/{owner}/{repo}/commits`
#[derive(Debug, Clone, Deserialize)]
pub struct CommitSummary {
    pub sha: String,
    pub commit: CommitInfo,
}

impl CommitSummary {
    /// Author date of the commit, if GitHub reported one.
    #[must_use]
    pub fn authored_at(&self) -> Option<DateTime<Utc>> {
        self.commit.author.as_ref().and_then(|a| a.date)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitInfo {
    pub author: Option<Signature>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Signature {
    pub date: Option<DateTime<Utc>>,
}

/// Response of `/repos/{owner}/{repo}/commits/{sha}`
#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetail {
    #[serde(default)]
    pub stats: Option<CommitStat>,
}

/// Line counts for a single commit
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub struct CommitStat {
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default)]
    pub total: u64,
}

/// Response of `/users/{login}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserProfile {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub blog: Option<String>,
    pub hireable: Option<bool>,
    pub public_repos: Option<u64>,
    pub followers: Option<u64>,
    pub following: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
}

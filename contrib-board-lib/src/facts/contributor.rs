use super::github::{CommitStat, RepoContributor, UserProfile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Activity of one contributor in one repository
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivitySummary {
    pub prs: u64,
    pub merged_prs: u64,
    pub recent_commits: u64,
    pub total_commits: u64,
    pub reviews: u64,
    pub additions: u64,
    pub deletions: u64,
    pub changes: u64,

    /// Commits submitted for line statistics
    pub commits_analyzed: u64,

    /// Commits whose statistics could not be fetched and count as zero
    pub commits_dropped: u64,

    /// Author date of the newest commit within the lookback window
    pub last_activity: Option<DateTime<Utc>>,
}

impl ActivitySummary {
    /// Fold one commit's line counts into the totals.
    pub const fn add_commit_stat(&mut self, stat: CommitStat) {
        self.additions += stat.additions;
        self.deletions += stat.deletions;
        self.changes += stat.total;
    }

    /// Fold another summary into this one, keeping the most recent activity.
    pub fn merge(&mut self, other: &Self) {
        self.prs += other.prs;
        self.merged_prs += other.merged_prs;
        self.recent_commits += other.recent_commits;
        self.total_commits += other.total_commits;
        self.reviews += other.reviews;
        self.additions += other.additions;
        self.deletions += other.deletions;
        self.changes += other.changes;
        self.commits_analyzed += other.commits_analyzed;
        self.commits_dropped += other.commits_dropped;
        self.last_activity = self.last_activity.max(other.last_activity);
    }
}

/// A contributor as seen in a single repository, before aggregation
#[derive(Debug, Clone)]
pub struct ContributorFragment {
    pub id: u64,
    pub login: String,
    pub avatar_url: String,
    pub html_url: String,
    pub contributions: u64,
    pub is_bot: bool,
    pub repository: String,
    pub activity: ActivitySummary,
}

impl ContributorFragment {
    #[must_use]
    pub fn new(contributor: &RepoContributor, repository: impl Into<String>, activity: ActivitySummary) -> Self {
        Self {
            id: contributor.id,
            login: contributor.login.clone(),
            avatar_url: contributor.avatar_url.clone(),
            html_url: contributor.html_url.clone(),
            contributions: contributor.contributions,
            is_bot: contributor.is_bot(),
            repository: repository.into(),
            activity,
        }
    }
}

/// A contributor merged across all repositories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contributor {
    pub id: u64,
    pub login: String,
    pub avatar_url: String,
    pub html_url: String,
    pub contributions: u64,
    pub repositories: BTreeSet<String>,
    pub activity: ActivitySummary,
}

/// A scored and enriched contributor, exactly as it appears in the output document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorRecord {
    pub id: u64,
    pub login: String,
    pub name: String,
    pub avatar_url: String,
    pub html_url: String,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub blog: Option<String>,
    pub hireable: bool,
    pub public_repos: u64,
    pub followers: u64,
    pub following: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub contributions: u64,
    pub repositories: Vec<String>,
    pub repo_count: usize,
    pub impact_score: u64,
    pub total_prs: u64,
    pub total_merged_prs: u64,
    pub total_recent_commits: u64,
    pub total_commits: u64,
    pub total_reviews: u64,
    pub last_activity: Option<DateTime<Utc>>,
    pub pr_success_rate: u64,
    pub total_additions: u64,
    pub total_deletions: u64,
    pub total_changes: u64,
    pub commits_analyzed: u64,
}

impl ContributorRecord {
    /// Combine an aggregated contributor with its score and (possibly missing) profile.
    ///
    /// Empty profile strings are treated like absent ones; the display name falls back to the login.
    #[must_use]
    pub fn new(contributor: Contributor, impact_score: u64, pr_success_rate: u64, profile: Option<UserProfile>) -> Self {
        let profile = profile.unwrap_or_default();
        let activity = contributor.activity;
        let repositories: Vec<String> = contributor.repositories.into_iter().collect();

        Self {
            id: contributor.id,
            name: non_empty(profile.name).unwrap_or_else(|| contributor.login.clone()),
            login: contributor.login,
            avatar_url: contributor.avatar_url,
            html_url: contributor.html_url,
            bio: non_empty(profile.bio),
            company: non_empty(profile.company),
            location: non_empty(profile.location),
            blog: non_empty(profile.blog),
            hireable: profile.hireable.unwrap_or(false),
            public_repos: profile.public_repos.unwrap_or(0),
            followers: profile.followers.unwrap_or(0),
            following: profile.following.unwrap_or(0),
            created_at: profile.created_at,
            contributions: contributor.contributions,
            repo_count: repositories.len(),
            repositories,
            impact_score,
            total_prs: activity.prs,
            total_merged_prs: activity.merged_prs,
            total_recent_commits: activity.recent_commits,
            total_commits: activity.total_commits,
            total_reviews: activity.reviews,
            last_activity: activity.last_activity,
            pr_success_rate,
            total_additions: activity.additions,
            total_deletions: activity.deletions,
            total_changes: activity.changes,
            commits_analyzed: activity.commits_analyzed,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

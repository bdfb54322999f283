//! Per-contributor activity collection.
//!
//! For one (login, repository) pair this gathers pull requests, recent commits, the
//! paginated commit history, per-commit line statistics and review comments, and folds
//! them into an [`ActivitySummary`].

use super::batch::BatchExecutor;
use super::client::{Client, RemoteError};
use super::contributor::ActivitySummary;
use super::github::{Account, CommitDetail, CommitSummary, PullRequest, ReviewComment};
use super::pipeline_config::PipelineConfig;
use chrono::{DateTime, Months, SecondsFormat, Utc};
use core::time::Duration;
use serde::de::DeserializeOwned;

const LOG_TARGET: &str = "  activity";

/// Collects the activity of contributors within repositories of one organization
#[derive(Debug, Clone)]
pub struct ActivityCollector {
    client: Client,
    executor: BatchExecutor,
    organization: String,
    commit_analysis_limit: usize,
    commit_page_size: u8,
    max_commit_pages: u32,
    page_delay: Duration,
    recent_activity_months: u32,
}

impl ActivityCollector {
    #[must_use]
    pub fn new(client: Client, executor: BatchExecutor, config: &PipelineConfig) -> Self {
        Self {
            client,
            executor,
            organization: config.organization.clone(),
            commit_analysis_limit: config.commit_analysis_limit,
            commit_page_size: config.commit_page_size,
            max_commit_pages: config.max_commit_pages,
            page_delay: config.page_delay,
            recent_activity_months: config.recent_activity_months,
        }
    }

    /// Collect the activity of `login` in `repository`.
    ///
    /// Never fails: if pull requests, recent commits or reviews cannot be fetched the
    /// result is an all-zero summary. Missing history pages and commit details only
    /// reduce the totals.
    pub async fn collect(&self, login: &str, repository: &str, now: DateTime<Utc>) -> ActivitySummary {
        match self.try_collect(login, repository, now).await {
            Ok(summary) => summary,
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Could not fetch activity for {login} in {repository}: {e}");
                ActivitySummary::default()
            }
        }
    }

    async fn try_collect(&self, login: &str, repository: &str, now: DateTime<Utc>) -> Result<ActivitySummary, RemoteError> {
        let repo_path = format!("/repos/{}/{repository}", self.organization);

        let prs: Vec<PullRequest> = self
            .fetch(&format!("{repo_path}/pulls?state=all&creator={login}&per_page=100"))
            .await?;
        let prs: Vec<_> = prs.into_iter().filter(|pr| authored_by(pr.user.as_ref(), login)).collect();

        let since = now
            .checked_sub_months(Months::new(self.recent_activity_months))
            .unwrap_or(now)
            .to_rfc3339_opts(SecondsFormat::Secs, true);
        let recent: Vec<CommitSummary> = self
            .fetch(&format!("{repo_path}/commits?author={login}&since={since}&per_page=100"))
            .await?;

        let history = self.commit_history(&repo_path, login, repository).await;
        let mut summary = self.analyze_commits(&repo_path, &history).await;

        let comments: Vec<ReviewComment> = self.fetch(&format!("{repo_path}/pulls/comments?per_page=100")).await?;

        summary.prs = prs.len() as u64;
        summary.merged_prs = prs.iter().filter(|pr| pr.merged_at.is_some()).count() as u64;
        summary.recent_commits = recent.len() as u64;
        summary.last_activity = recent.first().and_then(CommitSummary::authored_at);
        summary.total_commits = history.len() as u64;
        summary.reviews = comments.iter().filter(|c| authored_by(c.user.as_ref(), login)).count() as u64;

        log::debug!(
            target: LOG_TARGET,
            "{login} in {repository}: {} PR(s), {} recent commit(s), {} commit(s) total, {} line(s) changed",
            summary.prs,
            summary.recent_commits,
            summary.total_commits,
            summary.changes
        );

        Ok(summary)
    }

    /// Single throttled request; waits out any rate-limit pause first.
    async fn fetch<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, RemoteError> {
        self.executor.run_once(|| self.client.get(endpoint)).await
    }

    /// Walk the commit history page by page.
    ///
    /// Stops at the first empty or short page, after `max_commit_pages`, or at the first page
    /// that cannot be fetched.
    async fn commit_history(&self, repo_path: &str, login: &str, repository: &str) -> Vec<CommitSummary> {
        let page_size = usize::from(self.commit_page_size);
        let mut commits = Vec::new();

        for page in 1..=self.max_commit_pages {
            let endpoint = format!("{repo_path}/commits?author={login}&per_page={page_size}&page={page}");

            match self.fetch::<Vec<CommitSummary>>(&endpoint).await {
                Ok(items) => {
                    let last_page = items.len() < page_size;
                    commits.extend(items);
                    if last_page {
                        break;
                    }
                }
                Err(e) => {
                    log::warn!(target: LOG_TARGET, "Could not fetch commits page {page} for {login} in {repository}: {e}");
                    break;
                }
            }

            if page < self.max_commit_pages {
                tokio::time::sleep(self.page_delay).await;
            }
        }

        commits
    }

    /// Fetch line statistics for the leading commits of `history` and sum them.
    async fn analyze_commits(&self, repo_path: &str, history: &[CommitSummary]) -> ActivitySummary {
        let to_analyze = match self.commit_analysis_limit {
            0 => history,
            limit => &history[..history.len().min(limit)],
        };

        let mut summary = ActivitySummary {
            commits_analyzed: to_analyze.len() as u64,
            ..ActivitySummary::default()
        };

        if to_analyze.is_empty() {
            return summary;
        }

        log::debug!(target: LOG_TARGET, "Analyzing {} commit(s) in {repo_path}", to_analyze.len());

        let client = &self.client;
        let shas: Vec<&str> = to_analyze.iter().map(|c| c.sha.as_str()).collect();
        let report = self
            .executor
            .run(shas, |sha| {
                let endpoint = format!("{repo_path}/commits/{sha}");
                async move {
                    let detail: CommitDetail = client.get(&endpoint).await?;
                    Ok(detail.stats.unwrap_or_default())
                }
            })
            .await;

        for stat in report.results {
            summary.add_commit_stat(stat);
        }
        summary.commits_dropped = report.dropped as u64;

        if report.dropped > 0 {
            log::warn!(
                target: LOG_TARGET,
                "Line statistics missing for {} of {} commit(s) in {repo_path}",
                report.dropped,
                to_analyze.len()
            );
        }

        summary
    }
}

fn authored_by(user: Option<&Account>, login: &str) -> bool {
    user.is_some_and(|u| u.login == login)
}

use super::activity::ActivityCollector;
use super::aggregate::aggregate;
use super::batch::{BatchExecutor, BatchPolicy};
use super::client::{Client, Page};
use super::contributor::{Contributor, ContributorFragment, ContributorRecord};
use super::github::{RepoContributor, Repository, UserProfile};
use super::pipeline_config::PipelineConfig;
use super::progress::Progress;
use super::score::{impact_score, pr_success_rate};
use super::throttler::Throttler;
use crate::Result;
use chrono::{DateTime, Utc};
use core::sync::atomic::{AtomicU64, Ordering};
use futures_util::future::join_all;
use ohno::IntoAppError;
use std::collections::BTreeMap;
use std::sync::Arc;

const LOG_TARGET: &str = " collector";

/// Runs the whole pipeline for one organization and produces ranked contributor records
pub struct Collector {
    client: Client,
    executor: BatchExecutor,
    activity: ActivityCollector,
    config: PipelineConfig,
    progress: Arc<dyn Progress>,
}

impl core::fmt::Debug for Collector {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Collector")
            .field("client", &self.client)
            .field("executor", &self.executor)
            .field("activity", &self.activity)
            .field("config", &self.config)
            .field("progress", &"<dyn Progress>")
            .finish()
    }
}

impl Collector {
    pub fn new(github_token: Option<&str>, config: PipelineConfig, progress: Arc<dyn Progress>) -> Result<Self> {
        config.validate()?;

        let client = Client::new(github_token, config.api_base_url.as_str())?;
        let throttler = Throttler::new(config.max_concurrent_requests);
        let executor = BatchExecutor::new(BatchPolicy::from_config(&config), throttler);
        let activity = ActivityCollector::new(client.clone(), executor.clone(), &config);

        Ok(Self {
            client,
            executor,
            activity,
            config,
            progress,
        })
    }

    /// Collect, aggregate, score and enrich the contributors of the configured organization.
    ///
    /// Fails only when the organization's repositories cannot be listed; every later problem
    /// degrades the affected record instead.
    pub async fn collect(&self, now: DateTime<Utc>) -> Result<Vec<ContributorRecord>> {
        let org = &self.config.organization;

        self.progress.set_phase("Listing");
        let progress_org = org.clone();
        self.progress
            .set_indeterminate(Box::new(move || format!("repositories of {progress_org}")));
        let repositories = self.list_repositories().await?;
        log::info!(target: LOG_TARGET, "Found {} active repositories in {org}", repositories.len());

        let contributors_by_repo = self.list_contributors(&repositories).await;

        self.progress.set_phase("Scanning");
        let fragments = self.collect_activity(contributors_by_repo, now).await;

        let merged = aggregate(fragments);
        log::info!(target: LOG_TARGET, "Aggregated {} unique contributor(s)", merged.len());

        self.progress.set_phase("Profiles");
        let mut records = self.enrich(merged, now).await;
        rank(&mut records);

        self.progress.done();
        Ok(records)
    }

    async fn list_repositories(&self) -> Result<Vec<Repository>> {
        let org = &self.config.organization;
        let mut repositories = Vec::new();

        for page in 1..=self.config.max_repository_pages {
            let endpoint = format!("/orgs/{org}/repos?type=all&per_page=100&page={page}");
            let listing: Page<Repository> = self
                .executor
                .run_once(|| self.client.get_page(&endpoint))
                .await
                .into_app_err_with(|| format!("could not list repositories of '{org}'"))?;

            repositories.extend(listing.items);
            if !listing.has_next {
                break;
            }
        }

        let total = repositories.len();
        repositories.retain(Repository::is_active);
        log::debug!(target: LOG_TARGET, "Skipping {} archived or disabled repositories", total - repositories.len());

        Ok(repositories)
    }

    /// List the contributors of every repository; a repository that cannot be listed has none.
    async fn list_contributors(&self, repositories: &[Repository]) -> Vec<(String, Vec<RepoContributor>)> {
        let total = repositories.len() as u64;
        let listed = Arc::new(AtomicU64::new(0));

        let listed_clone = Arc::clone(&listed);
        self.progress.set_determinate(Box::new(move || {
            let current = listed_clone.load(Ordering::Relaxed);
            (total, current, format!("contributors of {current}/{total} repositories"))
        }));

        let org = &self.config.organization;
        let listings = repositories.iter().map(|repo| {
            let listed = Arc::clone(&listed);
            async move {
                let endpoint = format!("/repos/{org}/{}/contributors?per_page=100", repo.name);
                let result = self
                    .executor
                    .run_once(|| self.client.get::<Vec<RepoContributor>>(&endpoint))
                    .await;
                let _ = listed.fetch_add(1, Ordering::Relaxed);

                let contributors = result.unwrap_or_else(|e| {
                    log::warn!(target: LOG_TARGET, "Could not fetch contributors for {}: {e}", repo.name);
                    Vec::new()
                });
                (repo.name.clone(), contributors)
            }
        });

        join_all(listings).await
    }

    /// Collect activity for every (repository, contributor) pair, one pair at a time.
    async fn collect_activity(
        &self,
        contributors_by_repo: Vec<(String, Vec<RepoContributor>)>,
        now: DateTime<Utc>,
    ) -> Vec<ContributorFragment> {
        let work: Vec<(String, RepoContributor)> = contributors_by_repo
            .into_iter()
            .flat_map(|(repo, contributors)| contributors.into_iter().map(move |c| (repo.clone(), c)))
            .filter(|(_, c)| !c.is_bot())
            .collect();

        let total = work.len() as u64;
        let scanned = Arc::new(AtomicU64::new(0));
        let scanned_clone = Arc::clone(&scanned);
        self.progress.set_determinate(Box::new(move || {
            let current = scanned_clone.load(Ordering::Relaxed);
            (total, current, format!("{current}/{total} contributor activities"))
        }));

        let mut fragments = Vec::with_capacity(work.len());
        for (index, (repo, contributor)) in work.iter().enumerate() {
            log::info!(
                target: LOG_TARGET,
                "{}/{total} - Fetching activity for {} in {repo}",
                index + 1,
                contributor.login
            );

            let activity = self.activity.collect(&contributor.login, repo, now).await;
            fragments.push(ContributorFragment::new(contributor, repo.as_str(), activity));
            let _ = scanned.fetch_add(1, Ordering::Relaxed);

            if index + 1 < work.len() {
                tokio::time::sleep(self.config.activity_delay).await;
            }
        }

        fragments
    }

    /// Score every contributor and attach its profile, one lookup at a time.
    async fn enrich(&self, contributors: BTreeMap<String, Contributor>, now: DateTime<Utc>) -> Vec<ContributorRecord> {
        let count = contributors.len();
        let total = count as u64;
        let enriched = Arc::new(AtomicU64::new(0));
        let enriched_clone = Arc::clone(&enriched);
        self.progress.set_determinate(Box::new(move || {
            let current = enriched_clone.load(Ordering::Relaxed);
            (total, current, format!("{current}/{total} profiles"))
        }));

        let mut records = Vec::with_capacity(count);
        for (index, contributor) in contributors.into_values().enumerate() {
            log::debug!(target: LOG_TARGET, "Fetching details for {}", contributor.login);

            let endpoint = format!("/users/{}", contributor.login);
            let profile = match self.executor.run_once(|| self.client.get::<UserProfile>(&endpoint)).await {
                Ok(profile) => Some(profile),
                Err(e) => {
                    log::warn!(target: LOG_TARGET, "Could not fetch details for user {}: {e}", contributor.login);
                    None
                }
            };

            if contributor.activity.commits_dropped > 0 {
                log::debug!(
                    target: LOG_TARGET,
                    "Line totals for {} exclude {} commit(s) whose statistics were unavailable",
                    contributor.login,
                    contributor.activity.commits_dropped
                );
            }

            let activity = &contributor.activity;
            let score = impact_score(activity.recent_commits, activity.last_activity, now);
            let success_rate = pr_success_rate(activity.prs, activity.merged_prs);
            records.push(ContributorRecord::new(contributor, score, success_rate, profile));
            let _ = enriched.fetch_add(1, Ordering::Relaxed);

            if index + 1 < count {
                tokio::time::sleep(self.config.profile_delay).await;
            }
        }

        records
    }
}

/// Order records by lines changed, then impact score, both descending, then by login.
pub fn rank(records: &mut [ContributorRecord]) {
    records.sort_by(|a, b| {
        b.total_changes
            .cmp(&a.total_changes)
            .then_with(|| b.impact_score.cmp(&a.impact_score))
            .then_with(|| a.login.cmp(&b.login))
    });
}

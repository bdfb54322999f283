//! Data collection, aggregation and scoring of organization contributors
//!
//! This module talks to the GitHub REST API and turns what it returns into ranked
//! [`ContributorRecord`]s.
//!
//! # Implementation Model
//!
//! The [`Collector`] drives a linear pipeline:
//! - **Repositories**: the organization's repositories are listed, skipping archived and disabled ones
//! - **Contributors**: each repository's contributor list is fetched
//! - **Activity**: for every non-bot (contributor, repository) pair an [`ActivityCollector`] gathers
//!   pull requests, commits, line statistics and review comments
//! - **Aggregation**: per-repository fragments are merged into one [`Contributor`] per login
//! - **Scoring and enrichment**: each contributor gets an impact score and its public profile
//!
//! Commit statistics fan out through a [`BatchExecutor`], which runs requests in sequential
//! batches with per-item retry, bounded by a shared [`Throttler`].

mod activity;
mod aggregate;
mod batch;
mod client;
mod collector;
mod contributor;
mod github;
mod pipeline_config;
mod progress;
mod score;
mod throttler;

pub use activity::ActivityCollector;
pub use aggregate::aggregate;
pub use batch::{AttemptOutcome, BatchExecutor, BatchPolicy, BatchReport, ItemOutcome};
pub use client::{Client, Page, RemoteError};
pub use collector::{Collector, rank};
pub use contributor::{ActivitySummary, Contributor, ContributorFragment, ContributorRecord};
pub use github::{AccountType, CommitStat, RepoContributor, Repository, UserProfile};
pub use pipeline_config::{DEFAULT_CONFIG_TOML, PipelineConfig};
pub use progress::{NoProgress, Progress};
pub use score::{SCORING_METHOD, impact_score, pr_success_rate, recency_factor};
pub use throttler::Throttler;

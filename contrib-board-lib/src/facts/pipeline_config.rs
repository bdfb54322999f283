use crate::Result;
use core::time::Duration;
use ohno::{IntoAppError, bail};
use serde::{Deserialize, Serialize};
use url::Url;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Tunables of the contributor pipeline.
///
/// Built once (from defaults, a config file, and command-line overrides) and handed to
/// [`Collector::new`](crate::facts::Collector::new); nothing reads these values from globals.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// GitHub organization whose repositories are scanned
    pub organization: String,

    /// Root of the GitHub REST API
    pub api_base_url: String,

    /// Commit detail requests issued together as one batch
    pub batch_size: usize,

    /// Upper bound on concurrently running requests
    pub max_concurrent_requests: usize,

    /// Retries on top of the first attempt
    pub retry_attempts: u32,

    /// Base delay for retry backoff and the pause between batches
    #[serde(with = "humantime_serde")]
    pub rate_limit_delay: Duration,

    /// Pause between two activity collections
    #[serde(with = "humantime_serde")]
    pub activity_delay: Duration,

    /// Pause between two profile lookups
    #[serde(with = "humantime_serde")]
    pub profile_delay: Duration,

    /// Pause between two pages of commit history
    #[serde(with = "humantime_serde")]
    pub page_delay: Duration,

    /// Commits per contributor and repository whose statistics are fetched (0 = no limit)
    pub commit_analysis_limit: usize,

    /// Commits per history page
    pub commit_page_size: u8,

    /// History pages fetched per contributor and repository
    pub max_commit_pages: u32,

    /// Repository listing pages fetched for the organization
    pub max_repository_pages: u32,

    /// Lookback window for recent commits, in months
    pub recent_activity_months: u32,

    /// Longest time to hold back requests after hitting the rate limit
    #[serde(with = "humantime_serde")]
    pub max_rate_limit_wait: Duration,
}

impl PipelineConfig {
    /// Parse a configuration document; omitted keys take their default values.
    pub fn from_toml(text: &str) -> Result<Self> {
        let mut merged: toml::Table = toml::from_str(DEFAULT_CONFIG_TOML).into_app_err("parsing default configuration")?;
        let overrides: toml::Table = toml::from_str(text).into_app_err("parsing configuration")?;
        merged.extend(overrides);

        let config: Self = toml::Value::Table(merged).try_into().into_app_err("invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Check that values are usable
    pub fn validate(&self) -> Result<()> {
        if self.organization.trim().is_empty() {
            bail!("organization must not be empty");
        }

        let _ = Url::parse(&self.api_base_url).into_app_err_with(|| format!("api_base_url '{}' is not a valid URL", self.api_base_url))?;

        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }

        if self.max_concurrent_requests == 0 {
            bail!("max_concurrent_requests must be at least 1");
        }

        if !(1..=100).contains(&self.commit_page_size) {
            bail!("commit_page_size must be between 1 and 100, got {}", self.commit_page_size);
        }

        if self.max_repository_pages == 0 {
            bail!("max_repository_pages must be at least 1");
        }

        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to PipelineConfig")
    }
}

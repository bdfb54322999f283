use super::common::{ColorMode, LogLevel, init_logging};
use super::{Host, ProgressReporter, config};
use crate::Result;
use crate::facts::{Collector, Progress};
use crate::reports::{OutputDocument, generate_console, write_json};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use clap::Parser;
use core::time::Duration;
use ohno::IntoAppError;
use std::io::Write;
use std::sync::Arc;

const LOG_TARGET: &str = "     fetch";

#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// GitHub organization to scan (overrides the configuration file)
    #[arg(long, value_name = "ORG")]
    pub org: Option<String>,

    /// Where to write the leaderboard document
    #[arg(long, short = 'o', value_name = "PATH", default_value = "src/data/contributors.json")]
    pub output: Utf8PathBuf,

    /// Path to configuration file (default is `contrib-board.toml` in the current directory)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// GitHub personal access token
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none")]
    pub log_level: LogLevel,

    /// Control when to use colored output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorMode,
}

/// Run the whole pipeline and write the leaderboard document.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the organization's repositories cannot be
/// listed, or the output cannot be written. No output is written in any of those cases.
pub async fn process_fetch<H: Host>(host: &mut H, args: &FetchArgs) -> Result<()> {
    init_logging(args.log_level);

    let cwd = std::env::current_dir().into_app_err("determining the current directory")?;
    let cwd = Utf8PathBuf::from_path_buf(cwd).map_err(|p| ohno::app_err!("current directory '{}' is not valid UTF-8", p.display()))?;

    let mut pipeline_config = config::load(&cwd, args.config.as_deref())?;
    if let Some(org) = &args.org {
        pipeline_config.organization.clone_from(org);
    }

    log::info!(
        target: LOG_TARGET,
        "Collecting contributors of '{}' (up to {} commit(s) analyzed per contributor and repository, batches of {}, {} retries)",
        pipeline_config.organization,
        pipeline_config.commit_analysis_limit,
        pipeline_config.batch_size,
        pipeline_config.retry_attempts
    );

    let delay = if args.log_level == LogLevel::None {
        Duration::from_millis(300)
    } else {
        Duration::from_hours(365 * 24)
    };
    let progress: Arc<dyn Progress> = Arc::new(ProgressReporter::new(delay, args.color.for_stderr()));

    let collector = Collector::new(args.github_token.as_deref(), pipeline_config, Arc::clone(&progress))?;

    // The caller reports the error; only the progress bar is cleaned up here.
    let records = collector.collect(Utc::now()).await.inspect_err(|_| progress.done())?;

    let document = OutputDocument::new(records, Utc::now());
    write_json(&document, &args.output)?;

    report_summary(host, &document, &args.output, args.color.for_stdout())
}

fn report_summary<H: Host>(host: &mut H, document: &OutputDocument, output: &Utf8Path, use_colors: bool) -> Result<()> {
    let mut summary = String::new();
    generate_console(document, output.as_str(), use_colors, &mut summary)?;
    let _ = write!(host.output(), "{summary}");
    Ok(())
}

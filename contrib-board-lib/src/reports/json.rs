use crate::Result;
use crate::facts::{ContributorRecord, SCORING_METHOD};
use camino::Utf8Path;
use chrono::{DateTime, SecondsFormat, Utc};
use core::fmt::Write;
use ohno::IntoAppError;
use serde::{Deserialize, Serialize, Serializer};
use std::fs;
use std::io::{BufWriter, Write as _};

const LOG_TARGET: &str = "      json";

/// The leaderboard document consumed by the site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputDocument {
    #[serde(serialize_with = "serialize_millis")]
    pub generated_at: DateTime<Utc>,
    pub total_contributors: usize,
    pub total_contributions: u64,
    pub total_impact_score: u64,
    pub total_recent_activity: u64,
    pub scoring_method: String,
    pub total_additions: u64,
    pub total_deletions: u64,
    pub total_changes: u64,
    pub total_commits_analyzed: u64,
    pub contributors: Vec<ContributorRecord>,
}

impl OutputDocument {
    /// Wrap ranked records, computing the summary totals from them.
    #[must_use]
    pub fn new(contributors: Vec<ContributorRecord>, generated_at: DateTime<Utc>) -> Self {
        let sum = |field: fn(&ContributorRecord) -> u64| -> u64 { contributors.iter().map(field).sum() };

        Self {
            generated_at,
            total_contributors: contributors.len(),
            total_contributions: sum(|c| c.contributions),
            total_impact_score: sum(|c| c.impact_score),
            total_recent_activity: sum(|c| c.total_recent_commits),
            scoring_method: SCORING_METHOD.to_string(),
            total_additions: sum(|c| c.total_additions),
            total_deletions: sum(|c| c.total_deletions),
            total_changes: sum(|c| c.total_changes),
            total_commits_analyzed: sum(|c| c.commits_analyzed),
            contributors,
        }
    }
}

fn serialize_millis<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> core::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Render the document as pretty-printed JSON.
pub fn generate<W: Write>(document: &OutputDocument, writer: &mut W) -> Result<()> {
    write!(writer, "{}", serde_json::to_string_pretty(document)?)?;
    Ok(())
}

/// Write the document to `path`, replacing any previous file in one step.
///
/// Missing parent directories are created. The content goes to a temporary file next to
/// `path` which is then renamed over it, so readers never observe a partial document.
pub fn write(document: &OutputDocument, path: &Utf8Path) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };

    fs::create_dir_all(parent).into_app_err_with(|| format!("unable to create directory '{parent}'"))?;

    let temp = tempfile::NamedTempFile::new_in(parent).into_app_err_with(|| format!("unable to create a temporary file in '{parent}'"))?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        serde_json::to_writer_pretty(&mut writer, document).into_app_err_with(|| format!("unable to write '{path}'"))?;
        writer.flush().into_app_err_with(|| format!("unable to flush '{path}'"))?;
    }

    let _ = temp
        .persist(path)
        .into_app_err_with(|| format!("unable to replace '{path}'"))?;

    log::info!(target: LOG_TARGET, "Wrote {} contributor(s) to '{path}'", document.total_contributors);
    Ok(())
}

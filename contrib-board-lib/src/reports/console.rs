use super::json::OutputDocument;
use crate::Result;
use core::fmt::Write;
use owo_colors::OwoColorize;

/// Render a short human-readable summary of a generated document.
pub fn generate<W: Write>(document: &OutputDocument, destination: &str, use_colors: bool, writer: &mut W) -> Result<()> {
    let headline = format!("{} contributor(s)", document.total_contributors);
    if use_colors {
        writeln!(writer, "Wrote {} to {destination}", headline.green().bold())?;
    } else {
        writeln!(writer, "Wrote {headline} to {destination}")?;
    }

    let rows = [
        ("Total impact score", group_digits(document.total_impact_score)),
        ("Total contributions", group_digits(document.total_contributions)),
        ("Recent activity", format!("{} commit(s)", group_digits(document.total_recent_activity))),
        (
            "Line changes",
            format!(
                "+{} -{} ({} total)",
                group_digits(document.total_additions),
                group_digits(document.total_deletions),
                group_digits(document.total_changes)
            ),
        ),
        ("Commits analyzed", group_digits(document.total_commits_analyzed)),
    ];

    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    for (label, value) in rows {
        writeln!(writer, "  {label:<width$} : {value}")?;
    }

    if let Some(top) = document.contributors.first() {
        let name = if use_colors { top.name.bold().to_string() } else { top.name.clone() };
        writeln!(writer, "  {:<width$} : {name} ({} impact score)", "Top contributor", top.impact_score)?;
    }

    Ok(())
}

/// Format an integer with `,` between groups of three digits.
fn group_digits(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{ActivitySummary, Contributor, ContributorRecord, UserProfile};
    use chrono::DateTime;

    fn document() -> OutputDocument {
        let contributor = Contributor {
            id: 1,
            login: "alice".to_string(),
            avatar_url: String::new(),
            html_url: String::new(),
            contributions: 1234,
            repositories: ["repoA".to_string()].into(),
            activity: ActivitySummary {
                recent_commits: 8,
                additions: 1_000_000,
                deletions: 5_432,
                changes: 1_005_432,
                commits_analyzed: 42,
                ..ActivitySummary::default()
            },
        };
        let profile = UserProfile {
            name: Some("Alice Liddell".to_string()),
            ..UserProfile::default()
        };

        OutputDocument::new(
            vec![ContributorRecord::new(contributor, 8, 0, Some(profile))],
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        )
    }

    #[test]
    fn test_group_digits() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1000), "1,000");
        assert_eq!(group_digits(1_005_432), "1,005,432");
        assert_eq!(group_digits(123_456), "123,456");
    }

    #[test]
    fn test_summary_no_colors() {
        let mut output = String::new();
        generate(&document(), "out.json", false, &mut output).unwrap();

        assert!(output.starts_with("Wrote 1 contributor(s) to out.json\n"));
        assert!(output.contains("Total contributions : 1,234"));
        assert!(output.contains("Line changes        : +1,000,000 -5,432 (1,005,432 total)"));
        assert!(output.contains("Top contributor     : Alice Liddell (8 impact score)"));
        assert!(!output.contains('\u{1b}'));
    }

    #[test]
    fn test_summary_with_colors() {
        let mut output = String::new();
        generate(&document(), "out.json", true, &mut output).unwrap();
        assert!(output.contains('\u{1b}'));
    }

    #[test]
    fn test_summary_empty_document() {
        let empty = OutputDocument::new(Vec::new(), DateTime::from_timestamp(1_700_000_000, 0).unwrap());
        let mut output = String::new();
        generate(&empty, "out.json", false, &mut output).unwrap();

        assert!(output.contains("Wrote 0 contributor(s)"));
        assert!(!output.contains("Top contributor"));
    }
}

//! Recency-weighted impact scoring.

use chrono::{DateTime, Utc};

/// Identifies the scoring policy in the output document
pub const SCORING_METHOD: &str = "simplified_recent_activity";

/// Weight applied to recent commits based on how long ago the contributor was last active.
///
/// Unknown activity gets the lowest weight. Timestamps in the future count as today.
#[must_use]
#[expect(clippy::cast_precision_loss, reason = "elapsed seconds are far below 2^52")]
pub fn recency_factor(last_activity: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(last_activity) = last_activity else {
        return 0.1;
    };

    let days = (now - last_activity).num_seconds().max(0) as f64 / 86_400.0;
    match days {
        d if d <= 30.0 => 1.0,
        d if d <= 90.0 => 0.8,
        d if d <= 180.0 => 0.5,
        d if d <= 365.0 => 0.3,
        _ => 0.1,
    }
}

/// Impact score: recent commits weighted by recency, never below 1.
#[must_use]
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss, reason = "score is rounded and non-negative")]
#[expect(clippy::cast_precision_loss, reason = "commit counts are far below 2^52")]
pub fn impact_score(recent_commits: u64, last_activity: Option<DateTime<Utc>>, now: DateTime<Utc>) -> u64 {
    let score = (recent_commits as f64 * recency_factor(last_activity, now)).round() as u64;
    score.max(1)
}

/// Share of pull requests that were merged, as a rounded percentage.
#[must_use]
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss, reason = "rate is rounded and within 0..=100")]
#[expect(clippy::cast_precision_loss, reason = "PR counts are far below 2^52")]
pub fn pr_success_rate(prs: u64, merged_prs: u64) -> u64 {
    if prs == 0 {
        return 0;
    }
    (merged_prs as f64 / prs as f64 * 100.0).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_750_000_000, 0).unwrap()
    }

    fn days_ago(days: i64) -> Option<DateTime<Utc>> {
        Some(now() - Duration::days(days))
    }

    #[test]
    fn test_no_activity_scores_one() {
        assert_eq!(impact_score(0, None, now()), 1);
        assert_eq!(impact_score(0, days_ago(1), now()), 1);
    }

    #[test]
    fn test_bucket_boundaries() {
        assert!((recency_factor(days_ago(30), now()) - 1.0).abs() < f64::EPSILON);
        assert!((recency_factor(days_ago(31), now()) - 0.8).abs() < f64::EPSILON);
        assert!((recency_factor(days_ago(90), now()) - 0.8).abs() < f64::EPSILON);
        assert!((recency_factor(days_ago(180), now()) - 0.5).abs() < f64::EPSILON);
        assert!((recency_factor(days_ago(365), now()) - 0.3).abs() < f64::EPSILON);
        assert!((recency_factor(days_ago(366), now()) - 0.1).abs() < f64::EPSILON);
        assert!((recency_factor(None, now()) - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_future_activity_counts_as_today() {
        assert_eq!(impact_score(7, Some(now() + Duration::days(3)), now()), 7);
    }

    #[test]
    fn test_recent_full_weight() {
        assert_eq!(impact_score(8, days_ago(10), now()), 8);
    }

    #[test]
    fn test_older_activity_discounted() {
        assert_eq!(impact_score(10, days_ago(200), now()), 3);
        assert_eq!(impact_score(10, days_ago(400), now()), 1);
        assert_eq!(impact_score(10, None, now()), 1);
    }

    #[test]
    fn test_more_recent_never_scores_lower() {
        for recent in [1, 3, 8, 25, 100] {
            let mut previous = u64::MAX;
            for days in [0, 15, 30, 31, 60, 90, 91, 150, 180, 181, 300, 365, 366, 1000] {
                let score = impact_score(recent, days_ago(days), now());
                assert!(score <= previous, "score rose from {previous} to {score} at {days} days for {recent} commits");
                previous = score;
            }
            assert!(impact_score(recent, None, now()) <= previous);
        }
    }

    #[test]
    fn test_pr_success_rate() {
        assert_eq!(pr_success_rate(0, 0), 0);
        assert_eq!(pr_success_rate(4, 3), 75);
        assert_eq!(pr_success_rate(3, 2), 67);
        assert_eq!(pr_success_rate(5, 5), 100);
    }
}

//! Lookback window: cutoff calculation and repository filtering.

use crate::models::Repository;
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// Default lookback in days.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 7;

/// Cutoff instant `days` before now. Callers validate `days > 0`.
pub fn cutoff_date(days: u32) -> DateTime<Utc> {
    cutoff_from(Utc::now(), days)
}

/// Cutoff instant `days` before `now`.
pub fn cutoff_from(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    now - Duration::days(i64::from(days))
}

/// Keep repositories whose latest push or update is at or after `cutoff`, in order.
pub fn filter_active_repositories(
    repositories: Vec<Repository>,
    cutoff: DateTime<Utc>,
) -> Vec<Repository> {
    repositories
        .into_iter()
        .filter(|repo| {
            let latest = repo.latest_activity();
            let active = latest >= cutoff;
            if !active {
                debug!(
                    "Skipping {}: last activity {} is before {}",
                    repo,
                    latest.format("%Y-%m-%d %H:%M:%S"),
                    cutoff.format("%Y-%m-%d %H:%M:%S")
                );
            }
            active
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn repo(name: &str, pushed_days_ago: Option<i64>, updated_days_ago: Option<i64>) -> Repository {
        let now = Utc::now();
        Repository {
            owner: "acme".to_string(),
            name: name.to_string(),
            pushed_at: pushed_days_ago.map(|d| now - Duration::days(d)),
            updated_at: updated_days_ago.map(|d| now - Duration::days(d)),
        }
    }

    #[test]
    fn test_cutoff_from() {
        let now = Utc.with_ymd_and_hms(2024, 6, 8, 12, 0, 0).unwrap();
        let cutoff = cutoff_from(now, 7);
        assert_eq!(cutoff, Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_recent_update_keeps_stale_push() {
        let cutoff = cutoff_date(7);
        let kept = filter_active_repositories(vec![repo("api", Some(10), Some(1))], cutoff);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_filter_preserves_order_and_drops_inactive() {
        let cutoff = cutoff_date(7);
        let kept = filter_active_repositories(
            vec![
                repo("web", Some(2), None),
                repo("old", Some(30), Some(20)),
                repo("api", None, Some(3)),
                repo("empty", None, None),
            ],
            cutoff,
        );

        let names: Vec<&str> = kept.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["web", "api"]);
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let cutoff = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let exact = Repository {
            owner: "acme".to_string(),
            name: "edge".to_string(),
            pushed_at: Some(cutoff),
            updated_at: None,
        };
        assert_eq!(filter_active_repositories(vec![exact], cutoff).len(), 1);
    }
}

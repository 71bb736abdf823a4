//! Text and JSON report generation.
//!
//! The text digest is a stable, line-oriented format that downstream
//! automation parses, so its wording is fixed.

use crate::models::{
    ActivityReport, AuthorSummary, InstallationError, InstallationResult, InstallationStats,
};
use anyhow::Result;

/// Human label for a lookback window.
pub fn period_label(days: u32) -> String {
    match days {
        7 => "week".to_string(),
        30 => "month".to_string(),
        n => format!("{} days", n),
    }
}

/// Render every installation result, in the given order.
pub fn generate_summary(results: &[InstallationResult]) -> String {
    let mut output = String::new();

    for result in results {
        match result {
            InstallationResult::Success(stats) => output.push_str(&generate_stats_block(stats)),
            InstallationResult::Error(err) => output.push_str(&generate_error_line(err)),
        }
        output.push('\n');
    }

    output
}

fn generate_error_line(err: &InstallationError) -> String {
    format!("Error for {}: {}\n", err.account, err.error)
}

fn generate_stats_block(stats: &InstallationStats) -> String {
    let mut block = String::new();

    block.push_str(&format!(
        "Activity for {} ({}) - Last {}\n",
        stats.account,
        stats.account_type,
        period_label(stats.period_days)
    ));

    if stats.authors.is_empty() {
        block.push_str("  No contributions found in this period.\n");
        return block;
    }

    // Stable sort keeps first-observed order on ties.
    let mut authors: Vec<&AuthorSummary> = stats.authors.iter().collect();
    authors.sort_by_key(|a| std::cmp::Reverse(a.total()));

    for author in authors {
        block.push_str(&generate_author_block(author));
    }

    block
}

fn generate_author_block(author: &AuthorSummary) -> String {
    let mut block = String::new();

    let id = author
        .user_id
        .map(|id| format!(" (ID: {})", id))
        .unwrap_or_default();
    block.push_str(&format!(
        "  {}{}: {} commits, {} PRs opened, {} PRs closed\n",
        author.author, id, author.total_commits, author.total_prs_opened, author.total_prs_closed
    ));

    let mut repositories: Vec<_> = author.repositories.iter().collect();
    repositories.sort_by_key(|r| std::cmp::Reverse(r.total()));

    for repo in repositories {
        block.push_str(&format!(
            "    - {}: {} commits, {} opened, {} closed\n",
            repo.repository, repo.commits, repo.prs_opened, repo.prs_closed
        ));
    }

    block
}

/// Generate a JSON report.
pub fn generate_json_report(report: &ActivityReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

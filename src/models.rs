//! Data models for the activity digest.
//!
//! This module contains the domain types shared by the collectors,
//! the aggregator and the report generator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity used when no author information is available.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// An app installation on a user or organization account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installation {
    /// Numeric installation id.
    pub id: u64,
    /// Login of the account the app is installed on.
    pub account: String,
    /// Account type as reported by GitHub ("User" or "Organization").
    pub account_type: String,
}

/// A repository visible to an installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    /// Owner login.
    pub owner: String,
    /// Repository name.
    pub name: String,
    /// Time of the last push, if any.
    pub pushed_at: Option<DateTime<Utc>>,
    /// Time of the last update, if any.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Repository {
    /// Returns `owner/name`.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Latest of `pushed_at` and `updated_at`; missing timestamps count as the epoch.
    pub fn latest_activity(&self) -> DateTime<Utc> {
        let pushed = self.pushed_at.unwrap_or_default();
        let updated = self.updated_at.unwrap_or_default();
        pushed.max(updated)
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A commit reachable from some branch head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// Commit hash.
    pub oid: String,
    /// Login of the linked GitHub account, if the author email is verified.
    pub author_login: Option<String>,
    /// Git author display name.
    pub author_name: Option<String>,
    /// Git author email.
    pub author_email: Option<String>,
    /// Numeric id of the linked account.
    pub user_id: Option<u64>,
    /// Commit timestamp.
    pub committed_at: DateTime<Utc>,
}

impl Commit {
    /// Resolve the author identity: login, then name, then email, then "Unknown".
    pub fn author_identity(&self) -> String {
        [&self.author_login, &self.author_name, &self.author_email]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .cloned()
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string())
    }
}

/// A pull request as seen by either the search or the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    /// Pull request number, when the endpoint reports it.
    pub number: Option<u64>,
    /// Author login.
    pub author_login: Option<String>,
    /// Numeric id of the author account.
    pub user_id: Option<u64>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Close (or merge) time.
    pub closed_at: Option<DateTime<Utc>>,
    /// Last update time.
    pub updated_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    /// Resolve the author identity: login, then "Unknown".
    pub fn author_identity(&self) -> String {
        self.author_login
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_AUTHOR)
            .to_string()
    }

    /// Whether the creation falls inside the window.
    pub fn opened_since(&self, cutoff: DateTime<Utc>) -> bool {
        self.created_at >= cutoff
    }

    /// Whether the pull request was closed inside the window.
    pub fn closed_since(&self, cutoff: DateTime<Utc>) -> bool {
        self.closed_at.is_some_and(|closed| closed >= cutoff)
    }
}

/// Contribution of one author to one repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoContribution {
    /// `owner/name` of the repository.
    pub repository: String,
    pub commits: u64,
    pub prs_opened: u64,
    pub prs_closed: u64,
}

impl RepoContribution {
    /// Sum of all counters, used for ordering.
    pub fn total(&self) -> u64 {
        self.commits + self.prs_opened + self.prs_closed
    }
}

/// Finalized per-author record for one installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSummary {
    /// Resolved author identity.
    pub author: String,
    /// Numeric account id, when one was observed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    pub total_commits: u64,
    pub total_prs_opened: u64,
    pub total_prs_closed: u64,
    /// Per-repository rows in first-observed order.
    pub repositories: Vec<RepoContribution>,
}

impl AuthorSummary {
    /// Sum of all totals, used for ordering.
    pub fn total(&self) -> u64 {
        self.total_commits + self.total_prs_opened + self.total_prs_closed
    }
}

/// Statistics for an installation that was processed successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationStats {
    pub installation_id: u64,
    pub account: String,
    pub account_type: String,
    /// Lookback window in days.
    pub period_days: u32,
    /// Authors in first-observed order.
    pub authors: Vec<AuthorSummary>,
}

/// An installation that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationError {
    pub installation_id: u64,
    pub account: String,
    pub error: String,
}

/// Outcome of processing one installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InstallationResult {
    Success(InstallationStats),
    Error(InstallationError),
}

impl InstallationResult {
    /// Returns the installation id regardless of outcome.
    #[allow(dead_code)] // Utility for callers correlating results
    pub fn installation_id(&self) -> u64 {
        match self {
            InstallationResult::Success(stats) => stats.installation_id,
            InstallationResult::Error(err) => err.installation_id,
        }
    }

    /// Whether this result records a failure.
    pub fn is_error(&self) -> bool {
        matches!(self, InstallationResult::Error(_))
    }
}

/// The complete output of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityReport {
    /// Human-readable digest.
    pub summary: String,
    /// One result per installation, in enumeration order.
    pub detailed_results: Vec<InstallationResult>,
}

impl ActivityReport {
    /// Number of installations that produced an error record.
    pub fn error_count(&self) -> usize {
        self.detailed_results.iter().filter(|r| r.is_error()).count()
    }
}

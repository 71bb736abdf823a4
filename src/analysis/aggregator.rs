//! Per-author activity accumulation.
//!
//! An [`ActivityLedger`] is owned by one installation pass. Collectors
//! write into it through `&mut` borrows, and once every repository has
//! been walked it is consumed into immutable [`AuthorSummary`] values.

use crate::models::{AuthorSummary, PullRequest, RepoContribution};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;

/// Opened/closed pull request counters for one repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PullRequestCounts {
    pub opened: u64,
    pub closed: u64,
}

/// Running totals for a single author.
///
/// Totals are only ever changed together with the matching per-repository
/// counter, so they always equal the sum of the maps.
#[derive(Debug, Default)]
pub struct AuthorAccumulator {
    user_id: Option<u64>,
    commits_by_repo: IndexMap<String, u64>,
    pull_requests_by_repo: IndexMap<String, PullRequestCounts>,
    total_commits: u64,
    total_opened: u64,
    total_closed: u64,
}

impl AuthorAccumulator {
    /// First non-null id wins.
    fn observe_user_id(&mut self, user_id: Option<u64>) {
        if self.user_id.is_none() {
            self.user_id = user_id;
        }
    }

    fn add_commit(&mut self, repository: &str) {
        *self
            .commits_by_repo
            .entry(repository.to_string())
            .or_default() += 1;
        self.total_commits += 1;
    }

    fn add_pull_request(&mut self, repository: &str, opened: bool, closed: bool) {
        let counts = self
            .pull_requests_by_repo
            .entry(repository.to_string())
            .or_default();
        if opened {
            counts.opened += 1;
            self.total_opened += 1;
        }
        if closed {
            counts.closed += 1;
            self.total_closed += 1;
        }
    }
}

#[allow(dead_code)] // Inspection accessors
impl AuthorAccumulator {
    pub fn user_id(&self) -> Option<u64> {
        self.user_id
    }

    pub fn total_commits(&self) -> u64 {
        self.total_commits
    }

    pub fn total_opened(&self) -> u64 {
        self.total_opened
    }

    pub fn total_closed(&self) -> u64 {
        self.total_closed
    }

    pub fn commits_in(&self, repository: &str) -> u64 {
        self.commits_by_repo.get(repository).copied().unwrap_or(0)
    }

    pub fn pull_requests_in(&self, repository: &str) -> PullRequestCounts {
        self.pull_requests_by_repo
            .get(repository)
            .copied()
            .unwrap_or_default()
    }
}

impl AuthorAccumulator {
    /// Union of repositories touched by commits or pull requests, commit repos first.
    fn contributions(&self) -> Vec<RepoContribution> {
        let mut rows: IndexMap<&str, RepoContribution> = IndexMap::new();

        for (repository, commits) in &self.commits_by_repo {
            rows.insert(
                repository.as_str(),
                RepoContribution {
                    repository: repository.clone(),
                    commits: *commits,
                    ..Default::default()
                },
            );
        }

        for (repository, counts) in &self.pull_requests_by_repo {
            let row = rows
                .entry(repository.as_str())
                .or_insert_with(|| RepoContribution {
                    repository: repository.clone(),
                    ..Default::default()
                });
            row.prs_opened = counts.opened;
            row.prs_closed = counts.closed;
        }

        rows.into_values().collect()
    }

    fn into_summary(self, author: String) -> AuthorSummary {
        AuthorSummary {
            repositories: self.contributions(),
            author,
            user_id: self.user_id,
            total_commits: self.total_commits,
            total_prs_opened: self.total_opened,
            total_prs_closed: self.total_closed,
        }
    }
}

/// Per-installation map of author identity to accumulator, in first-observed order.
#[derive(Debug, Default)]
pub struct ActivityLedger {
    authors: IndexMap<String, AuthorAccumulator>,
}

impl ActivityLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one commit for `author` in `repository`.
    pub fn record_commit(&mut self, author: &str, user_id: Option<u64>, repository: &str) {
        let acc = self.authors.entry(author.to_string()).or_default();
        acc.observe_user_id(user_id);
        acc.add_commit(repository);
    }

    /// Apply the opened/closed rule for one pull request.
    ///
    /// Returns `false` (and leaves the ledger untouched) when neither the
    /// creation nor the close falls inside the window.
    pub fn record_pull_request(
        &mut self,
        pull_request: &PullRequest,
        repository: &str,
        cutoff: DateTime<Utc>,
    ) -> bool {
        let opened = pull_request.opened_since(cutoff);
        let closed = pull_request.closed_since(cutoff);
        if !opened && !closed {
            return false;
        }

        let acc = self
            .authors
            .entry(pull_request.author_identity())
            .or_default();
        acc.observe_user_id(pull_request.user_id);
        acc.add_pull_request(repository, opened, closed);
        true
    }

    #[allow(dead_code)] // Inspection accessor
    pub fn author(&self, author: &str) -> Option<&AuthorAccumulator> {
        self.authors.get(author)
    }

    pub fn len(&self) -> usize {
        self.authors.len()
    }

    #[allow(dead_code)] // Pairs with len()
    pub fn is_empty(&self) -> bool {
        self.authors.is_empty()
    }

    /// Consume the ledger into summaries, preserving first-observed order.
    pub fn into_summaries(self) -> Vec<AuthorSummary> {
        self.authors
            .into_iter()
            .map(|(author, acc)| acc.into_summary(author))
            .collect()
    }
}

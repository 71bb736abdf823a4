//! Commit collection across every branch of a repository.

use crate::analysis::ActivityLedger;
use crate::error::Result;
use crate::github::InstallationApi;
use crate::models::{Commit, Repository};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Walk every branch of `repo` and record each unique commit since `since`.
///
/// A commit reachable from several branches is counted once. Any fetch
/// failure leaves the ledger untouched and yields zero for this repository.
pub async fn collect_commits(
    api: &dyn InstallationApi,
    repo: &Repository,
    since: DateTime<Utc>,
    ledger: &mut ActivityLedger,
) -> usize {
    let commits = match fetch_unique_commits(api, repo, since).await {
        Ok(commits) => commits,
        Err(e) => {
            warn!("Failed to collect commits for {}: {}", repo, e);
            return 0;
        }
    };

    let repository = repo.full_name();
    for commit in &commits {
        ledger.record_commit(&commit.author_identity(), commit.user_id, &repository);
    }

    info!("{}: {} unique commits", repository, commits.len());
    commits.len()
}

/// Branch heads are capped at 100 and so is each branch history.
async fn fetch_unique_commits(
    api: &dyn InstallationApi,
    repo: &Repository,
    since: DateTime<Utc>,
) -> Result<Vec<Commit>> {
    let branches = api.list_branches(repo).await?;
    debug!("{}: {} branches", repo, branches.len());

    let mut seen: HashSet<String> = HashSet::new();
    let mut unique = Vec::new();

    for branch in &branches {
        let history = api.branch_history(repo, branch, since).await?;
        for commit in history {
            if commit.committed_at < since {
                continue;
            }
            if seen.insert(commit.oid.clone()) {
                unique.push(commit);
            }
        }
    }

    Ok(unique)
}

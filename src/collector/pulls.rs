//! Pull request collection.
//!
//! The search endpoint is tried first. When it fails or finds nothing,
//! the repository's pull request list is paginated instead, newest
//! update first, with a fixed cooldown on rate limits.

use crate::analysis::ActivityLedger;
use crate::collector::retry::{RetryPolicy, Sleeper};
use crate::error::Result;
use crate::github::types::PullRequestItem;
use crate::github::{InstallationApi, PAGE_SIZE};
use crate::models::{PullRequest, Repository};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, error, info, warn};

/// Which path produced the counts for a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullRequestSource {
    Search,
    Pagination,
}

/// Outcome of collecting one repository's pull requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullRequestOutcome {
    pub source: PullRequestSource,
    /// Items that passed the path's filters and were applied to the ledger.
    pub matched: usize,
}

/// Search query for pull requests in `repo` updated on or after the cutoff day.
pub fn search_query(repo: &Repository, cutoff: DateTime<Utc>) -> String {
    format!(
        "repo:{}/{} is:pr updated:>={}",
        repo.owner,
        repo.name,
        cutoff.format("%Y-%m-%d")
    )
}

/// Collects pull request activity for the repositories of one installation.
pub struct PullRequestCollector<'a> {
    api: &'a dyn InstallationApi,
    policy: &'a RetryPolicy,
    sleeper: &'a dyn Sleeper,
}

impl<'a> PullRequestCollector<'a> {
    pub fn new(
        api: &'a dyn InstallationApi,
        policy: &'a RetryPolicy,
        sleeper: &'a dyn Sleeper,
    ) -> Self {
        Self {
            api,
            policy,
            sleeper,
        }
    }

    /// Record opened/closed counts for `repo` into `ledger`.
    pub async fn collect(
        &self,
        repo: &Repository,
        cutoff: DateTime<Utc>,
        ledger: &mut ActivityLedger,
    ) -> PullRequestOutcome {
        match self.collect_from_search(repo, cutoff, ledger).await {
            Ok(Some(matched)) => {
                info!("{}: {} pull requests from search", repo, matched);
                return PullRequestOutcome {
                    source: PullRequestSource::Search,
                    matched,
                };
            }
            Ok(None) => {
                info!("{}: search returned no results, paginating", repo);
            }
            Err(e) => {
                warn!("{}: pull request search failed ({}), paginating", repo, e);
            }
        }

        let matched = self.collect_from_pages(repo, cutoff, ledger).await;
        info!("{}: {} pull requests from pagination", repo, matched);
        PullRequestOutcome {
            source: PullRequestSource::Pagination,
            matched,
        }
    }

    /// `Ok(None)` means the search found nothing and the caller should paginate.
    async fn collect_from_search(
        &self,
        repo: &Repository,
        cutoff: DateTime<Utc>,
        ledger: &mut ActivityLedger,
    ) -> Result<Option<usize>> {
        let results = self
            .api
            .search_pull_requests(&search_query(repo, cutoff))
            .await?;

        if results.total_count == 0 || results.items.is_empty() {
            return Ok(None);
        }

        let repository = repo.full_name();
        let mut matched = 0;

        for raw in results.items {
            let item = match decode_item(raw) {
                Ok(item) => item,
                Err(e) => {
                    error!("{}: skipping malformed search result: {}", repository, e);
                    continue;
                }
            };

            if !item.belongs_to(repo) {
                error!(
                    "{}: skipping search result from another repository: {}",
                    repository,
                    item.repository_url
                        .as_deref()
                        .or(item.html_url.as_deref())
                        .unwrap_or("<no url>")
                );
                continue;
            }

            ledger.record_pull_request(&PullRequest::from(item), &repository, cutoff);
            matched += 1;
        }

        Ok(Some(matched))
    }

    async fn collect_from_pages(
        &self,
        repo: &Repository,
        cutoff: DateTime<Utc>,
        ledger: &mut ActivityLedger,
    ) -> usize {
        let repository = repo.full_name();
        let mut page: u32 = 0;
        let mut matched_total = 0;
        let mut rate_limit_attempts: u32 = 0;
        let mut previous_succeeded = false;

        loop {
            page += 1;
            // A retried page has already waited out the cooldown.
            if page > 1 && previous_succeeded {
                self.sleeper.sleep(self.policy.page_delay).await;
            }

            let items = match self.api.list_pull_requests(repo, page).await {
                Ok(items) => items,
                Err(e) if e.is_rate_limited() => {
                    if !self.policy.allows_retry(rate_limit_attempts) {
                        warn!(
                            "{}: still rate limited on page {} after {} retries, stopping",
                            repository, page, rate_limit_attempts
                        );
                        break;
                    }
                    rate_limit_attempts += 1;
                    previous_succeeded = false;
                    warn!(
                        "{}: rate limited on page {}, retrying in {}s",
                        repository,
                        page,
                        self.policy.cooldown.as_secs()
                    );
                    self.sleeper.sleep(self.policy.cooldown).await;
                    page -= 1;
                    continue;
                }
                Err(e) => {
                    warn!("{}: stopping pagination at page {}: {}", repository, page, e);
                    break;
                }
            };
            rate_limit_attempts = 0;
            previous_succeeded = true;

            let fetched = items.len();
            let mut matched_on_page = 0;

            for raw in items {
                let pull_request = match decode_item(raw) {
                    Ok(item) => PullRequest::from(item),
                    Err(e) => {
                        error!("{}: skipping malformed pull request: {}", repository, e);
                        continue;
                    }
                };

                if pull_request.updated_at.is_some_and(|updated| updated >= cutoff) {
                    ledger.record_pull_request(&pull_request, &repository, cutoff);
                    matched_on_page += 1;
                }
            }

            matched_total += matched_on_page;
            debug!(
                "{}: page {} had {} items, {} in window",
                repository, page, fetched, matched_on_page
            );

            if fetched < PAGE_SIZE {
                break;
            }
            // Sorted by update time, so an empty page this deep ends the window.
            if matched_on_page == 0 && page > 2 {
                break;
            }
        }

        matched_total
    }
}

fn decode_item(raw: Value) -> Result<PullRequestItem> {
    Ok(serde_json::from_value(raw)?)
}

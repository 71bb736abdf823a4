//! Collaborator seams for the GitHub API.
//!
//! The activity engine only ever talks to these traits, so the real
//! HTTP client and the in-memory test fake are interchangeable.

use crate::error::Result;
use crate::models::{Commit, Installation, Repository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Fixed page size used by every listing call.
pub const PAGE_SIZE: usize = 100;

/// Result of a keyword search over issues and pull requests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResults {
    /// Total matches reported by the search endpoint.
    #[serde(default)]
    pub total_count: u64,
    /// Raw result items, decoded one at a time by the caller.
    #[serde(default)]
    pub items: Vec<Value>,
}

/// App-level calls, authenticated with the app credential.
#[async_trait]
pub trait AppApi: Send + Sync {
    /// Numeric id of the app the credential belongs to.
    async fn app_id(&self) -> Result<u64>;

    /// All installations of the app (first page of 100).
    async fn list_installations(&self) -> Result<Vec<Installation>>;

    /// Obtain an access context scoped to one installation.
    async fn installation_api(&self, installation_id: u64) -> Result<Box<dyn InstallationApi>>;
}

/// Calls scoped to a single installation.
#[async_trait]
pub trait InstallationApi: Send + Sync {
    /// Repositories accessible to the installation (first page of 100).
    async fn list_repositories(&self) -> Result<Vec<Repository>>;

    /// Branch names of a repository (first 100 refs).
    async fn list_branches(&self, repo: &Repository) -> Result<Vec<String>>;

    /// Commits reachable from `branch` committed at or after `since` (first 100).
    async fn branch_history(
        &self,
        repo: &Repository,
        branch: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Commit>>;

    /// Keyword search for pull requests.
    async fn search_pull_requests(&self, query: &str) -> Result<SearchResults>;

    /// One page of pull requests, all states, most recently updated first.
    async fn list_pull_requests(&self, repo: &Repository, page: u32) -> Result<Vec<Value>>;
}

//! Scripted in-memory GitHub API used by the unit tests.

use crate::error::{GitHubError, Result};
use crate::github::api::{AppApi, InstallationApi, SearchResults};
use crate::models::{Commit, Installation, Repository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Scripted response for one `list_pull_requests` call.
#[derive(Debug, Clone)]
pub enum PageResponse {
    Items(Vec<Value>),
    RateLimited,
    Fail(String),
}

fn failure(message: &str) -> GitHubError {
    GitHubError::Status {
        status: 500,
        message: message.to_string(),
    }
}

/// Installation-scoped fake; every field is keyed by `owner/name`.
#[derive(Default)]
pub struct FakeInstallation {
    pub repositories: Vec<Repository>,
    pub repositories_error: Option<String>,
    pub branches: HashMap<String, Vec<String>>,
    pub branch_errors: HashMap<String, String>,
    /// Keyed by (`owner/name`, branch).
    pub histories: HashMap<(String, String), Vec<Commit>>,
    pub history_errors: HashMap<(String, String), String>,
    pub search: HashMap<String, SearchResults>,
    pub search_errors: HashMap<String, String>,
    pub pages: Mutex<HashMap<String, VecDeque<PageResponse>>>,
    /// Every (`owner/name`, page) requested, in order.
    pub page_calls: Mutex<Vec<(String, u32)>>,
    pub search_queries: Mutex<Vec<String>>,
}

impl FakeInstallation {
    pub fn with_pages(self, repo: &str, pages: Vec<PageResponse>) -> Self {
        if let Ok(mut map) = self.pages.lock() {
            map.insert(repo.to_string(), pages.into());
        }
        self
    }

    pub fn requested_pages(&self, repo: &str) -> Vec<u32> {
        self.page_calls
            .lock()
            .map(|calls| {
                calls
                    .iter()
                    .filter(|(name, _)| name == repo)
                    .map(|(_, page)| *page)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl InstallationApi for Arc<FakeInstallation> {
    async fn list_repositories(&self) -> Result<Vec<Repository>> {
        match &self.repositories_error {
            Some(message) => Err(failure(message)),
            None => Ok(self.repositories.clone()),
        }
    }

    async fn list_branches(&self, repo: &Repository) -> Result<Vec<String>> {
        let key = repo.full_name();
        if let Some(message) = self.branch_errors.get(&key) {
            return Err(failure(message));
        }
        Ok(self.branches.get(&key).cloned().unwrap_or_default())
    }

    async fn branch_history(
        &self,
        repo: &Repository,
        branch: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Commit>> {
        let key = (repo.full_name(), branch.to_string());
        if let Some(message) = self.history_errors.get(&key) {
            return Err(failure(message));
        }
        let commits = self.histories.get(&key).cloned().unwrap_or_default();
        Ok(commits
            .into_iter()
            .filter(|c| c.committed_at >= since)
            .collect())
    }

    async fn search_pull_requests(&self, query: &str) -> Result<SearchResults> {
        if let Ok(mut queries) = self.search_queries.lock() {
            queries.push(query.to_string());
        }
        let repo = query
            .split_whitespace()
            .find_map(|term| term.strip_prefix("repo:"))
            .unwrap_or_default();
        if let Some(message) = self.search_errors.get(repo) {
            return Err(failure(message));
        }
        Ok(self.search.get(repo).cloned().unwrap_or_default())
    }

    async fn list_pull_requests(&self, repo: &Repository, page: u32) -> Result<Vec<Value>> {
        let key = repo.full_name();
        if let Ok(mut calls) = self.page_calls.lock() {
            calls.push((key.clone(), page));
        }
        let next = self
            .pages
            .lock()
            .ok()
            .and_then(|mut pages| pages.get_mut(&key).and_then(VecDeque::pop_front));
        match next {
            Some(PageResponse::Items(items)) => Ok(items),
            Some(PageResponse::RateLimited) => Err(GitHubError::RateLimited { retry_after: None }),
            Some(PageResponse::Fail(message)) => Err(failure(&message)),
            None => Ok(Vec::new()),
        }
    }
}

/// App-level fake holding one scripted installation per id.
#[derive(Default)]
pub struct FakeApp {
    pub app_id: u64,
    pub installations: Vec<Installation>,
    pub installations_error: Option<String>,
    pub scoped: HashMap<u64, Arc<FakeInstallation>>,
    pub scoped_errors: HashMap<u64, String>,
}

#[async_trait]
impl AppApi for FakeApp {
    async fn app_id(&self) -> Result<u64> {
        Ok(self.app_id)
    }

    async fn list_installations(&self) -> Result<Vec<Installation>> {
        match &self.installations_error {
            Some(message) => Err(failure(message)),
            None => Ok(self.installations.clone()),
        }
    }

    async fn installation_api(&self, installation_id: u64) -> Result<Box<dyn InstallationApi>> {
        if let Some(message) = self.scoped_errors.get(&installation_id) {
            return Err(failure(message));
        }
        let scoped = self
            .scoped
            .get(&installation_id)
            .cloned()
            .unwrap_or_default();
        Ok(Box::new(scoped))
    }
}

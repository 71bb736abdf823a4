//! HTTP client for the GitHub REST and GraphQL APIs.
//!
//! `GitHubClient` exposes the two transport primitives (`rest_get` and
//! `graphql`) and implements [`InstallationApi`] on top of them.
//! `GitHubApp` wraps a client authenticated with the app credential and
//! mints installation-scoped clients.

use crate::error::{GitHubError, Result};
use crate::github::api::{AppApi, InstallationApi, SearchResults, PAGE_SIZE};
use crate::github::types::{
    AppInfo, ApiInstallation, BranchesData, GraphQlResponse, HistoryData, InstallationRepositories,
    InstallationToken,
};
use crate::models::{Commit, Installation, Repository};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, RETRY_AFTER, USER_AGENT};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

const BRANCHES_QUERY: &str = r#"
query($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) {
    refs(refPrefix: "refs/heads/", first: 100) {
      nodes { name }
    }
  }
}
"#;

const HISTORY_QUERY: &str = r#"
query($owner: String!, $name: String!, $qualifiedName: String!, $since: GitTimestamp!) {
  repository(owner: $owner, name: $name) {
    ref(qualifiedName: $qualifiedName) {
      target {
        ... on Commit {
          history(first: 100, since: $since) {
            nodes {
              oid
              committedDate
              author {
                name
                email
                user { login databaseId }
              }
            }
          }
        }
      }
    }
  }
}
"#;

/// Connection settings shared by app and installation clients.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// REST base URL, e.g. `https://api.github.com`.
    pub api_url: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
}

impl ClientSettings {
    /// GraphQL endpoint for the configured REST base.
    ///
    /// GitHub Enterprise serves REST under `/api/v3` and GraphQL under `/api/graphql`.
    pub fn graphql_url(&self) -> String {
        let base = self.api_url.trim_end_matches('/');
        match base.strip_suffix("/api/v3") {
            Some(host) => format!("{}/api/graphql", host),
            None => format!("{}/graphql", base),
        }
    }
}

/// Bearer-authenticated GitHub client.
pub struct GitHubClient {
    http: reqwest::Client,
    settings: ClientSettings,
    token: String,
}

impl GitHubClient {
    /// Create a client that authenticates every request with `token`.
    pub fn new(settings: ClientSettings, token: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            settings,
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.settings.api_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, &self.settings.user_agent)
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    /// GET a REST resource and decode the JSON body.
    pub async fn rest_get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        debug!("GET {} {:?}", path, query);
        let response = self
            .authorized(self.http.get(self.url(path)))
            .query(query)
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// POST to a REST resource with an empty body and decode the JSON response.
    pub async fn rest_post<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        debug!("POST {}", path);
        let response = self
            .authorized(self.http.post(self.url(path)))
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Run a GraphQL query and return its `data` object.
    pub async fn graphql<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T> {
        let response = self
            .authorized(self.http.post(self.settings.graphql_url()))
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let response = check_status(response).await?;
        let body: GraphQlResponse<T> = response.json().await?;

        if !body.errors.is_empty() {
            if body
                .errors
                .iter()
                .any(|e| e.kind.as_deref() == Some("RATE_LIMITED"))
            {
                return Err(GitHubError::RateLimited { retry_after: None });
            }
            let messages: Vec<&str> = body.errors.iter().map(|e| e.message.as_str()).collect();
            return Err(GitHubError::GraphQl(messages.join("; ")));
        }

        body.data
            .ok_or_else(|| GitHubError::Decode("GraphQL response without data".to_string()))
    }
}

/// Map a non-success response to a typed error.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let rate_limit_headers = RateLimitHeaders::from_headers(response.headers());
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
        .unwrap_or(body);

    Err(classify_failure(status, &rate_limit_headers, message))
}

#[derive(Debug, Default)]
struct RateLimitHeaders {
    remaining_zero: bool,
    retry_after: Option<Duration>,
}

impl RateLimitHeaders {
    fn from_headers(headers: &HeaderMap) -> Self {
        let remaining_zero = headers
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim() == "0");
        let retry_after = headers
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        Self {
            remaining_zero,
            retry_after,
        }
    }
}

fn classify_failure(
    status: StatusCode,
    headers: &RateLimitHeaders,
    message: String,
) -> GitHubError {
    let limited_status =
        status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS;
    if limited_status
        && (headers.remaining_zero
            || headers.retry_after.is_some()
            || message.to_lowercase().contains("rate limit"))
    {
        return GitHubError::RateLimited {
            retry_after: headers.retry_after,
        };
    }

    if status == StatusCode::UNAUTHORIZED {
        return GitHubError::Auth(message);
    }

    GitHubError::Status {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl InstallationApi for GitHubClient {
    async fn list_repositories(&self) -> Result<Vec<Repository>> {
        let page: InstallationRepositories = self
            .rest_get(
                "/installation/repositories",
                &[("per_page", PAGE_SIZE.to_string())],
            )
            .await?;

        Ok(page.repositories.into_iter().map(Repository::from).collect())
    }

    async fn list_branches(&self, repo: &Repository) -> Result<Vec<String>> {
        let data: BranchesData = self
            .graphql(
                BRANCHES_QUERY,
                json!({ "owner": repo.owner, "name": repo.name }),
            )
            .await?;

        Ok(data
            .repository
            .and_then(|r| r.refs)
            .map(|refs| refs.nodes.into_iter().map(|n| n.name).collect())
            .unwrap_or_default())
    }

    async fn branch_history(
        &self,
        repo: &Repository,
        branch: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Commit>> {
        let data: HistoryData = self
            .graphql(
                HISTORY_QUERY,
                json!({
                    "owner": repo.owner,
                    "name": repo.name,
                    "qualifiedName": format!("refs/heads/{}", branch),
                    "since": since.to_rfc3339_opts(SecondsFormat::Secs, true),
                }),
            )
            .await?;

        let nodes = data
            .repository
            .and_then(|r| r.git_ref)
            .and_then(|r| r.target)
            .and_then(|t| t.history)
            .map(|h| h.nodes)
            .unwrap_or_default();

        Ok(nodes.into_iter().map(Commit::from).collect())
    }

    async fn search_pull_requests(&self, query: &str) -> Result<SearchResults> {
        self.rest_get(
            "/search/issues",
            &[("q", query.to_string()), ("per_page", PAGE_SIZE.to_string())],
        )
        .await
    }

    async fn list_pull_requests(&self, repo: &Repository, page: u32) -> Result<Vec<Value>> {
        self.rest_get(
            &format!("/repos/{}/{}/pulls", repo.owner, repo.name),
            &[
                ("state", "all".to_string()),
                ("sort", "updated".to_string()),
                ("direction", "desc".to_string()),
                ("per_page", PAGE_SIZE.to_string()),
                ("page", page.to_string()),
            ],
        )
        .await
    }
}

/// App-authenticated entry point.
pub struct GitHubApp {
    client: GitHubClient,
    settings: ClientSettings,
}

impl GitHubApp {
    /// Create an app client from a signed app JWT.
    pub fn new(settings: ClientSettings, app_jwt: String) -> Result<Self> {
        let client = GitHubClient::new(settings.clone(), app_jwt)?;
        Ok(Self { client, settings })
    }
}

#[async_trait]
impl AppApi for GitHubApp {
    async fn app_id(&self) -> Result<u64> {
        let app: AppInfo = self.client.rest_get("/app", &[]).await?;
        Ok(app.id)
    }

    async fn list_installations(&self) -> Result<Vec<Installation>> {
        let installations: Vec<ApiInstallation> = self
            .client
            .rest_get("/app/installations", &[("per_page", PAGE_SIZE.to_string())])
            .await?;

        Ok(installations.into_iter().map(Installation::from).collect())
    }

    async fn installation_api(&self, installation_id: u64) -> Result<Box<dyn InstallationApi>> {
        let token: InstallationToken = self
            .client
            .rest_post(&format!("/app/installations/{}/access_tokens", installation_id))
            .await?;

        let client = GitHubClient::new(self.settings.clone(), token.token)?;
        Ok(Box::new(client))
    }
}

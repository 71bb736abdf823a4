//! Wire shapes returned by the GitHub REST and GraphQL endpoints.

use crate::models::{Commit, Installation, PullRequest, Repository};
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AppInfo {
    pub id: u64,
}

#[derive(Debug, Deserialize)]
pub struct ApiAccount {
    pub login: String,
    #[serde(rename = "type", default)]
    pub account_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiInstallation {
    pub id: u64,
    pub account: ApiAccount,
}

impl From<ApiInstallation> for Installation {
    fn from(value: ApiInstallation) -> Self {
        Self {
            id: value.id,
            account: value.account.login,
            account_type: value
                .account
                .account_type
                .unwrap_or_else(|| "User".to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct InstallationToken {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiRepository {
    pub name: String,
    pub owner: ApiAccount,
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<ApiRepository> for Repository {
    fn from(value: ApiRepository) -> Self {
        Self {
            owner: value.owner.login,
            name: value.name,
            pushed_at: value.pushed_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct InstallationRepositories {
    #[serde(default)]
    pub repositories: Vec<ApiRepository>,
}

/// GraphQL response envelope.
#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlErrorEntry>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlErrorEntry {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct Nodes<T> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct BranchesData {
    pub repository: Option<BranchesRepository>,
}

#[derive(Debug, Deserialize)]
pub struct BranchesRepository {
    pub refs: Option<Nodes<BranchNode>>,
}

#[derive(Debug, Deserialize)]
pub struct BranchNode {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryData {
    pub repository: Option<HistoryRepository>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryRepository {
    #[serde(rename = "ref")]
    pub git_ref: Option<HistoryRef>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryRef {
    pub target: Option<HistoryTarget>,
}

/// Only commit targets carry a history; tags and trees leave it empty.
#[derive(Debug, Deserialize)]
pub struct HistoryTarget {
    #[serde(default)]
    pub history: Option<Nodes<HistoryNode>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryNode {
    pub oid: String,
    pub committed_date: DateTime<Utc>,
    #[serde(default)]
    pub author: Option<GitActor>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitActor {
    pub name: Option<String>,
    pub email: Option<String>,
    pub user: Option<GitActorUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitActorUser {
    pub login: Option<String>,
    pub database_id: Option<u64>,
}

impl From<HistoryNode> for Commit {
    fn from(node: HistoryNode) -> Self {
        let author = node.author;
        let user = author.as_ref().and_then(|a| a.user.as_ref());
        Self {
            author_login: user.and_then(|u| u.login.clone()),
            user_id: user.and_then(|u| u.database_id),
            author_name: author.as_ref().and_then(|a| a.name.clone()),
            author_email: author.as_ref().and_then(|a| a.email.clone()),
            oid: node.oid,
            committed_at: node.committed_date,
        }
    }
}

/// Pull request author as it appears in REST payloads.
#[derive(Debug, Deserialize)]
pub struct ApiUser {
    pub login: Option<String>,
    pub id: Option<u64>,
    #[serde(rename = "databaseId")]
    pub database_id: Option<i64>,
}

impl ApiUser {
    /// `id` first, then `databaseId`; neither is treated as authoritative.
    pub fn numeric_id(&self) -> Option<u64> {
        self.id
            .or_else(|| self.database_id.and_then(|id| u64::try_from(id).ok()))
    }
}

/// A pull request item from either the search or the pulls endpoint.
#[derive(Debug, Deserialize)]
pub struct PullRequestItem {
    pub number: Option<u64>,
    pub user: Option<ApiUser>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub repository_url: Option<String>,
    pub html_url: Option<String>,
}

impl PullRequestItem {
    /// Owner and name of the repository the item belongs to, from its URLs.
    pub fn repository(&self) -> Option<(String, String)> {
        self.repository_url
            .as_deref()
            .and_then(parse_api_repository_url)
            .or_else(|| self.html_url.as_deref().and_then(parse_pull_html_url))
    }

    /// Whether the item belongs to `repo` (case-insensitive, like GitHub logins).
    pub fn belongs_to(&self, repo: &Repository) -> bool {
        self.repository().is_some_and(|(owner, name)| {
            owner.eq_ignore_ascii_case(&repo.owner) && name.eq_ignore_ascii_case(&repo.name)
        })
    }
}

impl From<PullRequestItem> for PullRequest {
    fn from(item: PullRequestItem) -> Self {
        Self {
            number: item.number,
            author_login: item.user.as_ref().and_then(|u| u.login.clone()),
            user_id: item.user.as_ref().and_then(ApiUser::numeric_id),
            created_at: item.created_at,
            closed_at: item.closed_at,
            updated_at: item.updated_at,
        }
    }
}

/// Parse `https://<host>/repos/{owner}/{name}` into owner and name.
pub fn parse_api_repository_url(url: &str) -> Option<(String, String)> {
    let (_, rest) = url.split_once("/repos/")?;
    let mut parts = rest.trim_end_matches('/').split('/');
    let owner = parts.next().filter(|s| !s.is_empty())?;
    let name = parts.next().filter(|s| !s.is_empty())?;
    if parts.next().is_some() {
        return None;
    }
    Some((owner.to_string(), name.to_string()))
}

/// Parse `https://<host>/{owner}/{name}/pull/{number}` into owner and name.
pub fn parse_pull_html_url(url: &str) -> Option<(String, String)> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let parts: Vec<&str> = rest.split('/').collect();
    match parts.as_slice() {
        [_host, owner, name, "pull", number, ..]
            if !owner.is_empty() && !name.is_empty() && number.parse::<u64>().is_ok() =>
        {
            Some((owner.to_string(), name.to_string()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_api_repository_url() {
        let result = parse_api_repository_url("https://api.github.com/repos/rust-lang/rust");
        assert_eq!(result, Some(("rust-lang".to_string(), "rust".to_string())));
    }

    #[test]
    fn test_parse_api_repository_url_enterprise() {
        let result = parse_api_repository_url("https://ghe.example.com/api/v3/repos/acme/api");
        assert_eq!(result, Some(("acme".to_string(), "api".to_string())));
    }

    #[test]
    fn test_parse_api_repository_url_invalid() {
        assert_eq!(parse_api_repository_url("https://api.github.com/users/octocat"), None);
        assert_eq!(parse_api_repository_url("https://api.github.com/repos/acme"), None);
        assert_eq!(
            parse_api_repository_url("https://api.github.com/repos/acme/api/issues"),
            None
        );
    }

    #[test]
    fn test_parse_pull_html_url() {
        let result = parse_pull_html_url("https://github.com/acme/api/pull/42");
        assert_eq!(result, Some(("acme".to_string(), "api".to_string())));
        assert_eq!(parse_pull_html_url("https://github.com/acme/api/issues/42"), None);
        assert_eq!(parse_pull_html_url("not a url"), None);
    }

    #[test]
    fn test_pull_request_item_belongs_to() {
        let item: PullRequestItem = serde_json::from_value(json!({
            "number": 3,
            "user": {"login": "hubot", "id": 7},
            "created_at": "2024-05-01T10:00:00Z",
            "closed_at": null,
            "repository_url": "https://api.github.com/repos/Acme/API",
        }))
        .unwrap();

        let repo = Repository {
            owner: "acme".to_string(),
            name: "api".to_string(),
            pushed_at: None,
            updated_at: None,
        };
        assert!(item.belongs_to(&repo));

        let other = Repository {
            name: "web".to_string(),
            ..repo
        };
        assert!(!item.belongs_to(&other));
    }

    #[test]
    fn test_user_id_falls_back_to_database_id() {
        let user: ApiUser =
            serde_json::from_value(json!({"login": "hubot", "databaseId": 99})).unwrap();
        assert_eq!(user.numeric_id(), Some(99));

        let user: ApiUser =
            serde_json::from_value(json!({"login": "hubot", "id": 5, "databaseId": 99})).unwrap();
        assert_eq!(user.numeric_id(), Some(5));
    }

    #[test]
    fn test_history_node_into_commit() {
        let node: HistoryNode = serde_json::from_value(json!({
            "oid": "deadbeef",
            "committedDate": "2024-05-02T08:30:00Z",
            "author": {
                "name": "Octo Cat",
                "email": "octo@example.com",
                "user": {"login": "octocat", "databaseId": 583231}
            }
        }))
        .unwrap();

        let commit = Commit::from(node);
        assert_eq!(commit.oid, "deadbeef");
        assert_eq!(commit.author_identity(), "octocat");
        assert_eq!(commit.user_id, Some(583231));
    }
}

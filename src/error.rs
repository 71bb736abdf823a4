//! Error types for talking to the GitHub API.

use std::time::Duration;
use thiserror::Error;

/// Errors produced by the GitHub transport and the typed calls built on it.
#[derive(Error, Debug)]
pub enum GitHubError {
    /// Primary or secondary rate limit hit.
    #[error("rate limit exceeded{}", retry_suffix(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    /// Non-success HTTP status.
    #[error("GitHub API error {status}: {message}")]
    Status { status: u16, message: String },

    /// Connection, timeout or other transport failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// GraphQL response carried an `errors` array.
    #[error("GraphQL errors: {0}")]
    GraphQl(String),

    /// Response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// Credential rejected or did not match the integration.
    #[error("authentication failed: {0}")]
    Auth(String),
}

impl GitHubError {
    /// Whether this failure should be retried after a cooldown.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, GitHubError::RateLimited { .. })
    }
}

impl From<serde_json::Error> for GitHubError {
    fn from(e: serde_json::Error) -> Self {
        GitHubError::Decode(e.to_string())
    }
}

fn retry_suffix(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!(" (retry after {}s)", d.as_secs()),
        None => String::new(),
    }
}

/// Result alias for GitHub calls.
pub type Result<T> = std::result::Result<T, GitHubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_detection() {
        let err = GitHubError::RateLimited { retry_after: None };
        assert!(err.is_rate_limited());

        let err = GitHubError::Status {
            status: 404,
            message: "Not Found".to_string(),
        };
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn test_rate_limited_display() {
        let err = GitHubError::RateLimited {
            retry_after: Some(Duration::from_secs(30)),
        };
        assert_eq!(err.to_string(), "rate limit exceeded (retry after 30s)");

        let err = GitHubError::RateLimited { retry_after: None };
        assert_eq!(err.to_string(), "rate limit exceeded");
    }

    #[test]
    fn test_json_error_becomes_decode() {
        let err: GitHubError = serde_json::from_str::<u64>("\"seven\"").unwrap_err().into();
        assert!(matches!(err, GitHubError::Decode(_)));
        assert!(err.to_string().starts_with("unexpected response:"));
    }
}

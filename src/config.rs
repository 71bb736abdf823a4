//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.gh-activity.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".gh-activity.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// GitHub connection settings.
    #[serde(default)]
    pub github: GitHubConfig,

    /// Collection settings.
    #[serde(default)]
    pub collection: CollectionConfig,

    /// Rate-limit backoff settings.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// GitHub connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// REST API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Numeric id of the GitHub App.
    #[serde(default)]
    pub app_id: Option<u64>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            app_id: None,
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("gh-activity/{}", env!("CARGO_PKG_VERSION"))
}

/// What to collect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Lookback window in days.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Account logins to include (empty = all installations).
    #[serde(default)]
    pub accounts: Vec<String>,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            lookback_days: default_lookback_days(),
            accounts: Vec::new(),
        }
    }
}

fn default_lookback_days() -> u32 {
    crate::collector::DEFAULT_LOOKBACK_DAYS
}

/// Rate-limit backoff for paginated pull request listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Seconds to wait before retrying a rate-limited page.
    #[serde(default = "default_cooldown")]
    pub cooldown_seconds: u64,

    /// Milliseconds to pause between page fetches.
    #[serde(default = "default_page_delay")]
    pub page_delay_ms: u64,

    /// Maximum consecutive retries per page (unset = unbounded).
    #[serde(default)]
    pub max_retries: Option<u32>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: default_cooldown(),
            page_delay_ms: default_page_delay(),
            max_retries: None,
        }
    }
}

fn default_cooldown() -> u64 {
    60
}

fn default_page_delay() -> u64 {
    1000
}

/// Report output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format.
    #[serde(default)]
    pub format: ReportFormat,

    /// Write the report to this file instead of stdout.
    #[serde(default)]
    pub output: Option<String>,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Plain text digest (default)
    #[default]
    Text,
    /// Full JSON report
    Json,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref api_url) = args.api_url {
            self.github.api_url = api_url.clone();
        }
        if let Some(app_id) = args.app_id {
            self.github.app_id = Some(app_id);
        }
        if let Some(timeout) = args.timeout {
            self.github.timeout_seconds = timeout;
        }

        if let Some(days) = args.days {
            self.collection.lookback_days = days;
        }
        if !args.accounts.is_empty() {
            self.collection.accounts = args.accounts.clone();
        }

        if let Some(format) = args.format {
            self.report.format = format;
        }
        if let Some(ref output) = args.output {
            self.report.output = Some(output.display().to_string());
        }
    }

    /// Check values that cannot be expressed in the type system.
    pub fn validate(&self) -> Result<()> {
        if self.collection.lookback_days == 0 {
            anyhow::bail!("Lookback days must be at least 1");
        }
        let api_url = &self.github.api_url;
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            anyhow::bail!("API URL must start with 'http://' or 'https://'");
        }
        if self.github.timeout_seconds == 0 {
            anyhow::bail!("Timeout must be at least 1 second");
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.collection.lookback_days, 7);
        assert_eq!(config.rate_limit.cooldown_seconds, 60);
        assert_eq!(config.rate_limit.max_retries, None);
        assert_eq!(config.report.format, ReportFormat::Text);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[github]
api_url = "https://ghe.example.com/api/v3"
app_id = 12345

[collection]
lookback_days = 30
accounts = ["acme"]

[rate_limit]
cooldown_seconds = 120
max_retries = 5

[report]
format = "json"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.github.api_url, "https://ghe.example.com/api/v3");
        assert_eq!(config.github.app_id, Some(12345));
        assert_eq!(config.github.timeout_seconds, 30);
        assert_eq!(config.collection.lookback_days, 30);
        assert_eq!(config.collection.accounts, vec!["acme"]);
        assert_eq!(config.rate_limit.cooldown_seconds, 120);
        assert_eq!(config.rate_limit.page_delay_ms, 1000);
        assert_eq!(config.rate_limit.max_retries, Some(5));
        assert_eq!(config.report.format, ReportFormat::Json);
    }

    #[test]
    fn test_zero_days_rejected() {
        let mut config = Config::default();
        config.collection.lookback_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[github]"));
        assert!(toml_str.contains("[collection]"));
        assert!(toml_str.contains("[rate_limit]"));
    }
}

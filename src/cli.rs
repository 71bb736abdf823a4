//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::config::ReportFormat;
use clap::Parser;
use std::path::PathBuf;

/// gh-activity - contributor activity digest for a GitHub App
///
/// Walks every repository the app's installations can access and
/// summarizes commits and pull requests per contributor over a
/// trailing window.
///
/// Examples:
///   gh-activity --app-id 12345 --app-jwt "$JWT"
///   gh-activity --days 30 --format json --output activity.json
///   gh-activity --account acme --fail-on-error
///   gh-activity --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// GitHub App id the credential belongs to
    #[arg(long, value_name = "ID", env = "GITHUB_APP_ID")]
    pub app_id: Option<u64>,

    /// Signed GitHub App JWT used to list installations and mint tokens
    #[arg(
        long,
        value_name = "JWT",
        env = "GITHUB_APP_JWT",
        hide_env_values = true,
        required_unless_present = "init_config"
    )]
    pub app_jwt: Option<String>,

    /// Lookback window in days (default: from config or 7)
    #[arg(short, long, value_name = "DAYS")]
    pub days: Option<u32>,

    /// GitHub REST API base URL
    ///
    /// For GitHub Enterprise use https://<host>/api/v3.
    #[arg(long, value_name = "URL", env = "GITHUB_API_URL")]
    pub api_url: Option<String>,

    /// Only report on these account logins (repeatable)
    #[arg(short, long = "account", value_name = "LOGIN")]
    pub accounts: Vec<String>,

    /// Output format (text, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<ReportFormat>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .gh-activity.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Exit with code 2 if any installation could not be processed
    #[arg(long)]
    pub fail_on_error: bool,

    /// Generate a default .gh-activity.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.app_jwt.as_deref().map_or(true, |jwt| jwt.trim().is_empty()) {
            return Err("An app JWT is required (--app-jwt or GITHUB_APP_JWT)".to_string());
        }

        if let Some(days) = self.days {
            if days == 0 {
                return Err("Days must be at least 1".to_string());
            }
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            app_id: Some(12345),
            app_jwt: Some("eyJhbGciOiJSUzI1NiJ9.e30.sig".to_string()),
            days: None,
            api_url: None,
            accounts: Vec::new(),
            format: None,
            output: None,
            config: None,
            timeout: None,
            verbose: false,
            quiet: false,
            fail_on_error: false,
            init_config: false,
        }
    }

    #[test]
    fn test_valid_args() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_zero_days() {
        let mut args = make_args();
        args.days = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_jwt() {
        let mut args = make_args();
        args.app_jwt = Some("  ".to_string());
        assert!(args.validate().is_err());

        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args();
        args.api_url = Some("api.github.com".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_parse_repeated_accounts() {
        let args = Args::try_parse_from([
            "gh-activity",
            "--app-jwt",
            "token",
            "--account",
            "acme",
            "-a",
            "octo",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(args.accounts, vec!["acme", "octo"]);
        assert_eq!(args.format, Some(ReportFormat::Json));
    }
}

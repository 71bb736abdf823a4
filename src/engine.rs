//! Run orchestration across installations.
//!
//! Installations and their repositories are processed one at a time.
//! A failure inside one installation becomes an error record for it and
//! the run moves on; only setup and installation enumeration are fatal.

use crate::analysis::ActivityLedger;
use crate::collector::{
    collect_commits, cutoff_date, filter_active_repositories, PullRequestCollector, RetryPolicy,
    Sleeper,
};
use crate::error::{GitHubError, Result as GitHubResult};
use crate::github::AppApi;
use crate::models::{
    ActivityReport, AuthorSummary, Installation, InstallationError, InstallationResult,
    InstallationStats,
};
use crate::report::generate_summary;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{debug, error, info};

/// Configuration for a run.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Integration (app) id the credential must belong to.
    pub app_id: u64,
    /// Lookback window in days, validated to be positive.
    pub lookback_days: u32,
    /// Account logins to include; empty includes every installation.
    pub accounts: Vec<String>,
    pub retry: RetryPolicy,
    pub show_progress: bool,
}

/// Drives collection for every installation of one app.
pub struct ActivityEngine<'a> {
    app: &'a dyn AppApi,
    sleeper: &'a dyn Sleeper,
    config: EngineConfig,
}

impl<'a> ActivityEngine<'a> {
    pub fn new(app: &'a dyn AppApi, sleeper: &'a dyn Sleeper, config: EngineConfig) -> Self {
        Self {
            app,
            sleeper,
            config,
        }
    }

    /// Collect activity for every installation and render the digest.
    pub async fn run(&self) -> Result<ActivityReport> {
        self.verify_app().await?;

        let cutoff = cutoff_date(self.config.lookback_days);
        info!(
            "Collecting activity since {}",
            cutoff.format("%Y-%m-%d %H:%M:%S UTC")
        );

        let installations = self
            .app
            .list_installations()
            .await
            .context("Failed to list app installations")?;
        info!("Found {} installations", installations.len());

        let mut results = Vec::new();
        for installation in &installations {
            if !self.is_selected(installation) {
                debug!("Skipping installation for {}", installation.account);
                continue;
            }
            results.push(self.process_installation(installation, cutoff).await);
        }

        let summary = generate_summary(&results);
        Ok(ActivityReport {
            summary,
            detailed_results: results,
        })
    }

    async fn verify_app(&self) -> Result<()> {
        let actual = self
            .app
            .app_id()
            .await
            .context("Failed to authenticate as the app")?;

        if actual != self.config.app_id {
            return Err(GitHubError::Auth(format!(
                "credential belongs to app {}, expected {}",
                actual, self.config.app_id
            ))
            .into());
        }
        Ok(())
    }

    fn is_selected(&self, installation: &Installation) -> bool {
        self.config.accounts.is_empty()
            || self
                .config
                .accounts
                .iter()
                .any(|a| a.eq_ignore_ascii_case(&installation.account))
    }

    async fn process_installation(
        &self,
        installation: &Installation,
        cutoff: DateTime<Utc>,
    ) -> InstallationResult {
        info!(
            "Processing installation {} ({})",
            installation.id, installation.account
        );

        match self.collect_installation(installation, cutoff).await {
            Ok(authors) => InstallationResult::Success(InstallationStats {
                installation_id: installation.id,
                account: installation.account.clone(),
                account_type: installation.account_type.clone(),
                period_days: self.config.lookback_days,
                authors,
            }),
            Err(e) => {
                error!(
                    "Installation {} ({}) failed: {}",
                    installation.id, installation.account, e
                );
                InstallationResult::Error(InstallationError {
                    installation_id: installation.id,
                    account: installation.account.clone(),
                    error: e.to_string(),
                })
            }
        }
    }

    async fn collect_installation(
        &self,
        installation: &Installation,
        cutoff: DateTime<Utc>,
    ) -> GitHubResult<Vec<AuthorSummary>> {
        let api = self.app.installation_api(installation.id).await?;
        let repositories = api.list_repositories().await?;
        let active = filter_active_repositories(repositories, cutoff);
        info!(
            "{}: {} repositories active in window",
            installation.account,
            active.len()
        );

        let progress = self.progress_bar(active.len() as u64, &installation.account);
        let pulls = PullRequestCollector::new(api.as_ref(), &self.config.retry, self.sleeper);
        let mut ledger = ActivityLedger::new();

        for repo in &active {
            progress.set_message(repo.full_name());
            let commits = collect_commits(api.as_ref(), repo, cutoff, &mut ledger).await;
            let outcome = pulls.collect(repo, cutoff, &mut ledger).await;
            debug!(
                "{}: {} commits, {} pull requests via {:?}",
                repo, commits, outcome.matched, outcome.source
            );
            progress.inc(1);
        }
        progress.finish_and_clear();

        info!(
            "{}: {} contributors",
            installation.account,
            ledger.len()
        );
        Ok(ledger.into_summaries())
    }

    fn progress_bar(&self, len: u64, account: &str) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_prefix(account.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }
}

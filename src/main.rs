//! gh-activity - contributor activity digest for a GitHub App
//!
//! A CLI tool that walks every repository reachable through a GitHub
//! App's installations and summarizes per-contributor commits and pull
//! requests over a trailing window.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (authentication, config, installation listing, etc.)
//!   2 - At least one installation failed and --fail-on-error was set

mod analysis;
mod cli;
mod collector;
mod config;
mod engine;
mod error;
mod github;
mod models;
mod report;

use anyhow::{Context, Result};
use cli::Args;
use collector::{RetryPolicy, TokioSleeper};
use config::{Config, ReportFormat, CONFIG_FILE_NAME};
use engine::{ActivityEngine, EngineConfig};
use github::{ClientSettings, GitHubApp};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("gh-activity v{}", env!("CARGO_PKG_VERSION"));
    debug!("Verbose: {}, quiet: {}", args.verbose, args.quiet);

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .gh-activity.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to set the app id, lookback window and rate-limit backoff.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete collection workflow. Returns exit code (0 or 2).
async fn run(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    let app_id = config
        .github
        .app_id
        .context("An app id is required (--app-id, GITHUB_APP_ID or [github].app_id)")?;
    let app_jwt = args
        .app_jwt
        .clone()
        .context("An app JWT is required (--app-jwt or GITHUB_APP_JWT)")?;

    let settings = ClientSettings {
        api_url: config.github.api_url.clone(),
        user_agent: config.github.user_agent.clone(),
        timeout_seconds: config.github.timeout_seconds,
    };
    let app = GitHubApp::new(settings, app_jwt).context("Failed to create GitHub client")?;

    let engine_config = EngineConfig {
        app_id,
        lookback_days: config.collection.lookback_days,
        accounts: config.collection.accounts.clone(),
        retry: RetryPolicy::from(&config.rate_limit),
        show_progress: !args.quiet,
    };

    info!(
        "Collecting {} days of activity from {}",
        engine_config.lookback_days, config.github.api_url
    );

    let sleeper = TokioSleeper;
    let report = ActivityEngine::new(&app, &sleeper, engine_config)
        .run()
        .await?;

    let output = match config.report.format {
        ReportFormat::Json => report::generate_json_report(&report)?,
        ReportFormat::Text => report.summary.clone(),
    };

    match config.report.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path))?;
            info!("Report saved to {}", path);
        }
        None => print!("{}", output),
    }

    let failed = report.error_count();
    info!(
        "Processed {} installations ({} failed) in {:.1}s",
        report.detailed_results.len(),
        failed,
        start_time.elapsed().as_secs_f64()
    );

    if args.fail_on_error && failed > 0 {
        warn!(
            "{} installations failed. Failing (exit code 2).",
            failed
        );
        return Ok(2);
    }

    Ok(0)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

//! CLI for the Renovate pull request ingester.
//!
//! Collects the bot's dependency update pull requests and the onboarding
//! history of every configured repository, then replaces the contents of
//! the analytics database with the result.

use clap::builder::BoolishValueParser;
use clap::Parser;
use renovate_ingest::{
    load_settings, CollectedRun, IngestConfig, ProviderKind, RunSummary, Runner, RunnerError,
    Settings,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Renovate Ingest - Collect Renovate pull requests and onboarding status into a database.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML settings file. Arguments and environment variables
    /// take precedence over its values.
    #[arg(long, env = "RENOVATE_INGEST_CONFIG")]
    config: Option<PathBuf>,

    /// Hosting provider (github or gitlab).
    #[arg(long, env = "SCM_PROVIDER")]
    provider: Option<ProviderKind>,

    /// API root for self-hosted instances.
    #[arg(long, env = "API_BASE_URL")]
    api_base_url: Option<String>,

    /// Personal Access Token.
    #[arg(long, env = "PAT", hide_env_values = true)]
    token: Option<String>,

    /// Repositories to ingest: owner/repo, owner, owner/* or user:name.
    #[arg(long, env = "REPOS", value_delimiter = ',')]
    repos: Vec<String>,

    /// Label carried by Renovate pull requests.
    #[arg(long, env = "RENOVATE_PR_LABEL")]
    pr_label: Option<String>,

    /// Account Renovate opens pull requests as.
    #[arg(long, env = "RENOVATE_USER")]
    bot_user: Option<String>,

    /// Label marking security updates.
    #[arg(long, env = "RENOVATE_PR_SECURITY_LABEL")]
    security_label: Option<String>,

    /// Pull requests carrying any of these labels are skipped.
    #[arg(long, env = "RENOVATE_IGNORE_PR_LABELS", value_delimiter = ',')]
    ignore_labels: Vec<String>,

    /// Distinguish major updates that skip a major version.
    #[arg(
        long,
        env = "RENOVATE_DETECT_MULTIPLE_MAJOR",
        value_parser = BoolishValueParser::new(),
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    detect_multiple_major: Option<bool>,

    /// Title pattern of the onboarding pull request.
    #[arg(long, env = "RENOVATE_ONBOARDING_PR_REGEX")]
    onboarding_pr_pattern: Option<String>,

    /// How far back onboarding is sampled, in weeks.
    #[arg(
        long,
        env = "RENOVATE_ONBOARDING_STATUS_SAMPLING_INTERVAL_MAX_PAST_WEEKS"
    )]
    sampling_max_weeks: Option<u32>,

    /// Distance between onboarding samples, in weeks.
    #[arg(long, env = "RENOVATE_ONBOARDING_STATUS_SAMPLING_INTERVAL_IN_WEEKS")]
    sampling_interval_weeks: Option<u32>,

    /// SQLite database path.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Maximum repositories processed concurrently.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Collect without writing to the database.
    #[arg(long)]
    dry_run: bool,
}

impl Args {
    fn into_settings(self) -> Settings {
        Settings {
            provider: self.provider,
            api_base_url: self.api_base_url,
            token: self.token,
            repositories: self.repos,
            pr_label: self.pr_label,
            bot_username: self.bot_user,
            security_label: self.security_label,
            ignore_labels: self.ignore_labels,
            detect_multiple_major: self.detect_multiple_major,
            onboarding_pr_pattern: self.onboarding_pr_pattern,
            config_filenames: None,
            sampling_max_weeks: self.sampling_max_weeks,
            sampling_interval_weeks: self.sampling_interval_weeks,
            database_url: self.database_url,
            concurrency: self.concurrency,
            max_retries: None,
            dry_run: self.dry_run.then_some(true),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args = Args::parse();

    let collected = tokio::select! {
        result = collect(args) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, nothing was written");
            return ExitCode::from(1);
        }
    };

    // The Ctrl-C handler stays installed from here on, so an interrupt during
    // the write no longer ends the process before the transaction finishes.
    match commit(collected).await {
        Ok(summary) => {
            print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Critical failure, nothing was written");
            ExitCode::from(1)
        }
    }
}

/// Initializes tracing with environment filter support.
///
/// Sets up the global tracing subscriber with:
/// - Compact log formatting (single-line output)
/// - Log level filtering via `RUST_LOG` env var (defaults to "info")
fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

/// Loads the configuration and collects every repository.
async fn collect(args: Args) -> Result<CollectedRun, RunnerError> {
    let base = match &args.config {
        Some(path) => load_settings(path)?,
        None => Settings::default(),
    };
    let config = IngestConfig::from_settings(base.merge(args.into_settings()))?;
    let runner = Runner::from_config(config)?;
    runner.collect().await
}

async fn commit(collected: Result<CollectedRun, RunnerError>) -> Result<RunSummary, RunnerError> {
    collected?.commit().await
}

/// Prints the final run summary.
fn print_summary(summary: &RunSummary) {
    println!("\nSummary:");
    println!(
        "  Mode: {}",
        if summary.dry_run { "Dry Run" } else { "Live" }
    );
    println!(
        "  Repositories processed: {}",
        summary.repositories_processed
    );
    println!("  Repositories failed: {}", summary.repositories_failed);
    println!(
        "  Pull requests ingested: {}",
        summary.pull_requests_ingested
    );
    println!("  Pull requests ignored: {}", summary.pull_requests_ignored);
    println!("  Pull requests renamed: {}", summary.pull_requests_retitled);
    println!(
        "  Pull requests without updates: {}",
        summary.pull_requests_unparsed
    );
    println!("  Dependency updates: {}", summary.dependency_updates);
    println!("  Onboarding samples: {}", summary.onboarding_samples);

    if !summary.dry_run {
        println!(
            "  Committed: {}",
            if summary.committed { "yes" } else { "no" }
        );
    }
}

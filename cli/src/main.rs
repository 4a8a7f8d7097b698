//! CLI for the issue migrator.
//!
//! Migrates a source tracker's issues into a GitHub repository as described
//! by a migration TOML file, resuming from the ledger of earlier runs.

use clap::Parser;
use issue_migrator::{RunSummary, Runner, RunnerConfig, RunnerError};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Issue Migrator - Import an issue tracker's history into GitHub.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the migration configuration file.
    #[arg(long, default_value = "migration.toml")]
    config: PathBuf,

    /// GitHub Personal Access Token.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Preview payloads without changing the target repository.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    init_tracing();

    // Parse arguments
    let args = Args::parse();

    // Run the main logic
    match run(args).await {
        Ok(summary) => {
            print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Critical failure");
            ExitCode::FAILURE
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

/// Installs aws-lc-rs as the process-wide rustls crypto provider.
///
/// Returns false if a provider was already installed.
fn install_crypto_provider() -> bool {
    let installed = rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_ok();
    if !installed {
        debug!("A rustls crypto provider is already installed");
    }
    installed
}

/// Main execution logic.
async fn run(args: Args) -> Result<RunSummary, RunnerError> {
    install_crypto_provider();

    let config = RunnerConfig::new(args.config, args.token, args.dry_run);
    let runner = Runner::new(config)?;
    runner.run().await
}

/// Prints the final run summary.
fn print_summary(summary: &RunSummary) {
    println!("\nSummary:");
    println!(
        "  Mode: {}",
        if summary.dry_run { "Dry Run" } else { "Live" }
    );
    println!("  Issues collected: {}", summary.issues_collected);
    println!("  Already migrated: {}", summary.already_migrated);

    if !summary.dry_run {
        println!("  Issues imported: {}", summary.primary_imported);
        println!("  Issues failed: {}", summary.primary_failed);
        println!("  Backport holders imported: {}", summary.holders_imported);
        println!("  Backport holders skipped: {}", summary.holders_skipped);
        println!("  Backport holders failed: {}", summary.holders_failed);
        println!("  Cross-links posted: {}", summary.links_posted);
        println!("  Cross-links failed: {}", summary.links_failed);
    }
    println!("  Data integrity problems: {}", summary.integrity_problems);

    if summary.halted {
        println!("\n  Halted before backports: re-run to retry the failed issues.");
    }
}

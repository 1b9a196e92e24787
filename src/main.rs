use anyhow::{bail, Context};
use clap::Parser;
use drivecheck::config::{CheckConfig, Tunables};
use drivecheck::drive::{AccessToken, GoogleDriveClient};
use drivecheck::CheckEngine;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

/// Compare a local directory tree against a cloud drive backup.
#[derive(Debug, Parser)]
#[command(name = "drivecheck", version, about)]
struct Cli {
    /// Local directory to compare.
    local_path: PathBuf,

    /// Remote folder id to compare against (default: the entire drive).
    #[arg(long)]
    drive_folder: Option<String>,

    /// Skip cache reads and rescan both sides.
    #[arg(long)]
    no_cache: bool,

    /// Drop every cache entry before the run.
    #[arg(long)]
    clear_cache: bool,

    /// Report output path.
    #[arg(long, default_value = "report.json")]
    output: PathBuf,

    /// Cache directory.
    #[arg(long, default_value = ".cache")]
    cache_dir: PathBuf,

    /// Optional JSON file with tunables (page size, retries, ignore lists).
    #[arg(long)]
    config: Option<PathBuf>,

    /// File containing the Drive access token (default: the
    /// DRIVE_ACCESS_TOKEN environment variable).
    #[arg(long)]
    token_file: Option<PathBuf>,

    /// Also write logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Debug-level logging.
    #[arg(short, long)]
    verbose: bool,
}

/// The token itself comes from the external auth flow; this binary only
/// picks up its result.
fn load_token(cli: &Cli) -> anyhow::Result<AccessToken> {
    if let Some(path) = &cli.token_file {
        let token = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read token file {}", path.display()))?;
        return Ok(AccessToken::new(token.trim()));
    }
    match std::env::var("DRIVE_ACCESS_TOKEN") {
        Ok(token) if !token.trim().is_empty() => Ok(AccessToken::new(token.trim())),
        _ => bail!("no access token: set DRIVE_ACCESS_TOKEN or pass --token-file"),
    }
}

fn build_config(cli: &Cli) -> CheckConfig {
    let mut config = CheckConfig::new(cli.local_path.clone());
    config.remote_folder = cli.drive_folder.clone();
    config.cache_dir = cli.cache_dir.clone();
    config.output = cli.output.clone();
    config.bypass_cache = cli.no_cache;
    config.clear_cache = cli.clear_cache;
    if let Some(path) = &cli.config {
        config.tunables = Tunables::load(path);
    }
    config
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = match drivecheck::logging::init(cli.verbose, cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    let token = match load_token(&cli) {
        Ok(token) => token,
        Err(e) => {
            error!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    let client = Arc::new(GoogleDriveClient::new(token));
    let engine = CheckEngine::new(build_config(&cli), client);

    // Ctrl-C stops issuing new work; in-flight calls are dropped.
    let cancel = engine.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling");
            cancel.store(true, std::sync::atomic::Ordering::SeqCst);
        }
    });

    match engine.run().await {
        Ok(report) => {
            info!(path = %cli.output.display(), "done");
            if report.details.is_clean() {
                info!("backup matches the local tree");
            } else {
                info!(
                    only_local = report.statistics.only_local,
                    only_remote = report.statistics.only_remote,
                    size_mismatch = report.statistics.size_mismatch,
                    "differences found, see the report for details"
                );
            }
            ExitCode::SUCCESS
        }
        Err(drivecheck::CheckError::Cancelled) => {
            error!("cancelled");
            ExitCode::from(130)
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

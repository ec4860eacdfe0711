//! Page-Sentry main entry point
//!
//! This is the command-line interface for the Page-Sentry watch-list scanner.

use clap::Parser;
use page_sentry::config::{load_config_with_hash, Config};
use page_sentry::output::{load_statistics, print_report, print_statistics};
use page_sentry::scanner::scan;
use page_sentry::storage::{
    load_previously_seen, load_watchlist, CheckpointStore, FileCheckpointStore,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Page-Sentry: a resumable watch-list scanner
///
/// Page-Sentry walks numbered listing pages, extracts the addresses on each
/// one, and records and announces every address that is on the watch-list.
/// Progress is checkpointed so an interrupted scan resumes where it stopped.
#[derive(Parser, Debug)]
#[command(name = "page-sentry")]
#[command(version)]
#[command(about = "A resumable watch-list scanner for paginated address listings", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show where the scan would start without fetching anything
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the match log and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, _config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_scan(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("page_sentry=info,warn"),
            1 => EnvFilter::new("page_sentry=debug,info"),
            2 => EnvFilter::new("page_sentry=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates inputs and shows where the scan would start
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Page-Sentry Dry Run ===\n");

    println!("Scanner Configuration:");
    println!("  Base URL: {}", config.scanner.base_url);
    println!("  Workers: {}", config.scanner.threads);
    println!(
        "  Max requests per second: {}",
        config.scanner.max_requests_per_second
    );
    println!("  Idle batch limit: {}", config.scanner.idle_batch_limit);

    println!("\nFetcher:");
    println!("  Max attempts: {}", config.fetcher.max_attempts);
    println!("  Backoff base: {}ms", config.fetcher.backoff_base_ms);
    println!("  Timeout: {}s", config.fetcher.timeout_secs);
    println!("  User agent: {}", config.fetcher.user_agent);

    println!("\nExtractor:");
    println!("  Link pattern: {}", config.extractor.link_pattern);

    let files = &config.files;
    println!("\nFiles:");
    println!("  Watch-list: {}", files.watchlist_path);
    println!("  Matches: {}", files.matches_path);
    println!("  Checkpoint: {}", files.checkpoint_path);
    if let Some(seen) = &files.seen_path {
        println!("  Seen log: {}", seen);
    }

    let telegram_ready = config
        .telegram
        .as_ref()
        .is_some_and(|t| t.token.is_some() && t.chat_id.is_some());
    println!(
        "\nNotifications: {}",
        if telegram_ready { "telegram" } else { "log only" }
    );

    let watchlist = load_watchlist(Path::new(&files.watchlist_path))?;
    let seen = load_previously_seen(
        Path::new(&files.matches_path),
        files.seen_path.as_deref().map(Path::new),
    )?;
    let checkpoint = FileCheckpointStore::new(&files.checkpoint_path).load()?;

    println!("\n✓ Configuration is valid");
    println!("✓ Watch-list holds {} addresses", watchlist.len());
    println!("✓ {} addresses already seen by earlier runs", seen.len());
    println!(
        "✓ Would start scanning at page {}",
        checkpoint.unwrap_or(page_sentry::scanner::FIRST_PAGE)
    );

    Ok(())
}

/// Handles the --stats mode: shows statistics from the match log
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Match log: {}\n", config.files.matches_path);

    let stats = load_statistics(
        Path::new(&config.files.matches_path),
        Path::new(&config.files.checkpoint_path),
    )?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main scan operation
async fn handle_scan(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Scanning {} with {} workers at up to {} requests/sec",
        config.scanner.base_url,
        config.scanner.threads,
        config.scanner.max_requests_per_second
    );

    match scan(config).await {
        Ok(report) => {
            tracing::info!("Scan completed");
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Scan failed: {}", e);
            Err(e.into())
        }
    }
}

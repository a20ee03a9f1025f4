//! Offer-Harvest main entry point
//!
//! This is the command-line interface for the Offer-Harvest listing harvester.

use anyhow::Context;
use clap::Parser;
use offer_harvest::config::{load_config_with_hash, Config};
use offer_harvest::output::{load_statistics, print_statistics};
use offer_harvest::pipeline::run_pipeline;
use offer_harvest::storage::OfferStore;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Offer-Harvest: a polite listing API harvester
///
/// Offer-Harvest downloads every page of a job-offer listing API, in random
/// order and with randomized pauses, and appends the offers to a SQLite
/// table stamped with the fetch date.
#[derive(Parser, Debug)]
#[command(name = "offer-harvest")]
#[command(version)]
#[command(about = "Download job offers into SQLite", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Number of offer pages to fetch (default: all)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pages: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the effective settings without fetching
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("configuration failed: {}", e);
            return Err(e).context("invalid configuration");
        }
    };
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(pages) = cli.pages {
        config.fetcher.pages = Some(pages);
    }

    if cli.dry_run {
        handle_dry_run(&config);
        Ok(())
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_harvest(&config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("offer_harvest=info,warn"),
            1 => EnvFilter::new("offer_harvest=debug,info"),
            2 => EnvFilter::new("offer_harvest=trace,debug"),
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

/// Handles the --dry-run mode: shows the effective settings
fn handle_dry_run(config: &Config) {
    println!("=== Offer-Harvest Dry Run ===\n");

    println!("API:");
    println!("  Base URL: {}", config.api.base_url);
    println!("  User agent: {}", config.api.user_agent);
    println!("  Timeout: {}s", config.api.timeout_secs);

    println!("\nFetcher:");
    match config.fetcher.pages {
        Some(pages) => println!("  Pages: {} (requested)", pages),
        None => println!("  Pages: resolved from API metadata"),
    }
    println!("  Page ceiling: {}", config.fetcher.max_pages);
    println!(
        "  Delay between pages: {}-{}ms",
        config.fetcher.min_delay_ms, config.fetcher.max_delay_ms
    );
    println!("  Retries: {}", config.fetcher.retries);
    println!(
        "  Backoff factor range: {}-{}",
        config.fetcher.backoff_min, config.fetcher.backoff_max
    );

    println!("\nCache:");
    if config.cache.enabled {
        println!(
            "  {} (expires after {}s)",
            config.cache.path, config.cache.expire_after_secs
        );
    } else {
        println!("  disabled");
    }

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);
    println!("  Table: {}", config.storage.table_name);

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.storage.database_path);

    let store = OfferStore::open_existing(
        Path::new(&config.storage.database_path),
        &config.storage.table_name,
    )
    .context("failed to open database")?;
    let stats = load_statistics(&store).context("failed to read statistics")?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main harvest run
async fn handle_harvest(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Starting ETL process...");

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling run");
            on_interrupt.cancel();
        }
    });

    let result = run_pipeline(config, cancel).await;

    let outcome = match result {
        Ok(report) => {
            tracing::info!(
                "Fetched {} offers from {} pages, inserted {} rows (date_fetched {})",
                report.offers,
                report.pages,
                report.rows_written,
                report.fetch_date
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("ETL process failed at {} stage: {}", e.stage(), e);
            Err(anyhow::Error::new(e).context("harvest failed"))
        }
    };

    tracing::info!("ETL process completed");
    outcome
}

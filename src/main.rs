//! Dovepeak main entry point
//!
//! This is the command-line interface for the Dovepeak email discovery pipeline.

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use dovepeak::config::{load_config_with_hash, validate, Config};
use dovepeak::crawler::Coordinator;
use dovepeak::output::{handlers_for, print_statistics, write_all, RunSummary};
use dovepeak::pipeline::{Pipeline, RunSnapshot};
use dovepeak::url::{extract_domain, seed_url};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Dovepeak: a polite email discovery pipeline
///
/// Dovepeak crawls a bounded set of seed domains, extracts the email
/// addresses published on their contact-like pages, validates them and
/// exports one scored record per address.
#[derive(Parser, Debug)]
#[command(name = "dovepeak")]
#[command(version = "1.0.0")]
#[command(about = "A polite email discovery pipeline", long_about = None)]
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

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "validate_list")]
    dry_run: bool,

    /// Validate the addresses in FILE (one per line) instead of crawling
    #[arg(long, value_name = "FILE")]
    validate_list: Option<PathBuf>,

    /// Additional seed domain, may be repeated
    #[arg(long = "seed", value_name = "DOMAIN")]
    seeds: Vec<String>,

    /// Seconds between progress log lines during a crawl
    #[arg(long, default_value_t = 10)]
    progress_interval: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if !cli.seeds.is_empty() {
        config.seeds.extend(cli.seeds.iter().cloned());
        validate(&config)?;
    }

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if let Some(path) = &cli.validate_list {
        handle_validate_list(config, config_hash, path).await?;
    } else {
        handle_crawl(config, config_hash, cli.progress_interval).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("dovepeak=info,warn"),
            1 => EnvFilter::new("dovepeak=debug,info"),
            2 => EnvFilter::new("dovepeak=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Dovepeak Dry Run ===\n");

    println!("Crawler Configuration:");
    println!(
        "  Max domains in flight: {}",
        config.crawler.max_domains_in_flight
    );
    println!(
        "  Max pages per domain: {}",
        config.crawler.max_pages_per_domain
    );
    println!("  Max total pages: {}", config.crawler.max_total_pages);
    println!(
        "  Politeness delay: {}ms",
        config.crawler.politeness_delay_ms
    );
    println!(
        "  Retry budget: {} (base delay {}ms)",
        config.crawler.retry_budget, config.crawler.retry_base_delay_ms
    );
    println!("  Link patterns: {}", config.crawler.link_patterns.join(", "));
    println!("  Common paths: {}", config.crawler.common_paths.join(", "));

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nValidation:");
    println!("  Syntax check: {}", config.validation.enable_syntax_check);
    println!("  Domain check: {}", config.validation.enable_domain_check);
    println!("  Mailbox probe: {}", config.validation.enable_mailbox_probe);
    println!("  Merge policy: {:?}", config.scoring.merge_policy);

    println!("\nOutput:");
    println!("  Results: {}", config.output.results_path);
    if let Some(json) = &config.output.json_path {
        println!("  JSON: {}", json);
    }
    println!("  Summary: {}", config.output.summary_path);

    println!("\nSeeds ({}):", config.seeds.len());
    for seed in &config.seeds {
        let url = seed_url(seed)?;
        let domain = extract_domain(&url).unwrap_or_default();
        println!("  - {} -> {} ({})", seed, url, domain);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would crawl at most {} pages across {} seed domains",
        config.crawler.max_total_pages,
        config.seeds.len()
    );

    Ok(())
}

/// Reads one address per line, skipping blank lines and `#` comments
fn load_address_list(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read address list {}", path.display()))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Handles the --validate-list mode: validates uploaded addresses without crawling
async fn handle_validate_list(
    config: Config,
    config_hash: String,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let addresses = load_address_list(path)?;
    tracing::info!("Validating {} addresses from {}", addresses.len(), path.display());

    let started_at = Utc::now();
    let pipeline = Pipeline::from_config(&config);
    let snapshot = pipeline.validate_list(&addresses).await;

    let summary = RunSummary {
        started_at,
        finished_at: Utc::now(),
        config_hash,
        seeds: Vec::new(),
        cancelled: false,
        pages_failed: 0,
    };
    export(&config, &summary, &snapshot)
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    config_hash: String,
    progress_interval: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    if config.seeds.is_empty() {
        tracing::warn!("No seeds configured, nothing to crawl");
        return Ok(());
    }
    tracing::info!("Seed domains: {}", config.seeds.len());

    let started_at = Utc::now();
    let pipeline = Pipeline::from_config(&config);
    let coordinator = Coordinator::new(config.clone(), pipeline)?;
    let cancel = coordinator.cancellation_token();
    let pipeline = coordinator.pipeline();
    let progress_pipeline = pipeline.clone();

    // Ctrl-C stops new dispatches; what was fetched is still exported
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight pages");
            interrupt.cancel();
        }
    });

    let progress = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(progress_interval.max(1)));
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let stats = progress_pipeline.stats().snapshot();
            tracing::info!(
                "Progress: {} domains, {} pages, {} addresses ({} valid)",
                stats.domains_scanned,
                stats.pages_scanned,
                stats.total_found,
                stats.valid_emails
            );
        }
    });

    let handle = coordinator.start();
    let snapshot = handle.join().await?;
    progress.abort();

    let summary = RunSummary {
        started_at,
        finished_at: Utc::now(),
        config_hash,
        seeds: config.seeds.clone(),
        cancelled: cancel.is_cancelled(),
        pages_failed: pipeline.stats().pages_failed(),
    };
    export(&config, &summary, &snapshot)
}

fn export(
    config: &Config,
    summary: &RunSummary,
    snapshot: &RunSnapshot,
) -> Result<(), Box<dyn std::error::Error>> {
    print_statistics(&snapshot.stats);

    let handlers = handlers_for(&config.output);
    write_all(&handlers, summary, snapshot)?;

    println!("\n✓ Results exported to: {}", config.output.results_path);
    println!("✓ Summary exported to: {}", config.output.summary_path);

    Ok(())
}

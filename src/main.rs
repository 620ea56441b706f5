//! Sumi-Harvest main entry point
//!
//! This is the command-line interface for the Sumi-Harvest site text harvester.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sumi_harvest::config::{self, Config, OutputFormat};
use sumi_harvest::crawler::{Crawler, HttpRenderer};
use sumi_harvest::output::{open_sink, print_statistics};
use tracing_subscriber::EnvFilter;

/// Sumi-Harvest: A polite single-site text harvester
///
/// Sumi-Harvest crawls one website from a seed URL, follows same-origin
/// links, extracts the readable text of every page and writes it to a file.
#[derive(Parser, Debug)]
#[command(name = "sumi-harvest")]
#[command(version)]
#[command(about = "A polite single-site text harvester", long_about = None)]
struct Cli {
    /// URL the crawl starts from; also fixes the crawl scope
    #[arg(value_name = "SEED")]
    seed: String,

    /// Output file (default: scraped_data.txt)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Maximum number of pages to harvest
    #[arg(short = 'n', long, value_name = "N")]
    max_pages: Option<usize>,

    /// Number of concurrent workers
    #[arg(short, long, value_name = "N")]
    workers: Option<usize>,

    /// Delay each worker waits between pages, in milliseconds
    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load_configuration(&cli)?;

    if cli.dry_run {
        handle_dry_run(&cli.seed, &config)
    } else {
        handle_crawl(&cli.seed, config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_harvest=info,warn"),
            1 => EnvFilter::new("sumi_harvest=debug,info"),
            2 => EnvFilter::new("sumi_harvest=trace,debug"),
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

/// Loads the config file (if any), applies command-line overrides and
/// validates the result
fn load_configuration(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = config::load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(output) = &cli.output {
        config.output.path = output.display().to_string();
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = Some(max_pages);
    }
    if let Some(workers) = cli.workers {
        config.crawler.workers = workers;
    }
    if let Some(delay_ms) = cli.delay_ms {
        config.crawler.request_delay_ms = delay_ms;
    }
    if let Some(format) = cli.format {
        config.output.format = format;
    }

    config::validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Handles the --dry-run mode: validates the setup and shows what would be crawled
fn handle_dry_run(seed: &str, config: &Config) -> anyhow::Result<()> {
    let crawler = Crawler::new(config, seed, Arc::new(HttpRenderer::new(&config.user_agent)))
        .context("Invalid seed URL")?;

    println!("=== Sumi-Harvest Dry Run ===\n");

    println!("Seed: {}", crawler.seed());
    println!("Scope: {}", crawler.origin());

    println!("\nCrawler Configuration:");
    println!("  Workers: {}", config.crawler.workers);
    match config.crawler.max_pages {
        Some(max) => println!("  Max pages: {}", max),
        None => println!("  Max pages: unbounded"),
    }
    println!("  Request delay: {}ms", config.crawler.request_delay_ms);
    println!("  Idle timeout: {}ms", config.crawler.idle_timeout_ms);

    println!("\nFetch:");
    println!("  Page load timeout: {}ms", config.fetch.page_load_timeout_ms);
    println!("  Max attempts: {}", config.fetch.max_attempts);
    println!("  User agent: {}", config.user_agent.header_value());

    println!("\nContent selectors:");
    for selector in &config.extract.content_selectors {
        println!("  - {}", selector);
    }
    println!("  - (whole document)");

    println!("\nOutput:");
    println!("  {} ({})", config.output.path, config.output.format);

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(seed: &str, config: Config) -> anyhow::Result<()> {
    let renderer = Arc::new(HttpRenderer::new(&config.user_agent));
    let crawler = Crawler::new(&config, seed, renderer).context("Invalid seed URL")?;
    crawler
        .check_renderer()
        .await
        .context("Renderer unavailable")?;

    // The output file is only touched once setup has succeeded
    let output_path = Path::new(&config.output.path);
    let mut sink = open_sink(config.output.format, output_path)
        .with_context(|| format!("Cannot write output to {}", output_path.display()))?;

    // Ctrl-C stops the workers; pages finished so far are still written
    let cancel = crawler.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight pages");
            cancel.cancel();
        }
    });

    let report = crawler.run().await.context("Crawl could not start")?;

    sink.write_records(&report.records)
        .and_then(|_| sink.finish())
        .with_context(|| format!("Failed to write output to {}", output_path.display()))?;

    tracing::info!(
        "Wrote {} records to {}",
        report.records.len(),
        output_path.display()
    );

    if !report.statistics.pages_by_state.is_empty() {
        println!();
        print_statistics(&report.statistics);
    }

    Ok(())
}

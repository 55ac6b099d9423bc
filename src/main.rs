//! Skewer main entry point
//!
//! This is the command-line interface for the Skewer page fetcher and
//! content analyzer.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use skewer::config::{
    load_config_with_hash, validate_crawl_config, validate_watch_config, Config, CrawlOverrides,
    WatchConfig,
};
use skewer::crawler::{Crawler, FetchCache};
use skewer::monitor::WatchEvent;
use skewer::output::{
    export, print_statistics, render_sitemap_xml, stats, ExportData, ExportFormat,
};
use skewer::robots::RobotsCache;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Skewer: a polite page fetcher and content analyzer
///
/// Skewer fetches pages while respecting robots.txt, discovers sites
/// breadth-first, and scores pages for quality, change and duplication.
#[derive(Parser, Debug)]
#[command(name = "skewer")]
#[command(version)]
#[command(about = "A polite page fetcher and content analyzer", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    /// Print performance statistics when the command finishes
    #[arg(long, global = true)]
    stats: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch and analyze a single page
    Fetch {
        url: String,
        #[command(flatten)]
        crawl: CrawlArgs,
    },

    /// Fetch and analyze several pages
    Crawl {
        #[arg(required = true)]
        urls: Vec<String>,
        #[command(flatten)]
        crawl: CrawlArgs,
    },

    /// Discover a site breadth-first from a seed URL
    Discover {
        seed: String,
        #[command(flatten)]
        crawl: CrawlArgs,
    },

    /// Check the HTTP status of several links
    CheckLinks {
        #[arg(required = true)]
        urls: Vec<String>,
        #[command(flatten)]
        crawl: CrawlArgs,
    },

    /// Crawl several pages and report duplicates
    Compare {
        #[arg(required = true)]
        urls: Vec<String>,

        /// Minimum cosine similarity reported as a duplicate
        #[arg(long)]
        threshold: Option<f64>,

        /// Export the similarity log (json, csv or xml)
        #[arg(long, value_name = "FORMAT")]
        export: Option<ExportFormat>,

        /// Write the export to a file instead of stdout
        #[arg(short, long, requires = "export")]
        output: Option<PathBuf>,

        #[command(flatten)]
        crawl: CrawlArgs,
    },

    /// Re-crawl a page periodically and report changes until Ctrl-C
    Watch {
        url: String,

        /// Seconds between checks
        #[arg(long)]
        interval: Option<u64>,

        #[command(flatten)]
        crawl: CrawlArgs,
    },

    /// Discover a site and print an XML sitemap
    Sitemap {
        seed: String,

        /// Write the sitemap to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        crawl: CrawlArgs,
    },
}

/// Per-run overrides of the `[crawler]` configuration
#[derive(Args, Debug, Default)]
struct CrawlArgs {
    /// Request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Maximum redirect hops
    #[arg(long)]
    max_redirects: Option<usize>,

    /// User-Agent header to send
    #[arg(long)]
    user_agent: Option<String>,

    /// Do not consult robots.txt
    #[arg(long)]
    ignore_robots: bool,

    /// Pause before each request, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Total attempts per request
    #[arg(long)]
    retries: Option<u32>,

    /// Serve repeated fetches from the response cache
    #[arg(long)]
    cache: bool,

    /// Pages fetched at once in a batch
    #[arg(long)]
    concurrency: Option<usize>,

    /// Maximum link distance followed during discovery
    #[arg(long)]
    max_depth: Option<usize>,

    /// Maximum URLs discovered
    #[arg(long)]
    max_urls: Option<usize>,

    /// Only follow links matching this glob
    #[arg(long)]
    pattern: Option<String>,

    /// Encoding used when a page declares none
    #[arg(long)]
    encoding: Option<String>,
}

impl CrawlArgs {
    fn overrides(&self) -> CrawlOverrides {
        CrawlOverrides {
            timeout_ms: self.timeout_ms,
            max_redirects: self.max_redirects,
            user_agent: self.user_agent.clone(),
            respect_robots: self.ignore_robots.then_some(false),
            delay_ms: self.delay_ms,
            retries: self.retries,
            cache_enabled: self.cache.then_some(true),
            concurrency: self.concurrency,
            max_depth: self.max_depth,
            max_urls: self.max_urls,
            url_pattern: self.pattern.clone().map(Some),
            default_encoding: self.encoding.clone(),
            ..CrawlOverrides::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => load(path)?,
        None => Config::default(),
    };

    let crawler = Crawler::new(
        config.crawler.clone(),
        Arc::new(FetchCache::from_settings(
            config.cache.capacity,
            config.cache.ttl_secs,
        )),
        Arc::new(RobotsCache::new()),
    )
    .context("Failed to build HTTP client")?;

    match &cli.command {
        Command::Fetch { url, crawl } => {
            let overrides = checked_overrides(&config, crawl)?;
            let page = crawler.crawl_page(url, &overrides).await?;
            stats::print_page(&page);
        }
        Command::Crawl { urls, crawl } => {
            let overrides = checked_overrides(&config, crawl)?;
            tracing::info!("Crawling {} URLs", urls.len());
            let outcomes = crawler.crawl_batch(urls, &overrides).await;
            println!("=== Crawl Results ===\n");
            stats::print_outcomes(&outcomes);
        }
        Command::Discover { seed, crawl } => {
            let overrides = checked_overrides(&config, crawl)?;
            let report = crawler.discover(seed, &overrides).await?;
            stats::print_discovery(&report);
        }
        Command::CheckLinks { urls, crawl } => {
            let overrides = checked_overrides(&config, crawl)?;
            let statuses = crawler.check_links(urls, &overrides).await;
            stats::print_link_statuses(&statuses);
        }
        Command::Compare {
            urls,
            threshold,
            export: format,
            output,
            crawl,
        } => {
            let overrides = checked_overrides(&config, crawl)?;
            let threshold = threshold.unwrap_or(config.similarity.threshold);
            let report = crawler.compare(urls, threshold, &overrides).await;
            stats::print_comparison(&report);

            if let Some(format) = format {
                let data = ExportData::new(crawler.similarity_records(), crawler.performance());
                let rendered = export(&data, *format)?;
                write_output(output.as_deref(), &rendered)?;
            }
        }
        Command::Watch {
            url,
            interval,
            crawl,
        } => {
            let overrides = checked_overrides(&config, crawl)?;
            let watch = WatchConfig {
                interval_secs: interval.unwrap_or(config.watch.interval_secs),
            };
            validate_watch_config(&watch).context("Invalid watch interval")?;
            let interval = Duration::from_secs(watch.interval_secs);
            handle_watch(&crawler, url, interval, &overrides).await?;
        }
        Command::Sitemap { seed, output, crawl } => {
            let overrides = checked_overrides(&config, crawl)?;
            let entries = crawler.sitemap(seed, &overrides).await?;
            tracing::info!("Sitemap has {} entries", entries.len());
            write_output(output.as_deref(), &render_sitemap_xml(&entries))?;
        }
    }

    if cli.stats {
        println!();
        print_statistics(&crawler.performance());
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
            0 => EnvFilter::new("skewer=info,warn"),
            1 => EnvFilter::new("skewer=debug,info"),
            2 => EnvFilter::new("skewer=trace,debug"),
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

/// Loads and validates the configuration file
fn load(path: &Path) -> anyhow::Result<Config> {
    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

/// Builds the overrides for a command and validates the effective settings
fn checked_overrides(config: &Config, args: &CrawlArgs) -> anyhow::Result<CrawlOverrides> {
    let overrides = args.overrides();
    validate_crawl_config(&config.crawler.merged(&overrides))
        .context("Invalid command-line settings")?;
    Ok(overrides)
}

fn write_output(path: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✓ Written to: {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

/// Handles the watch command: prints change reports until Ctrl-C
async fn handle_watch(
    crawler: &Crawler,
    url: &str,
    interval: Duration,
    overrides: &CrawlOverrides,
) -> anyhow::Result<()> {
    let (handle, mut events) = crawler.watch(url, interval, overrides)?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping watch");
                break;
            }
            event = events.recv() => match event {
                Some(WatchEvent::Checked(report)) => {
                    if report.any_change() {
                        println!(
                            "[{}] {} changed: similarity {:.3}, title {}, links {}, size {} -> {}",
                            report.checked_at.format("%H:%M:%S"),
                            report.url,
                            report.similarity,
                            if report.title_changed { "changed" } else { "same" },
                            if report.links_changed { "changed" } else { "same" },
                            report.previous_size,
                            report.current_size
                        );
                    } else {
                        println!(
                            "[{}] {} unchanged",
                            report.checked_at.format("%H:%M:%S"),
                            report.url
                        );
                    }
                }
                Some(WatchEvent::Failed { url, error, at }) => {
                    println!("[{}] {} check failed: {}", at.format("%H:%M:%S"), url, error);
                }
                None => break,
            },
        }
    }

    handle.stop().await;
    Ok(())
}

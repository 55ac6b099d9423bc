//! Crawler coordinator - crawl orchestration on top of the fetcher
//!
//! This module ties the pipeline together, including:
//! - Monitored single fetches
//! - Page crawls (fetch, extract, readability, quality, similarity log)
//! - Windowed batch crawls and link audits
//! - Breadth-first site discovery and sitemap generation
//! - Batch comparison and change watching

use crate::analysis::{
    comparison_recommendations, detect_duplicates, flesch_reading_ease, metric_leaders,
    score_page, DuplicatePair, MetricLeader, QualityInput, QualityScore, SimilarityLog,
    SimilarityRecord,
};
use crate::config::{CrawlConfig, CrawlOverrides};
use crate::crawler::cache::FetchCache;
use crate::crawler::fetcher::{FetchResult, Fetcher, LinkStatus};
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::{HtmlExtractor, PageExtractor, ParsedPage};
use crate::monitor::{
    spawn_watch, PageSnapshot, PerformanceMonitor, PerformanceStats, RequestOutcome, WatchEvent,
    WatchHandle,
};
use crate::output::SitemapEntry;
use crate::robots::RobotsCache;
use crate::url::{categorize_urls, is_fetchable, validate_url, UrlCategories, UrlPattern};
use crate::{ConfigError, SkewerError};
use futures::future::join_all;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;

/// A fetched and analyzed page
#[derive(Debug, Clone)]
pub struct CrawledPage {
    pub fetch: FetchResult,
    pub page: ParsedPage,
    /// Flesch reading ease of the page text
    pub readability: f64,
    pub quality: QualityScore,
}

/// Result for one URL of a batch
#[derive(Debug, Clone)]
pub enum PageOutcome {
    Crawled(Box<CrawledPage>),
    Failed { url: String, error: String },
}

impl PageOutcome {
    /// The URL as it was requested
    pub fn url(&self) -> &str {
        match self {
            Self::Crawled(page) => &page.fetch.url,
            Self::Failed { url, .. } => url,
        }
    }

    pub fn crawled(&self) -> Option<&CrawledPage> {
        match self {
            Self::Crawled(page) => Some(page.as_ref()),
            Self::Failed { .. } => None,
        }
    }

    pub fn is_crawled(&self) -> bool {
        matches!(self, Self::Crawled(_))
    }
}

/// Counters of a discovery run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryStats {
    /// URLs discovered from crawled pages (the seed is not counted)
    pub total_urls: usize,
    /// Pages crawled successfully
    pub crawled: usize,
    /// Pages whose crawl failed
    pub failed: usize,
}

/// Result of a breadth-first discovery
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    /// Discovered URLs in discovery order
    pub discovered_urls: Vec<String>,
    /// Successfully crawled pages paired with their link depth
    pub pages: Vec<(usize, CrawledPage)>,
    /// Discovered URLs grouped by category
    pub categories: UrlCategories,
    pub stats: DiscoveryStats,
}

/// Result of comparing a batch of pages
#[derive(Debug, Clone)]
pub struct ComparisonReport {
    pub outcomes: Vec<PageOutcome>,
    /// Mean overall quality of the crawled pages, if any succeeded
    pub average_quality: Option<f64>,
    /// Best crawled page per metric
    pub best: Vec<MetricLeader>,
    pub recommendations: Vec<String>,
    pub duplicates: Vec<DuplicatePair>,
    pub performance: PerformanceStats,
}

/// Main crawler structure
///
/// Cloning is cheap: clones share the fetcher caches, the performance
/// monitor and the similarity log.
#[derive(Clone)]
pub struct Crawler {
    defaults: CrawlConfig,
    fetcher: Fetcher,
    extractor: Arc<dyn PageExtractor>,
    monitor: Arc<PerformanceMonitor>,
    similarity_log: Arc<Mutex<SimilarityLog>>,
}

impl std::fmt::Debug for Crawler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crawler")
            .field("defaults", &self.defaults)
            .field("fetcher", &self.fetcher)
            .finish_non_exhaustive()
    }
}

impl Crawler {
    /// Creates a crawler with the default HTML extractor
    ///
    /// # Arguments
    ///
    /// * `defaults` - Crawl settings every call starts from
    /// * `cache` - Response cache, possibly shared with other crawlers
    /// * `robots` - Robots policy cache, possibly shared with other crawlers
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Successfully created crawler
    /// * `Err(reqwest::Error)` - Failed to build the HTTP client
    pub fn new(
        defaults: CrawlConfig,
        cache: Arc<FetchCache>,
        robots: Arc<RobotsCache>,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::with_fetcher(defaults, Fetcher::new(cache, robots)?))
    }

    /// Creates a crawler around an existing fetcher
    pub fn with_fetcher(defaults: CrawlConfig, fetcher: Fetcher) -> Self {
        Self {
            defaults,
            fetcher,
            extractor: Arc::new(HtmlExtractor),
            monitor: Arc::new(PerformanceMonitor::new()),
            similarity_log: Arc::new(Mutex::new(SimilarityLog::new())),
        }
    }

    /// Replaces the DOM extractor
    pub fn with_extractor(mut self, extractor: Arc<dyn PageExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// The settings every call starts from
    pub fn defaults(&self) -> &CrawlConfig {
        &self.defaults
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Fetches a single URL and records it in the performance monitor
    pub async fn fetch(&self, url: &str, overrides: &CrawlOverrides) -> crate::Result<FetchResult> {
        let config = self.defaults.merged(overrides);
        self.fetch_with(url, &config).await
    }

    /// Fetches and analyzes a single page
    pub async fn crawl_page(
        &self,
        url: &str,
        overrides: &CrawlOverrides,
    ) -> crate::Result<CrawledPage> {
        let config = self.defaults.merged(overrides);
        self.crawl_with(url, &config).await
    }

    /// Crawls several pages with bounded concurrency
    ///
    /// URLs are processed in windows of `concurrency`; a window starts only
    /// after the previous one has finished. Failures are reported in place,
    /// so the output has one outcome per input URL, in input order.
    pub async fn crawl_batch(
        &self,
        urls: &[String],
        overrides: &CrawlOverrides,
    ) -> Vec<PageOutcome> {
        let config = self.defaults.merged(overrides);
        self.crawl_batch_with(urls, &config).await
    }

    /// Discovers a site breadth-first from `seed`
    ///
    /// # Traversal Rules
    ///
    /// - The seed is depth 0; links found on a page at depth `d` are
    ///   followed only while `d < max_depth`
    /// - Only http(s) links matching the optional URL pattern are followed
    /// - Each URL is crawled at most once
    /// - The run stops when the queue is empty or `max_urls` URLs have been
    ///   discovered
    /// - A failed page is logged and skipped
    ///
    /// Only an invalid seed or URL pattern is an error.
    pub async fn discover(
        &self,
        seed: &str,
        overrides: &CrawlOverrides,
    ) -> crate::Result<DiscoveryReport> {
        let config = self.defaults.merged(overrides);
        let seed_url = validate_url(seed).map_err(|source| SkewerError::InvalidUrl {
            url: seed.to_string(),
            source,
        })?;

        let pattern = match config.url_pattern.as_deref() {
            Some(glob) => Some(
                UrlPattern::new(glob)
                    .map_err(|e| ConfigError::InvalidPattern(e.to_string()))?,
            ),
            None => None,
        };

        tracing::info!(
            "Starting discovery from {} (max depth {}, max urls {})",
            seed_url,
            config.max_depth,
            config.max_urls
        );

        let mut frontier = Frontier::new(seed_url.as_str(), config.max_urls);
        let mut pages = Vec::new();
        let mut failed = 0;

        while let Some(queued) = frontier.next_url() {
            tracing::debug!("Processing URL: {} (depth {})", queued.url, queued.depth);

            let crawled = match self.crawl_with(&queued.url, &config).await {
                Ok(crawled) => crawled,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", queued.url, e);
                    failed += 1;
                    continue;
                }
            };

            if queued.depth < config.max_depth {
                let next_depth = queued.depth + 1;
                for link in crawled.page.link_urls() {
                    if !is_fetchable(link) {
                        continue;
                    }
                    if pattern.as_ref().is_some_and(|p| !p.matches(link)) {
                        continue;
                    }
                    frontier.offer(link, next_depth);
                }
            }

            pages.push((queued.depth, crawled));
        }

        let discovered_urls = frontier.into_discovered();
        let categories = categorize_urls(&discovered_urls);
        let stats = DiscoveryStats {
            total_urls: discovered_urls.len(),
            crawled: pages.len(),
            failed,
        };

        tracing::info!(
            "Discovery complete: {} urls discovered, {} crawled, {} failed",
            stats.total_urls,
            stats.crawled,
            stats.failed
        );

        Ok(DiscoveryReport {
            discovered_urls,
            pages,
            categories,
            stats,
        })
    }

    /// Checks every URL with a HEAD request, `concurrency` at a time
    pub async fn check_links(&self, urls: &[String], overrides: &CrawlOverrides) -> Vec<LinkStatus> {
        let config = self.defaults.merged(overrides);
        run_windowed(urls, &config, |url| self.fetcher.check_link_status(url, &config)).await
    }

    /// Crawls a batch with similarity tracking and compares the pages
    ///
    /// Duplicate pairs, metric leaders and recommendations are computed over
    /// this batch only; the similarity records are also appended to the
    /// crawler's similarity log.
    pub async fn compare(
        &self,
        urls: &[String],
        threshold: f64,
        overrides: &CrawlOverrides,
    ) -> ComparisonReport {
        let mut config = self.defaults.merged(overrides);
        config.track_similarity = true;

        let outcomes = self.crawl_batch_with(urls, &config).await;

        let crawled: Vec<&CrawledPage> = outcomes.iter().filter_map(PageOutcome::crawled).collect();
        let average_quality = if crawled.is_empty() {
            None
        } else {
            let total: f64 = crawled.iter().map(|p| f64::from(p.quality.overall)).sum();
            Some(total / crawled.len() as f64)
        };
        let best = metric_leaders(&crawled);
        let recommendations = comparison_recommendations(&crawled);

        let records: Vec<SimilarityRecord> = crawled
            .iter()
            .map(|p| SimilarityRecord::new(p.fetch.url.as_str(), p.page.text.content.as_str()))
            .collect();

        ComparisonReport {
            duplicates: detect_duplicates(&records, threshold),
            outcomes,
            average_quality,
            best,
            recommendations,
            performance: self.monitor.stats(),
        }
    }

    /// Discovers a site and describes every crawled page as a sitemap entry
    pub async fn sitemap(
        &self,
        seed: &str,
        overrides: &CrawlOverrides,
    ) -> crate::Result<Vec<SitemapEntry>> {
        let report = self.discover(seed, overrides).await?;
        let base = validate_url(seed)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| seed.to_string());

        Ok(report
            .pages
            .iter()
            .map(|(_, page)| SitemapEntry::from_page(page, &base))
            .collect())
    }

    /// Pairs of logged pages whose similarity is at least `threshold`
    pub fn duplicates(&self, threshold: f64) -> Vec<DuplicatePair> {
        self.log().duplicates(threshold)
    }

    /// A copy of the similarity log
    pub fn similarity_records(&self) -> Vec<SimilarityRecord> {
        self.log().records().to_vec()
    }

    pub fn clear_similarity_log(&self) {
        self.log().clear();
    }

    /// A snapshot of the request telemetry
    pub fn performance(&self) -> PerformanceStats {
        self.monitor.stats()
    }

    pub fn reset_performance(&self) {
        self.monitor.reset();
    }

    /// Watches `url` for changes every `interval`
    ///
    /// Each check is a fresh crawl with caching disabled. See
    /// [`spawn_watch`] for the event semantics. A zero `interval` is a
    /// configuration error.
    pub fn watch(
        &self,
        url: &str,
        interval: Duration,
        overrides: &CrawlOverrides,
    ) -> crate::Result<(WatchHandle, mpsc::Receiver<WatchEvent>)> {
        let mut config = self.defaults.merged(overrides);
        config.cache_enabled = false;
        let config = Arc::new(config);

        let crawler = self.clone();
        let target = url.to_string();

        spawn_watch(url.to_string(), interval, move || {
            let crawler = crawler.clone();
            let config = Arc::clone(&config);
            let target = target.clone();
            async move {
                crawler
                    .crawl_with(&target, &config)
                    .await
                    .map(|crawled| PageSnapshot::from(&crawled))
            }
        })
    }

    async fn fetch_with(&self, url: &str, config: &CrawlConfig) -> crate::Result<FetchResult> {
        let token = self.monitor.start_request(url);
        let result = self.fetcher.fetch(url, config).await;

        let outcome = match &result {
            Ok(fetched) => RequestOutcome::Success {
                status_code: fetched.status_code,
            },
            Err(_) => RequestOutcome::Failure,
        };
        self.monitor.end_request(token, outcome);

        result
    }

    async fn crawl_with(&self, url: &str, config: &CrawlConfig) -> crate::Result<CrawledPage> {
        let fetch = self.fetch_with(url, config).await?;

        let base = Url::parse(&fetch.final_url)
            .or_else(|_| Url::parse(&fetch.url))
            .map_err(|e| SkewerError::InvalidUrl {
                url: fetch.final_url.clone(),
                source: crate::UrlError::Parse(e.to_string()),
            })?;

        let page = self.extractor.extract(&fetch.body, &base);
        let readability = flesch_reading_ease(&page.text.content);
        let quality = score_page(&QualityInput::new(&fetch, &page, readability));

        if config.track_similarity {
            self.log()
                .push(SimilarityRecord::new(url, page.text.content.as_str()));
        }

        tracing::debug!(
            "Crawled {} ({}, quality {})",
            url,
            fetch.status_code,
            quality.overall
        );

        Ok(CrawledPage {
            fetch,
            page,
            readability,
            quality,
        })
    }

    async fn crawl_batch_with(&self, urls: &[String], config: &CrawlConfig) -> Vec<PageOutcome> {
        run_windowed(urls, config, |url| async move {
            match self.crawl_with(url, config).await {
                Ok(page) => PageOutcome::Crawled(Box::new(page)),
                Err(e) => {
                    tracing::warn!("Failed to crawl {}: {}", url, e);
                    PageOutcome::Failed {
                        url: url.to_string(),
                        error: e.to_string(),
                    }
                }
            }
        })
        .await
    }

    fn log(&self) -> MutexGuard<'_, SimilarityLog> {
        self.similarity_log
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Runs `task` over `urls` in windows of `concurrency`
///
/// Results keep input order. `delay_ms` also separates windows.
async fn run_windowed<'a, T, F, Fut>(urls: &'a [String], config: &CrawlConfig, task: F) -> Vec<T>
where
    F: Fn(&'a str) -> Fut,
    Fut: Future<Output = T>,
{
    let window = config.concurrency.max(1);
    let mut results = Vec::with_capacity(urls.len());
    let mut windows = urls.chunks(window).peekable();

    while let Some(chunk) = windows.next() {
        results.extend(join_all(chunk.iter().map(|url| task(url.as_str()))).await);

        if config.delay_ms > 0 && windows.peek().is_some() {
            tokio::time::sleep(Duration::from_millis(config.delay_ms)).await;
        }
    }

    results
}

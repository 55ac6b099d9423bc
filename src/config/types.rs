use serde::Deserialize;

/// Main configuration structure for Skewer
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlConfig,
    pub cache: CacheConfig,
    pub similarity: SimilarityConfig,
    pub watch: WatchConfig,
}

/// Crawl behavior for a single fetch, batch or discovery run
///
/// Values are immutable once built. Call sites adjust them through
/// [`CrawlOverrides`] and [`CrawlConfig::merged`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlConfig {
    /// Per-request timeout (milliseconds)
    pub timeout_ms: u64,

    /// Maximum number of redirect hops followed per request
    pub max_redirects: usize,

    /// User agent sent with every request
    pub user_agent: String,

    /// Whether robots.txt rules are consulted before fetching
    pub respect_robots: bool,

    /// Fixed pause before every fetch and between batch windows (milliseconds)
    pub delay_ms: u64,

    /// Total number of attempts for a fetch that hits transport failures
    pub retries: u32,

    /// Backoff step between attempts; attempt `n` waits `n * retry_backoff_ms`
    pub retry_backoff_ms: u64,

    /// Whether fetch results are served from and stored in the fetch cache
    pub cache_enabled: bool,

    /// Number of URLs dispatched together in a batch window
    pub concurrency: usize,

    /// Maximum link distance from the seed followed during discovery
    pub max_depth: usize,

    /// Maximum number of URLs discovered in one discovery run
    pub max_urls: usize,

    /// Optional glob filter applied to discovered links
    pub url_pattern: Option<String>,

    /// Encoding label used when neither headers nor markup declare one
    pub default_encoding: String,

    /// Whether crawled pages are appended to the similarity log
    pub track_similarity: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_redirects: 5,
            user_agent: format!(
                "Skewer/{} (+https://github.com/skewer-rs/skewer)",
                env!("CARGO_PKG_VERSION")
            ),
            respect_robots: true,
            delay_ms: 0,
            retries: 3,
            retry_backoff_ms: 1_000,
            cache_enabled: false,
            concurrency: 1,
            max_depth: 2,
            max_urls: 100,
            url_pattern: None,
            default_encoding: "utf-8".to_string(),
            track_similarity: false,
        }
    }
}

impl CrawlConfig {
    /// Returns a new config where every field set in `overrides` replaces
    /// the corresponding field of `self`
    ///
    /// `self` is left untouched, so a crawler's defaults are never mutated
    /// by a call-site override.
    pub fn merged(&self, overrides: &CrawlOverrides) -> CrawlConfig {
        CrawlConfig {
            timeout_ms: overrides.timeout_ms.unwrap_or(self.timeout_ms),
            max_redirects: overrides.max_redirects.unwrap_or(self.max_redirects),
            user_agent: overrides
                .user_agent
                .clone()
                .unwrap_or_else(|| self.user_agent.clone()),
            respect_robots: overrides.respect_robots.unwrap_or(self.respect_robots),
            delay_ms: overrides.delay_ms.unwrap_or(self.delay_ms),
            retries: overrides.retries.unwrap_or(self.retries),
            retry_backoff_ms: overrides.retry_backoff_ms.unwrap_or(self.retry_backoff_ms),
            cache_enabled: overrides.cache_enabled.unwrap_or(self.cache_enabled),
            concurrency: overrides.concurrency.unwrap_or(self.concurrency),
            max_depth: overrides.max_depth.unwrap_or(self.max_depth),
            max_urls: overrides.max_urls.unwrap_or(self.max_urls),
            url_pattern: match &overrides.url_pattern {
                Some(pattern) => pattern.clone(),
                None => self.url_pattern.clone(),
            },
            default_encoding: overrides
                .default_encoding
                .clone()
                .unwrap_or_else(|| self.default_encoding.clone()),
            track_similarity: overrides
                .track_similarity
                .unwrap_or(self.track_similarity),
        }
    }
}

/// Per-call adjustments layered onto a [`CrawlConfig`]
///
/// `url_pattern` is doubly optional: `Some(None)` clears a default pattern.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlOverrides {
    pub timeout_ms: Option<u64>,
    pub max_redirects: Option<usize>,
    pub user_agent: Option<String>,
    pub respect_robots: Option<bool>,
    pub delay_ms: Option<u64>,
    pub retries: Option<u32>,
    pub retry_backoff_ms: Option<u64>,
    pub cache_enabled: Option<bool>,
    pub concurrency: Option<usize>,
    pub max_depth: Option<usize>,
    pub max_urls: Option<usize>,
    pub url_pattern: Option<Option<String>>,
    pub default_encoding: Option<String>,
    pub track_similarity: Option<bool>,
}

/// Fetch cache sizing
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CacheConfig {
    /// Seconds a cached fetch result stays valid
    pub ttl_secs: u64,

    /// Maximum number of cached fetch results
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3_600,
            capacity: 1_024,
        }
    }
}

/// Duplicate detection settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Minimum cosine similarity for a pair to be reported
    pub threshold: f64,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self { threshold: 0.8 }
    }
}

/// Change watch settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct WatchConfig {
    /// Seconds between two checks of a watched URL
    pub interval_secs: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3_600,
        }
    }
}

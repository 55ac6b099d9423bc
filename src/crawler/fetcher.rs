//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client
//! - GET requests with manual redirect handling
//! - Retry logic for transient failures
//! - Charset resolution and decoding
//! - robots.txt consultation and response caching
//! - HEAD requests for link auditing

use crate::config::CrawlConfig;
use crate::crawler::cache::FetchCache;
use crate::crawler::charset::{decode_body, resolve_charset};
use crate::robots::{fetch_robots, RobotsCache};
use crate::url::{origin_key, robots_url, validate_url};
use crate::{SkewerError, TransportError};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, ACCEPT, ACCEPT_LANGUAGE, CONTENT_LENGTH, CONTENT_TYPE, LOCATION, USER_AGENT};
use reqwest::{redirect::Policy, Client, Method, Response};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.9";

/// A fetched page
///
/// Results are never modified after they are produced; the fetch cache hands
/// out clones.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// The URL that was requested
    pub url: String,
    /// URL of the response after redirects
    pub final_url: String,
    /// HTTP status code of the final response
    pub status_code: u16,
    /// Response headers (case-insensitive lookup)
    pub headers: HeaderMap,
    /// Content-Type header value, empty if absent
    pub content_type: String,
    /// Name of the encoding used to decode the body
    pub encoding: String,
    /// Undecoded response body
    pub raw_body: Vec<u8>,
    /// Decoded response body
    pub body: String,
    /// Body size in bytes
    pub size: usize,
    /// When the response was received
    pub fetched_at: DateTime<Utc>,
}

impl FetchResult {
    /// Returns true for a 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Returns a header value as text
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Outcome of a HEAD link check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkStatus {
    pub url: String,
    /// HTTP status, or 0 when no response was received
    pub status_code: u16,
    /// Reason phrase, or the failure message
    pub status_text: String,
    pub content_type: Option<String>,
    /// Content-Length header, if present
    pub size: Option<u64>,
    /// True for network failures and 5xx responses
    pub error: bool,
}

/// Builds the HTTP client used for every request
///
/// Redirects are not followed by the client; [`Fetcher`] follows them itself
/// so it can enforce the hop budget and detect loops. The user agent and
/// timeouts are applied per request from the active [`CrawlConfig`].
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::none()) // Handle redirects manually
        .gzip(true)
        .brotli(true)
        .build()
}

/// Retrieves single URLs with retry, robots compliance and caching
///
/// The response cache and robots cache are injected so several fetchers can
/// share them, or tests can isolate them.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    cache: Arc<FetchCache>,
    robots: Arc<RobotsCache>,
}

impl Fetcher {
    /// Creates a fetcher with a freshly built client
    pub fn new(cache: Arc<FetchCache>, robots: Arc<RobotsCache>) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client()?, cache, robots))
    }

    /// Creates a fetcher around an existing client
    ///
    /// The client must not follow redirects on its own.
    pub fn with_client(client: Client, cache: Arc<FetchCache>, robots: Arc<RobotsCache>) -> Self {
        Self {
            client,
            cache,
            robots,
        }
    }

    /// The response cache this fetcher reads and fills
    pub fn cache(&self) -> &Arc<FetchCache> {
        &self.cache
    }

    /// The robots policy cache this fetcher consults
    pub fn robots_cache(&self) -> &Arc<RobotsCache> {
        &self.robots
    }

    /// Fetches a URL with full error handling and retry logic
    ///
    /// # Request Flow
    ///
    /// 1. Reject anything that is not an http(s) URL
    /// 2. Serve a cached copy when caching is enabled and one is fresh
    /// 3. Check robots.txt for the URL's origin when compliance is enabled
    /// 4. Sleep for `delay_ms`
    /// 5. GET the URL, following redirects manually
    /// 6. Decode the body and store the result in the cache
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Status < 500 | Success, 4xx included |
    /// | Status >= 500 | Retry |
    /// | Timeout, DNS, connect, body read | Retry |
    /// | Redirect loop or budget exceeded | Fail immediately |
    ///
    /// `retries` is the total number of attempts; attempt `n` is followed by
    /// a pause of `n * retry_backoff_ms` before the next one.
    pub async fn fetch(&self, url: &str, config: &CrawlConfig) -> crate::Result<FetchResult> {
        let parsed = validate_url(url).map_err(|source| SkewerError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        if config.cache_enabled {
            if let Some(hit) = self.cache.get(url) {
                tracing::debug!("Cache hit: {}", url);
                return Ok(hit);
            }
        }

        if config.respect_robots && !self.is_allowed_by_robots(&parsed, config).await {
            tracing::debug!("Blocked by robots.txt: {}", url);
            return Err(SkewerError::RobotsDisallowed {
                url: url.to_string(),
            });
        }

        if config.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(config.delay_ms)).await;
        }

        let result = self.fetch_with_retry(url, &parsed, config).await?;

        if config.cache_enabled {
            self.cache.insert(url, result.clone());
        }

        Ok(result)
    }

    /// Checks robots.txt for `url`, fetching the origin's policy on first use
    ///
    /// Concurrent checks against an origin share a single robots.txt request.
    async fn is_allowed_by_robots(&self, url: &Url, config: &CrawlConfig) -> bool {
        let Some(location) = robots_url(url) else {
            return true;
        };

        let client = &self.client;
        let user_agent = config.user_agent.as_str();
        let max_redirects = config.max_redirects;
        let policy = self
            .robots
            .get_or_fetch(&origin_key(url), move || async move {
                tracing::debug!("Fetching {}", location);
                fetch_robots(client, &location, user_agent, max_redirects).await
            })
            .await;

        policy.is_allowed(url.as_str(), user_agent)
    }

    /// Checks a URL with a HEAD request
    ///
    /// Redirects are followed within the `max_redirects` budget and the final
    /// status is reported. No retries, no robots check and no cache. Never
    /// fails: problems, including redirect loops, are reported through
    /// [`LinkStatus::error`].
    pub async fn check_link_status(&self, url: &str, config: &CrawlConfig) -> LinkStatus {
        let failed = |message: String| LinkStatus {
            url: url.to_string(),
            status_code: 0,
            status_text: message,
            content_type: None,
            size: None,
            error: true,
        };

        let parsed = match validate_url(url) {
            Ok(parsed) => parsed,
            Err(e) => return failed(e.to_string()),
        };

        match self.follow_redirects(&parsed, config, Method::HEAD).await {
            Ok(response) => {
                let status = response.status();
                let headers = response.headers();
                LinkStatus {
                    url: url.to_string(),
                    status_code: status.as_u16(),
                    status_text: status.canonical_reason().unwrap_or_default().to_string(),
                    content_type: headers
                        .get(CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string),
                    size: headers
                        .get(CONTENT_LENGTH)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.trim().parse().ok()),
                    error: !(200..500).contains(&status.as_u16()),
                }
            }
            Err(e) => failed(e.to_string()),
        }
    }

    async fn fetch_with_retry(
        &self,
        url: &str,
        parsed: &Url,
        config: &CrawlConfig,
    ) -> crate::Result<FetchResult> {
        let max_attempts = config.retries.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.fetch_once(url, parsed, config).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let backoff =
                        Duration::from_millis(config.retry_backoff_ms.saturating_mul(attempt.into()));
                    tracing::warn!(
                        "Attempt {}/{} for {} failed: {}, retrying in {:?}",
                        attempt,
                        max_attempts,
                        url,
                        e,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(source) => {
                    return Err(SkewerError::FetchFailed {
                        url: url.to_string(),
                        attempts: attempt,
                        source,
                    })
                }
            }
        }
    }

    async fn fetch_once(
        &self,
        url: &str,
        parsed: &Url,
        config: &CrawlConfig,
    ) -> Result<FetchResult, TransportError> {
        let response = self.follow_redirects(parsed, config, Method::GET).await?;

        let status = response.status();
        if status.is_server_error() {
            return Err(TransportError::ServerStatus(status.as_u16()));
        }

        let final_url = response.url().to_string();
        let headers = response.headers().clone();
        let raw_body = response.bytes().await?.to_vec();

        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let label = resolve_charset(&content_type, &raw_body, &config.default_encoding);
        let (body, encoding) = decode_body(&raw_body, &label);

        Ok(FetchResult {
            url: url.to_string(),
            final_url,
            status_code: status.as_u16(),
            headers,
            content_type,
            encoding,
            size: raw_body.len(),
            raw_body,
            body,
            fetched_at: Utc::now(),
        })
    }

    /// Sends `method` requests until a non-redirect response arrives
    async fn follow_redirects(
        &self,
        start: &Url,
        config: &CrawlConfig,
        method: Method,
    ) -> Result<Response, TransportError> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let mut current = start.clone();
        let mut seen = HashSet::from([current.to_string()]);
        let mut hops = 0;

        loop {
            let response = self
                .client
                .request(method.clone(), current.clone())
                .header(USER_AGENT, config.user_agent.as_str())
                .header(ACCEPT, ACCEPT_HTML)
                .header(ACCEPT_LANGUAGE, ACCEPT_LANGUAGE_VALUE)
                .timeout(timeout)
                .send()
                .await?;

            if !response.status().is_redirection() {
                return Ok(response);
            }

            // 304 and friends carry no Location and are final
            let Some(location) = response.headers().get(LOCATION) else {
                return Ok(response);
            };

            if hops >= config.max_redirects {
                return Err(TransportError::TooManyRedirects(config.max_redirects));
            }

            let location = location
                .to_str()
                .map_err(|_| TransportError::InvalidRedirect(format!("{:?}", location)))?;
            let next = current
                .join(location)
                .map_err(|_| TransportError::InvalidRedirect(location.to_string()))?;

            if next.scheme() != "http" && next.scheme() != "https" {
                return Err(TransportError::InvalidRedirect(next.to_string()));
            }

            if !seen.insert(next.to_string()) {
                return Err(TransportError::RedirectLoop(next.to_string()));
            }

            tracing::debug!("Redirect {} -> {}", current, next);
            hops += 1;
            current = next;
        }
    }
}

//! Skewer: a polite page fetcher and content analyzer
//!
//! This crate fetches web pages with retry, charset and robots.txt handling,
//! discovers sites breadth-first, and scores pages for quality, change and
//! duplication.

pub mod analysis;
pub mod config;
pub mod crawler;
pub mod monitor;
pub mod output;
pub mod robots;
pub mod url;

use thiserror::Error;

/// Main error type for Skewer operations
#[derive(Debug, Error)]
pub enum SkewerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: UrlError,
    },

    #[error("URL disallowed by robots.txt: {url}")]
    RobotsDisallowed { url: String },

    #[error("Fetch failed for {url} after {attempts} attempt(s): {source}")]
    FetchFailed {
        url: String,
        attempts: u32,
        #[source]
        source: TransportError,
    },

    #[error("Export error: {0}")]
    Export(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl SkewerError {
    /// Returns the URL this error refers to, if any
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::InvalidUrl { url, .. }
            | Self::RobotsDisallowed { url }
            | Self::FetchFailed { url, .. } => Some(url),
            _ => None,
        }
    }
}

/// Failures of a single request attempt
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("{0}")]
    Request(#[source] reqwest::Error),

    #[error("server responded with status {0}")]
    ServerStatus(u16),

    #[error("exceeded redirect limit of {0}")]
    TooManyRedirects(usize),

    #[error("redirect loop detected at {0}")]
    RedirectLoop(String),

    #[error("invalid redirect location: {0}")]
    InvalidRedirect(String),
}

impl TransportError {
    /// Whether another attempt may succeed
    ///
    /// Redirect problems are deterministic and are never retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::Request(_) | Self::ServerStatus(_)
        )
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Request(err)
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Invalid URL pattern {pattern}: {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Result type alias for Skewer operations
pub type Result<T> = std::result::Result<T, SkewerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use analysis::{QualityScore, SimilarityRecord};
pub use config::{Config, CrawlConfig, CrawlOverrides};
pub use crawler::{Crawler, FetchResult, PageOutcome};
pub use monitor::{PerformanceMonitor, PerformanceStats};
pub use url::{extract_domain, validate_url, UrlPattern};

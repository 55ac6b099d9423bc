//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic, charset decoding and response caching
//! - HTML parsing and field extraction
//! - The breadth-first discovery frontier
//! - Overall crawl coordination

pub mod cache;
pub mod charset;
mod coordinator;
mod fetcher;
mod frontier;
mod parser;

pub use cache::FetchCache;
pub use coordinator::{
    ComparisonReport, CrawledPage, Crawler, DiscoveryReport, DiscoveryStats, PageOutcome,
};
pub use fetcher::{build_http_client, FetchResult, Fetcher, LinkStatus};
pub use frontier::{Frontier, QueuedUrl};
pub use parser::{
    parse_html, FormField, Heading, HtmlExtractor, OpenGraph, PageExtractor, PageForm, PageImage,
    PageLink, PageMetadata, PageText, ParsedPage, TwitterCard,
};

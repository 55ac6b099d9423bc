//! Configuration module for Skewer
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and layering call-site overrides onto crawl defaults.
//!
//! # Example
//!
//! ```no_run
//! use skewer::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("skewer.toml")).unwrap();
//! println!("Discovery will follow links up to depth {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CacheConfig, Config, CrawlConfig, CrawlOverrides, SimilarityConfig, WatchConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{validate, validate_crawl_config, validate_watch_config};

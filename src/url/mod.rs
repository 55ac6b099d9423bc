//! URL handling module for Skewer
//!
//! This module provides URL validation, origin and host extraction, glob
//! pattern matching for discovered links, and coarse URL categorization.

mod category;
mod domain;
mod matcher;

use crate::{UrlError, UrlResult};
use url::Url;

// Re-export main functions
pub use category::{categorize_urls, UrlCategories, UrlCategory};
pub use domain::{extract_domain, origin_key, robots_url};
pub use matcher::UrlPattern;

/// Parses a URL and checks that it can be fetched
///
/// Only `http` and `https` URLs with a host are accepted.
///
/// # Examples
///
/// ```
/// use skewer::url::validate_url;
///
/// assert!(validate_url("https://example.com/page").is_ok());
/// assert!(validate_url("ftp://example.com/file").is_err());
/// assert!(validate_url("not-a-url").is_err());
/// ```
pub fn validate_url(url_str: &str) -> UrlResult<Url> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    Ok(url)
}

/// Returns true if the string is a fetchable http(s) URL
pub fn is_fetchable(url_str: &str) -> bool {
    validate_url(url_str).is_ok()
}

//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching robots.txt files.
//! A robots.txt that cannot be fetched never blocks a crawl: it is treated as
//! allowing everything.

mod cache;
mod parser;

pub use cache::RobotsCache;
pub use parser::{product_token, ParsedRobots};

use reqwest::header::{LOCATION, USER_AGENT};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Timeout for a robots.txt request
pub const ROBOTS_TIMEOUT: Duration = Duration::from_secs(5);

/// Fetches and parses robots.txt
///
/// Redirects are followed up to `max_redirects` hops, so a robots.txt moved
/// to another host or scheme is still honored. Transport errors, non-success
/// statuses and redirects beyond the budget all yield
/// [`ParsedRobots::allow_all`].
///
/// # Arguments
///
/// * `client` - The HTTP client to use (it does not follow redirects itself)
/// * `robots_url` - Location of the robots.txt file
/// * `user_agent` - The user agent string to send
/// * `max_redirects` - Redirect hops to follow
pub async fn fetch_robots(
    client: &Client,
    robots_url: &Url,
    user_agent: &str,
    max_redirects: usize,
) -> ParsedRobots {
    let mut current = robots_url.clone();
    let mut hops = 0;

    let response = loop {
        let response = match client
            .get(current.clone())
            .header(USER_AGENT, user_agent)
            .timeout(ROBOTS_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("robots.txt unavailable at {}: {}", current, e);
                return ParsedRobots::allow_all();
            }
        };

        if !response.status().is_redirection() {
            break response;
        }

        let next = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|location| current.join(location).ok());

        match next {
            Some(next) if hops < max_redirects => {
                tracing::debug!("robots.txt redirect {} -> {}", current, next);
                hops += 1;
                current = next;
            }
            _ => {
                tracing::debug!(
                    "robots.txt redirect at {} not followed, allowing all",
                    current
                );
                return ParsedRobots::allow_all();
            }
        }
    };

    if !response.status().is_success() {
        tracing::debug!(
            "robots.txt at {} returned {}, allowing all",
            current,
            response.status()
        );
        return ParsedRobots::allow_all();
    }

    match response.text().await {
        Ok(body) => ParsedRobots::from_content(&body),
        Err(e) => {
            tracing::debug!("Failed to read robots.txt at {}: {}", current, e);
            ParsedRobots::allow_all()
        }
    }
}

//! Breadth-first frontier for site discovery
//!
//! This module tracks, for a single discovery run:
//! - URLs already visited (never shrinks)
//! - URLs discovered from crawled pages, in discovery order
//! - The FIFO queue of URLs still to visit, with their link depth
//!
//! A URL is queued at most once per run, and never after it was visited.

use std::collections::{HashSet, VecDeque};

/// A URL waiting to be crawled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedUrl {
    /// The URL to fetch
    pub url: String,

    /// Link distance from the seed (the seed is depth 0)
    pub depth: usize,
}

/// Frontier state for one discovery run
#[derive(Debug)]
pub struct Frontier {
    visited: HashSet<String>,
    discovered: HashSet<String>,
    discovered_order: Vec<String>,
    queue: VecDeque<QueuedUrl>,
    max_urls: usize,
}

impl Frontier {
    /// Creates a frontier holding only the seed
    ///
    /// The seed is queued but does not count as discovered.
    pub fn new(seed: &str, max_urls: usize) -> Self {
        Self {
            visited: HashSet::new(),
            discovered: HashSet::new(),
            discovered_order: Vec::new(),
            queue: VecDeque::from([QueuedUrl {
                url: seed.to_string(),
                depth: 0,
            }]),
            max_urls,
        }
    }

    /// Returns true once the queue is drained or the discovery budget is used
    fn is_exhausted(&self) -> bool {
        self.queue.is_empty() || self.discovered.len() >= self.max_urls
    }

    /// Pops the next unvisited URL and marks it visited
    pub fn next_url(&mut self) -> Option<QueuedUrl> {
        while !self.is_exhausted() {
            let queued = self.queue.pop_front()?;
            if self.visited.insert(queued.url.clone()) {
                return Some(queued);
            }
        }
        None
    }

    /// Offers a link found on a crawled page
    ///
    /// Returns true if the URL was newly discovered and queued. URLs already
    /// visited or discovered are ignored, as is everything once `max_urls`
    /// URLs have been discovered.
    pub fn offer(&mut self, url: &str, depth: usize) -> bool {
        if self.discovered.len() >= self.max_urls
            || self.visited.contains(url)
            || self.discovered.contains(url)
        {
            return false;
        }

        self.discovered.insert(url.to_string());
        self.discovered_order.push(url.to_string());
        self.queue.push_back(QueuedUrl {
            url: url.to_string(),
            depth,
        });
        true
    }

    /// Consumes the frontier, returning discovered URLs in discovery order
    pub fn into_discovered(self) -> Vec<String> {
        self.discovered_order
    }
}

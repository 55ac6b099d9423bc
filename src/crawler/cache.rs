//! In-memory response cache
//!
//! Entries are bounded by an LRU capacity and expire after a fixed TTL.
//! Lookups hand out clones so callers can never alter a cached result.

use crate::crawler::FetchResult;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Default time-to-live for cached responses
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Default number of cached responses
pub const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1024) {
    Some(capacity) => capacity,
    None => unreachable!(),
};

#[derive(Debug)]
struct CacheEntry {
    result: FetchResult,
    stored_at: Instant,
}

/// Shared cache of fetch results keyed by requested URL
#[derive(Debug)]
pub struct FetchCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    ttl: Duration,
}

impl FetchCache {
    /// Creates a cache holding at most `capacity` entries for `ttl` each
    pub fn new(capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Creates a cache from configured values, clamping a zero capacity to one
    pub fn from_settings(capacity: usize, ttl_secs: u64) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self::new(capacity, Duration::from_secs(ttl_secs))
    }

    /// Returns the TTL entries are kept for
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns a copy of the cached result for `url` if it has not expired
    ///
    /// Expired entries are evicted on lookup.
    pub fn get(&self, url: &str) -> Option<FetchResult> {
        let mut entries = self.lock();

        match entries.get(url) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                return Some(entry.result.clone());
            }
            Some(_) => {}
            None => return None,
        }

        tracing::debug!("Cache entry expired: {}", url);
        entries.pop(url);
        None
    }

    /// Stores a result under `url`, replacing any previous entry
    pub fn insert(&self, url: &str, result: FetchResult) {
        self.lock().put(
            url.to_string(),
            CacheEntry {
                result,
                stored_at: Instant::now(),
            },
        );
    }

    /// Number of entries currently held, expired or not
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drops every entry
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, CacheEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for FetchCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}

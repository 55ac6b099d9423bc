//! Robots.txt policy cache
//!
//! Policies are keyed by origin (`scheme://host[:port]`) and kept for the
//! lifetime of the cache. There is no expiry: a crawler that must notice
//! robots.txt edits should be given a fresh cache.
//!
//! Each origin is resolved at most once. Lookups that arrive while an
//! origin's robots.txt is still being fetched wait for that fetch.

use crate::robots::ParsedRobots;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::OnceCell;

type Slot = Arc<OnceCell<Arc<ParsedRobots>>>;

/// Shared, injectable cache of robots policies
///
/// Cloning the `Arc` that holds a cache shares it; separate crawlers built
/// with separate caches never see each other's policies.
#[derive(Debug, Default)]
pub struct RobotsCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl RobotsCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the policy for `origin`, running `fetch` if none is cached
    ///
    /// Only one `fetch` runs per origin. If it is cancelled before finishing,
    /// the next caller fetches again.
    pub async fn get_or_fetch<F, Fut>(&self, origin: &str, fetch: F) -> Arc<ParsedRobots>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ParsedRobots>,
    {
        let slot = Arc::clone(self.lock().entry(origin.to_string()).or_default());
        let policy = slot.get_or_init(move || async move { Arc::new(fetch().await) }).await;
        Arc::clone(policy)
    }

    /// Number of origins with a resolved policy
    pub fn len(&self) -> usize {
        self.lock().values().filter(|slot| slot.initialized()).count()
    }

    /// Returns true if no policy is cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cached policy
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

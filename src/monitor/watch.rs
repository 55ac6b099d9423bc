//! Periodic change watching for a single URL
//!
//! A watch runs as its own tokio task. Each tick crawls the page and compares
//! it with the previous successful crawl; the comparison is sent as a
//! [`WatchEvent`] on a bounded channel. The task ends when the handle is
//! stopped or dropped, or when the receiver is dropped.

use crate::analysis::{cosine_similarity, has_changed};
use crate::crawler::CrawledPage;
use crate::ConfigError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Capacity of the watch event channel
pub const EVENT_BUFFER: usize = 16;

/// Size difference in bytes above which a page counts as resized
pub const SIZE_CHANGE_BYTES: usize = 1000;

/// The parts of a crawl a watch compares
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot {
    pub text: String,
    pub title: Option<String>,
    pub link_count: usize,
    pub size: usize,
}

impl From<&CrawledPage> for PageSnapshot {
    fn from(page: &CrawledPage) -> Self {
        Self {
            text: page.page.text.content.clone(),
            title: page.page.metadata.title.clone(),
            link_count: page.page.links.len(),
            size: page.fetch.size,
        }
    }
}

/// Differences between two consecutive crawls of one URL
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeReport {
    pub url: String,
    /// Cosine similarity of the two page texts
    pub similarity: f64,
    /// Similarity fell below the change threshold
    pub changed: bool,
    pub title_changed: bool,
    pub links_changed: bool,
    pub size_changed: bool,
    pub previous_size: usize,
    pub current_size: usize,
    pub checked_at: DateTime<Utc>,
}

impl ChangeReport {
    pub fn between(url: &str, previous: &PageSnapshot, current: &PageSnapshot) -> Self {
        let similarity = cosine_similarity(&previous.text, &current.text);

        Self {
            url: url.to_string(),
            similarity,
            changed: has_changed(similarity),
            title_changed: previous.title != current.title,
            links_changed: previous.link_count != current.link_count,
            size_changed: previous.size.abs_diff(current.size) > SIZE_CHANGE_BYTES,
            previous_size: previous.size,
            current_size: current.size,
            checked_at: Utc::now(),
        }
    }

    /// Returns true if any tracked signal changed
    pub fn any_change(&self) -> bool {
        self.changed || self.title_changed || self.links_changed || self.size_changed
    }
}

#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// A crawl succeeded and was compared with the previous one
    Checked(ChangeReport),
    /// A crawl failed; the watch keeps going
    Failed {
        url: String,
        error: String,
        at: DateTime<Utc>,
    },
}

/// Controls a running watch
///
/// Dropping the handle stops the watch at its next suspension point.
#[derive(Debug)]
pub struct WatchHandle {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl WatchHandle {
    /// Signals the watch to stop and waits for the task to finish
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Err(e) = (&mut self.task).await {
            tracing::warn!("Watch task ended abnormally: {}", e);
        }
    }

    /// Returns true once the watch task has ended
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawns a watch that calls `check` every `interval`
///
/// The first check runs immediately and only seeds the comparison; events
/// start with the second successful check. Failed checks are reported and
/// do not replace the previous snapshot.
///
/// A zero `interval` is rejected before anything is spawned.
pub fn spawn_watch<F, Fut>(
    url: String,
    interval: Duration,
    mut check: F,
) -> crate::Result<(WatchHandle, mpsc::Receiver<WatchEvent>)>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = crate::Result<PageSnapshot>> + Send + 'static,
{
    if interval.is_zero() {
        return Err(ConfigError::Validation(
            "watch interval must be greater than 0".to_string(),
        )
        .into());
    }

    let (events, receiver) = mpsc::channel(EVENT_BUFFER);
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        tracing::info!("Watching {} every {:?}", url, interval);

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut previous: Option<PageSnapshot> = None;

        loop {
            tokio::select! {
                _ = &mut stop_rx => break,
                _ = ticker.tick() => {}
            }

            let result = tokio::select! {
                _ = &mut stop_rx => break,
                result = check() => result,
            };

            let event = match result {
                Ok(current) => {
                    let report = previous
                        .as_ref()
                        .map(|prev| ChangeReport::between(&url, prev, &current));
                    previous = Some(current);
                    report.map(WatchEvent::Checked)
                }
                Err(e) => {
                    tracing::warn!("Watch check failed for {}: {}", url, e);
                    Some(WatchEvent::Failed {
                        url: url.clone(),
                        error: e.to_string(),
                        at: Utc::now(),
                    })
                }
            };

            let Some(event) = event else {
                continue;
            };

            let delivered = tokio::select! {
                _ = &mut stop_rx => false,
                sent = events.send(event) => sent.is_ok(),
            };
            if !delivered {
                break;
            }
        }

        tracing::info!("Stopped watching {}", url);
    });

    Ok((
        WatchHandle {
            stop: Some(stop_tx),
            task,
        },
        receiver,
    ))
}

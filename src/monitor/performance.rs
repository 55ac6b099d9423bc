//! Request performance telemetry
//!
//! Every fetch performed through a crawler is recorded here. Each recording
//! is a single read-modify-write under one lock, so concurrent batch fetches
//! never interleave partial updates.

use crate::url::extract_domain;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use url::Url;

/// Handle for a request in flight
#[derive(Debug, Clone)]
pub struct RequestToken {
    url: String,
    started: Instant,
}

impl RequestToken {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// How a monitored request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A response was received
    Success { status_code: u16 },
    /// The request failed without a usable response
    Failure,
}

/// Duration of one request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestTiming {
    pub url: String,
    pub duration_ms: f64,
}

/// Running totals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    pub requests: u64,
    pub failures: u64,
    pub total_time_ms: f64,
    pub avg_response_ms: f64,
    pub fastest: Option<RequestTiming>,
    pub slowest: Option<RequestTiming>,
    /// Successful responses per status code
    pub status_codes: BTreeMap<u16, u64>,
    /// Successful responses per host
    pub domains: BTreeMap<String, u64>,
    pub started_at: DateTime<Utc>,
}

impl PerformanceMetrics {
    fn new() -> Self {
        Self {
            requests: 0,
            failures: 0,
            total_time_ms: 0.0,
            avg_response_ms: 0.0,
            fastest: None,
            slowest: None,
            status_codes: BTreeMap::new(),
            domains: BTreeMap::new(),
            started_at: Utc::now(),
        }
    }
}

/// Snapshot of the metrics with derived rates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceStats {
    #[serde(flatten)]
    pub metrics: PerformanceMetrics,
    pub uptime_ms: u64,
    /// Percentage of requests that succeeded; NaN before the first request
    pub success_rate: f64,
    /// 0 before the first request
    pub requests_per_second: f64,
}

#[derive(Debug)]
struct MonitorState {
    metrics: PerformanceMetrics,
    started: Instant,
}

impl MonitorState {
    fn new() -> Self {
        Self {
            metrics: PerformanceMetrics::new(),
            started: Instant::now(),
        }
    }
}

/// Aggregates request timings, status codes and hosts
#[derive(Debug)]
pub struct PerformanceMonitor {
    state: Mutex<MonitorState>,
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MonitorState::new()),
        }
    }

    /// Starts timing a request
    pub fn start_request(&self, url: &str) -> RequestToken {
        RequestToken {
            url: url.to_string(),
            started: Instant::now(),
        }
    }

    /// Records a request started with [`start_request`](Self::start_request)
    pub fn end_request(&self, token: RequestToken, outcome: RequestOutcome) {
        let elapsed = token.elapsed();
        self.record(&token.url, elapsed, outcome);
    }

    /// Records one finished request
    ///
    /// Failures count toward requests, timings and fastest/slowest but not
    /// toward the status code or host histograms.
    pub fn record(&self, url: &str, elapsed: Duration, outcome: RequestOutcome) {
        let duration_ms = elapsed.as_secs_f64() * 1000.0;
        let mut state = self.lock();
        let metrics = &mut state.metrics;

        metrics.requests += 1;
        metrics.total_time_ms += duration_ms;
        metrics.avg_response_ms = metrics.total_time_ms / metrics.requests as f64;

        match outcome {
            RequestOutcome::Failure => metrics.failures += 1,
            RequestOutcome::Success { status_code } => {
                *metrics.status_codes.entry(status_code).or_insert(0) += 1;
                if let Some(domain) = Url::parse(url).ok().as_ref().and_then(extract_domain) {
                    *metrics.domains.entry(domain).or_insert(0) += 1;
                }
            }
        }

        if metrics
            .fastest
            .as_ref()
            .map_or(true, |fastest| duration_ms < fastest.duration_ms)
        {
            metrics.fastest = Some(RequestTiming {
                url: url.to_string(),
                duration_ms,
            });
        }

        if metrics
            .slowest
            .as_ref()
            .map_or(true, |slowest| duration_ms > slowest.duration_ms)
        {
            metrics.slowest = Some(RequestTiming {
                url: url.to_string(),
                duration_ms,
            });
        }
    }

    /// Returns a snapshot of the current metrics
    pub fn stats(&self) -> PerformanceStats {
        let state = self.lock();
        let metrics = state.metrics.clone();
        let uptime = state.started.elapsed();
        drop(state);

        let (success_rate, requests_per_second) = if metrics.requests == 0 {
            (f64::NAN, 0.0)
        } else {
            let succeeded = (metrics.requests - metrics.failures) as f64;
            let secs = uptime.as_secs_f64();
            (
                succeeded / metrics.requests as f64 * 100.0,
                if secs > 0.0 {
                    metrics.requests as f64 / secs
                } else {
                    0.0
                },
            )
        };

        PerformanceStats {
            metrics,
            uptime_ms: u64::try_from(uptime.as_millis()).unwrap_or(u64::MAX),
            success_rate,
            requests_per_second,
        }
    }

    /// Clears every counter and restarts the uptime clock
    pub fn reset(&self) {
        *self.lock() = MonitorState::new();
    }

    fn lock(&self) -> MutexGuard<'_, MonitorState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

//! Runtime monitoring
//!
//! This module contains:
//! - Aggregate request telemetry shared by every fetch of a crawler
//! - Periodic change watching of a single page

pub mod performance;
pub mod watch;

pub use performance::{
    PerformanceMetrics, PerformanceMonitor, PerformanceStats, RequestOutcome, RequestTiming,
    RequestToken,
};
pub use watch::{spawn_watch, ChangeReport, PageSnapshot, WatchEvent, WatchHandle};

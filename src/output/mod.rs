//! Output module for exports, sitemaps and reports
//!
//! This module handles:
//! - Exporting the similarity log and performance snapshot as JSON, CSV or XML
//! - Rendering discovered pages as an XML sitemap
//! - Printing crawl results and statistics

pub mod export;
pub mod sitemap;
pub mod stats;

pub use export::{escape_xml, export, ExportData, ExportFormat};
pub use sitemap::{calculate_priority, render_sitemap_xml, ChangeFrequency, SitemapEntry};
pub use stats::{format_statistics, print_statistics};

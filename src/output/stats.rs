//! Human-readable reports for the command line
//!
//! This module renders crawl results and performance snapshots as plain
//! text for stdout.

use crate::crawler::{ComparisonReport, CrawledPage, DiscoveryReport, LinkStatus, PageOutcome};
use crate::monitor::PerformanceStats;
use std::fmt::Write;

/// Formats a performance snapshot
pub fn format_statistics(stats: &PerformanceStats) -> String {
    let metrics = &stats.metrics;
    let mut out = String::new();

    let _ = writeln!(out, "=== Performance Statistics ===\n");

    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  Requests: {}", metrics.requests);
    let _ = writeln!(out, "  Failures: {}", metrics.failures);
    let _ = writeln!(out, "  Average response: {:.1}ms", metrics.avg_response_ms);
    let _ = writeln!(out, "  Uptime: {:.1}s", stats.uptime_ms as f64 / 1000.0);
    let _ = writeln!(out, "  Requests/sec: {:.2}", stats.requests_per_second);
    let _ = writeln!(out);

    if let (Some(fastest), Some(slowest)) = (&metrics.fastest, &metrics.slowest) {
        let _ = writeln!(out, "Timings:");
        let _ = writeln!(out, "  Fastest: {} ({:.1}ms)", fastest.url, fastest.duration_ms);
        let _ = writeln!(out, "  Slowest: {} ({:.1}ms)", slowest.url, slowest.duration_ms);
        let _ = writeln!(out);
    }

    if !metrics.status_codes.is_empty() {
        let _ = writeln!(out, "Status Codes:");
        for (code, count) in &metrics.status_codes {
            let _ = writeln!(out, "  {}: {}", code, count);
        }
        let _ = writeln!(out);
    }

    if !metrics.domains.is_empty() {
        let _ = writeln!(out, "Domains ({}):", metrics.domains.len());
        // Sort domains by count (descending)
        let mut domains: Vec<_> = metrics.domains.iter().collect();
        domains.sort_by(|a, b| b.1.cmp(a.1));
        for (domain, count) in domains {
            let _ = writeln!(out, "  - {}: {}", domain, count);
        }
        let _ = writeln!(out);
    }

    if stats.success_rate.is_nan() {
        let _ = write!(out, "Success Rate: n/a (no requests recorded)");
    } else {
        let _ = write!(
            out,
            "Success Rate: {:.1}% ({} / {} requests succeeded)",
            stats.success_rate,
            metrics.requests - metrics.failures,
            metrics.requests
        );
    }

    out
}

/// Prints a performance snapshot to stdout
pub fn print_statistics(stats: &PerformanceStats) {
    println!("{}", format_statistics(stats));
}

/// Prints the analysis of a single page
pub fn print_page(page: &CrawledPage) {
    let fetch = &page.fetch;
    let parsed = &page.page;

    println!("=== {} ===\n", fetch.url);
    println!("Response:");
    println!("  Status: {}", fetch.status_code);
    if fetch.final_url != fetch.url {
        println!("  Final URL: {}", fetch.final_url);
    }
    println!("  Content-Type: {}", fetch.content_type);
    println!("  Encoding: {}", fetch.encoding);
    println!("  Size: {} bytes", fetch.size);
    println!();

    println!("Content:");
    println!(
        "  Title: {}",
        parsed.metadata.title.as_deref().unwrap_or("(none)")
    );
    println!("  Words: {}", parsed.text.word_count);
    println!("  Headings: {}", parsed.text.headings.len());
    println!("  Links: {}", parsed.links.len());
    println!("  Images: {}", parsed.images.len());
    println!("  Readability: {:.1}", page.readability);
    println!();

    let quality = &page.quality;
    println!("Quality: {} ({})", quality.overall, quality.grade);
    for (dimension, score) in quality.breakdown.iter() {
        println!("  {}: {:.0}", dimension, score);
    }
    for recommendation in &quality.recommendations {
        println!("  - {}", recommendation);
    }
}

/// Prints one line per batch outcome
pub fn print_outcomes(outcomes: &[PageOutcome]) {
    for outcome in outcomes {
        match outcome {
            PageOutcome::Crawled(page) => println!(
                "  ✓ {} [{}] quality {} ({})",
                page.fetch.url, page.fetch.status_code, page.quality.overall, page.quality.grade
            ),
            PageOutcome::Failed { url, error } => println!("  ✗ {}: {}", url, error),
        }
    }
}

/// Prints a discovery summary
pub fn print_discovery(report: &DiscoveryReport) {
    println!("=== Discovery ===\n");
    println!("  URLs discovered: {}", report.stats.total_urls);
    println!("  Pages crawled: {}", report.stats.crawled);
    println!("  Pages failed: {}", report.stats.failed);
    println!();

    for (depth, page) in &report.pages {
        println!(
            "  [{}] {} ({})",
            depth,
            page.fetch.url,
            page.page.metadata.title.as_deref().unwrap_or("untitled")
        );
    }

    if !report.categories.categories.is_empty() {
        println!();
        println!("Categories:");
        for (category, urls) in &report.categories.categories {
            println!("  {}: {}", category, urls.len());
        }
        println!("  uncategorized: {}", report.categories.uncategorized.len());
    }
}

/// Prints a link audit
pub fn print_link_statuses(statuses: &[LinkStatus]) {
    let broken = statuses.iter().filter(|s| s.error).count();
    println!("=== Link Check ({} checked, {} broken) ===\n", statuses.len(), broken);

    for status in statuses {
        let marker = if status.error { "✗" } else { "✓" };
        println!(
            "  {} {} {} {}",
            marker, status.status_code, status.url, status.status_text
        );
    }
}

/// Prints a batch comparison
pub fn print_comparison(report: &ComparisonReport) {
    println!("=== Comparison ===\n");
    print_outcomes(&report.outcomes);
    println!();

    match report.average_quality {
        Some(average) => println!("Average quality: {:.1}", average),
        None => println!("Average quality: n/a"),
    }

    for leader in &report.best {
        println!("Best {}: {} ({:.1})", leader.metric, leader.url, leader.score);
    }
    for recommendation in &report.recommendations {
        println!("  ! {}", recommendation);
    }

    if report.duplicates.is_empty() {
        println!("No duplicates found");
    } else {
        println!("Duplicates ({}):", report.duplicates.len());
        for pair in &report.duplicates {
            println!(
                "  - {} ~ {}: {:.3} ({})",
                pair.first_url, pair.second_url, pair.similarity, pair.kind
            );
        }
    }
    println!();
}

//! Ranking a batch of crawled pages against each other

use crate::crawler::CrawledPage;
use serde::Serialize;
use std::fmt;

/// Batch average below which the whole batch needs work
pub const WEAK_BATCH_AVERAGE: f64 = 70.0;

/// Pages with an overall score below this need significant work
pub const WEAK_PAGE_SCORE: u8 = 60;

/// A score pages are ranked on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonMetric {
    /// Overall quality score
    Quality,
    /// Transfer weight, see [`page_weight_score`]
    Performance,
    /// SEO dimension of the quality score
    Seo,
}

impl ComparisonMetric {
    pub const ALL: [ComparisonMetric; 3] = [
        ComparisonMetric::Quality,
        ComparisonMetric::Performance,
        ComparisonMetric::Seo,
    ];

    pub fn score(self, page: &CrawledPage) -> f64 {
        match self {
            Self::Quality => f64::from(page.quality.overall),
            Self::Performance => page_weight_score(page),
            Self::Seo => page.quality.breakdown.seo,
        }
    }
}

impl fmt::Display for ComparisonMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Quality => "Quality",
            Self::Performance => "Performance",
            Self::Seo => "SEO",
        };
        f.write_str(name)
    }
}

/// The best page of a batch on one metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricLeader {
    pub metric: ComparisonMetric,
    pub url: String,
    pub score: f64,
}

/// Scores a page 0-100 on body size and image count alone
pub fn page_weight_score(page: &CrawledPage) -> f64 {
    let mut score: f64 = 100.0;

    match page.fetch.size {
        size if size > 1_000_000 => score -= 30.0,
        size if size > 500_000 => score -= 15.0,
        _ => {}
    }

    match page.page.images.len() {
        n if n > 50 => score -= 20.0,
        n if n > 20 => score -= 10.0,
        _ => {}
    }

    score.max(0.0)
}

/// Finds the best page for each metric
///
/// The earliest page wins a tie. An empty batch has no leaders.
pub fn metric_leaders(pages: &[&CrawledPage]) -> Vec<MetricLeader> {
    ComparisonMetric::ALL
        .into_iter()
        .filter_map(|metric| {
            let mut best: Option<(&CrawledPage, f64)> = None;
            for &page in pages {
                let score = metric.score(page);
                if best.map_or(true, |(_, top)| score > top) {
                    best = Some((page, score));
                }
            }
            best.map(|(page, score)| MetricLeader {
                metric,
                url: page.fetch.url.clone(),
                score,
            })
        })
        .collect()
}

/// Advice for a batch as a whole
pub fn comparison_recommendations(pages: &[&CrawledPage]) -> Vec<String> {
    if pages.is_empty() {
        return Vec::new();
    }

    let mut recommendations = Vec::new();
    let average = pages
        .iter()
        .map(|p| f64::from(p.quality.overall))
        .sum::<f64>()
        / pages.len() as f64;

    if average < WEAK_BATCH_AVERAGE {
        recommendations.push("Overall quality needs improvement across all pages".to_string());
    }

    let weak = pages
        .iter()
        .filter(|p| p.quality.overall < WEAK_PAGE_SCORE)
        .count();
    if weak > 0 {
        recommendations.push(format!(
            "{} pages need significant quality improvements",
            weak
        ));
    }

    recommendations
}

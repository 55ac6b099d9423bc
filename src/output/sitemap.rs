//! XML sitemap generation from discovered pages

use crate::crawler::CrawledPage;
use crate::output::export::escape_xml;
use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

static DAILY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)news|blog|article").expect("DAILY: hardcoded regex is valid"));

static WEEKLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)product|shop|store").expect("WEEKLY: hardcoded regex is valid"));

static MONTHLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)about|contact|service").expect("MONTHLY: hardcoded regex is valid")
});

static YEARLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)privacy|terms|legal").expect("YEARLY: hardcoded regex is valid"));

/// How often a page is expected to change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl ChangeFrequency {
    /// Guesses a change frequency from keywords in the URL
    ///
    /// News and blog URLs change daily, shop URLs weekly, legal pages
    /// yearly; everything else monthly.
    pub fn estimate(url: &str) -> Self {
        if DAILY.is_match(url) {
            Self::Daily
        } else if WEEKLY.is_match(url) {
            Self::Weekly
        } else if MONTHLY.is_match(url) {
            Self::Monthly
        } else if YEARLY.is_match(url) {
            Self::Yearly
        } else {
            Self::Monthly
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl fmt::Display for ChangeFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sitemap priority of `url` relative to the site's base URL
///
/// The base itself gets 1.0; deeper paths get less, down to 0.2.
pub fn calculate_priority(url: &str, base_url: &str) -> f64 {
    if url == base_url {
        return 1.0;
    }

    match url.split('/').count().saturating_sub(3) {
        0 | 1 => 0.8,
        2 => 0.6,
        3 => 0.4,
        _ => 0.2,
    }
}

/// One `<url>` element of a sitemap
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SitemapEntry {
    pub url: String,
    pub last_modified: DateTime<Utc>,
    pub change_freq: ChangeFrequency,
    pub priority: f64,
    pub status_code: u16,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl SitemapEntry {
    /// Describes a crawled page
    ///
    /// The `Last-Modified` header is used when it parses, otherwise the
    /// fetch time.
    pub fn from_page(page: &CrawledPage, base_url: &str) -> Self {
        let url = page.fetch.final_url.clone();
        let last_modified = page
            .fetch
            .header("last-modified")
            .and_then(|value| DateTime::parse_from_rfc2822(value).ok())
            .map(|date| date.with_timezone(&Utc))
            .unwrap_or(page.fetch.fetched_at);

        Self {
            change_freq: ChangeFrequency::estimate(&url),
            priority: calculate_priority(&url, base_url),
            url,
            last_modified,
            status_code: page.fetch.status_code,
            title: page.page.metadata.title.clone(),
            description: page.page.metadata.description.clone(),
        }
    }
}

/// Renders entries as a sitemaps.org XML document
pub fn render_sitemap_xml(entries: &[SitemapEntry]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );

    for entry in entries {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.url)));
        xml.push_str(&format!(
            "    <lastmod>{}</lastmod>\n",
            entry
                .last_modified
                .to_rfc3339_opts(SecondsFormat::Secs, true)
        ));
        xml.push_str(&format!("    <changefreq>{}</changefreq>\n", entry.change_freq));
        xml.push_str(&format!("    <priority>{:.1}</priority>\n", entry.priority));
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>");
    xml
}

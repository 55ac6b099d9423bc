//! HTML parser for extracting links and metadata
//!
//! This module handles parsing HTML content to extract:
//! - Page metadata, Open Graph and Twitter card fields
//! - Links and images (absolute URLs)
//! - Visible text, headings and paragraphs
//! - JSON-LD structured data
//! - Forms and their fields

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use url::Url;

/// Elements whose text never counts as page content
const NON_CONTENT_ELEMENTS: &[&str] = &["script", "style", "noscript", "nav", "footer", "header"];

/// Document-level metadata from `<head>`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub author: Option<String>,
    /// Canonical URL, resolved against the page URL
    pub canonical: Option<String>,
    pub robots: Option<String>,
    pub viewport: Option<String>,
    /// `<html lang>` or the Content-Language meta value
    pub language: Option<String>,
    /// Charset declared in markup, if any
    pub charset: Option<String>,
}

/// `og:*` properties
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OpenGraph {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub site_name: Option<String>,
}

/// `twitter:*` properties
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TwitterCard {
    pub card: Option<String>,
    pub site: Option<String>,
    pub creator: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

/// An outbound `<a href>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub url: String,
    pub text: String,
    pub title: Option<String>,
    pub rel: Option<String>,
    pub target: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageImage {
    pub url: String,
    pub alt: Option<String>,
    pub title: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    /// 1 for `<h1>` through 6 for `<h6>`
    pub level: u8,
    pub text: String,
}

/// Readable text content of a page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageText {
    /// Body text outside scripts, styles and page chrome, whitespace collapsed
    pub content: String,
    pub headings: Vec<Heading>,
    pub paragraphs: Vec<String>,
    pub word_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormField {
    pub name: Option<String>,
    /// Input `type`, or the tag name for `<textarea>` and `<select>`
    #[serde(rename = "type")]
    pub kind: String,
    pub value: Option<String>,
    pub placeholder: Option<String>,
    pub required: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageForm {
    pub action: Option<String>,
    /// Upper-cased method, `GET` when absent
    pub method: String,
    pub enctype: Option<String>,
    pub fields: Vec<FormField>,
}

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedPage {
    pub metadata: PageMetadata,
    pub open_graph: OpenGraph,
    pub twitter: TwitterCard,
    pub links: Vec<PageLink>,
    pub images: Vec<PageImage>,
    pub text: PageText,
    /// JSON-LD blocks that parsed as JSON
    pub schema: Vec<serde_json::Value>,
    pub forms: Vec<PageForm>,
}

impl ParsedPage {
    /// Absolute URLs of every extracted link, in document order
    pub fn link_urls(&self) -> impl Iterator<Item = &str> {
        self.links.iter().map(|link| link.url.as_str())
    }
}

/// Turns an HTML document into a [`ParsedPage`]
///
/// Implementations must be pure: the same input always yields the same page.
pub trait PageExtractor: Send + Sync {
    fn extract(&self, html: &str, base_url: &Url) -> ParsedPage;
}

/// Default extractor backed by `scraper`
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlExtractor;

impl PageExtractor for HtmlExtractor {
    fn extract(&self, html: &str, base_url: &Url) -> ParsedPage {
        parse_html(html, base_url)
    }
}

/// Parses HTML content and extracts every supported field
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links
///
/// # Example
///
/// ```
/// use skewer::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.metadata.title, Some("Test".to_string()));
/// assert_eq!(parsed.links[0].url, "https://example.com/page");
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        metadata: extract_metadata(&document, base_url),
        open_graph: extract_open_graph(&document),
        twitter: extract_twitter(&document),
        links: extract_links(&document, base_url),
        images: extract_images(&document, base_url),
        text: extract_text(&document),
        schema: extract_schema(&document),
        forms: extract_forms(&document),
    }
}

/// Selects all elements matching `css`, or nothing if the selector is invalid
fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

fn attr(element: &ElementRef<'_>, name: &str) -> Option<String> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn element_text(element: &ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns the `content` of the first `<meta>` whose `key_attr` equals `key`
fn meta_content(document: &Html, key_attr: &str, key: &str) -> Option<String> {
    select_all(document, "meta[content]")
        .into_iter()
        .find(|meta| {
            meta.value()
                .attr(key_attr)
                .is_some_and(|value| value.trim().eq_ignore_ascii_case(key))
        })
        .and_then(|meta| attr(&meta, "content"))
}

fn extract_metadata(document: &Html, base_url: &Url) -> PageMetadata {
    let title = select_all(document, "title")
        .first()
        .map(element_text)
        .filter(|s| !s.is_empty());

    let canonical = select_all(document, "link[rel='canonical'][href]")
        .first()
        .and_then(|link| link.value().attr("href"))
        .and_then(|href| base_url.join(href.trim()).ok())
        .map(|url| url.to_string());

    let language = select_all(document, "html[lang]")
        .first()
        .and_then(|html| attr(html, "lang"))
        .or_else(|| meta_content(document, "http-equiv", "content-language"));

    let charset = select_all(document, "meta[charset]")
        .first()
        .and_then(|meta| attr(meta, "charset"))
        .or_else(|| {
            meta_content(document, "http-equiv", "content-type").and_then(|content| {
                content
                    .split(';')
                    .find_map(|part| part.trim().strip_prefix("charset="))
                    .map(|label| label.trim().to_string())
            })
        });

    PageMetadata {
        title,
        description: meta_content(document, "name", "description")
            .or_else(|| meta_content(document, "property", "og:description")),
        keywords: meta_content(document, "name", "keywords"),
        author: meta_content(document, "name", "author"),
        canonical,
        robots: meta_content(document, "name", "robots"),
        viewport: meta_content(document, "name", "viewport"),
        language,
        charset,
    }
}

fn extract_open_graph(document: &Html) -> OpenGraph {
    let og = |key: &str| meta_content(document, "property", &format!("og:{}", key));

    OpenGraph {
        title: og("title"),
        description: og("description"),
        image: og("image"),
        url: og("url"),
        kind: og("type"),
        site_name: og("site_name"),
    }
}

fn extract_twitter(document: &Html) -> TwitterCard {
    // Twitter tags appear with both `name` and `property` in the wild
    let twitter = |key: &str| {
        let key = format!("twitter:{}", key);
        meta_content(document, "name", &key).or_else(|| meta_content(document, "property", &key))
    };

    TwitterCard {
        card: twitter("card"),
        site: twitter("site"),
        creator: twitter("creator"),
        title: twitter("title"),
        description: twitter("description"),
        image: twitter("image"),
    }
}

fn extract_links(document: &Html, base_url: &Url) -> Vec<PageLink> {
    select_all(document, "a[href]")
        .into_iter()
        .filter(|element| element.value().attr("download").is_none())
        .filter_map(|element| {
            let url = resolve_link(element.value().attr("href")?, base_url)?;
            Some(PageLink {
                url,
                text: element_text(&element),
                title: attr(&element, "title"),
                rel: attr(&element, "rel"),
                target: attr(&element, "target"),
            })
        })
        .collect()
}

fn extract_images(document: &Html, base_url: &Url) -> Vec<PageImage> {
    select_all(document, "img[src]")
        .into_iter()
        .filter_map(|element| {
            let src = element.value().attr("src")?.trim();
            let url = base_url.join(src).ok()?.to_string();
            Some(PageImage {
                url,
                alt: attr(&element, "alt"),
                title: attr(&element, "title"),
                width: attr(&element, "width"),
                height: attr(&element, "height"),
            })
        })
        .collect()
}

fn extract_text(document: &Html) -> PageText {
    let root = select_all(document, "body")
        .into_iter()
        .next()
        .unwrap_or_else(|| document.root_element());

    let mut pieces = Vec::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|e| NON_CONTENT_ELEMENTS.contains(&e.name()))
        });
        if !hidden {
            pieces.push(&**text);
        }
    }
    let content = collapse_whitespace(&pieces.join(" "));

    let headings = select_all(document, "h1, h2, h3, h4, h5, h6")
        .into_iter()
        .filter_map(|element| {
            let level = element.value().name()[1..].parse().ok()?;
            Some(Heading {
                level,
                text: element_text(&element),
            })
        })
        .collect();

    let paragraphs = select_all(document, "p")
        .iter()
        .map(element_text)
        .filter(|p| !p.is_empty())
        .collect();

    PageText {
        word_count: content.split_whitespace().count(),
        content,
        headings,
        paragraphs,
    }
}

fn extract_schema(document: &Html) -> Vec<serde_json::Value> {
    select_all(document, r#"script[type="application/ld+json"]"#)
        .into_iter()
        .filter_map(|script| {
            let raw = script.text().collect::<String>();
            match serde_json::from_str(raw.trim()) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::debug!("Skipping malformed JSON-LD block: {}", e);
                    None
                }
            }
        })
        .collect()
}

fn extract_forms(document: &Html) -> Vec<PageForm> {
    let Ok(field_selector) = Selector::parse("input, textarea, select") else {
        return Vec::new();
    };

    select_all(document, "form")
        .into_iter()
        .map(|form| PageForm {
            action: attr(&form, "action"),
            method: attr(&form, "method")
                .map(|m| m.to_ascii_uppercase())
                .unwrap_or_else(|| "GET".to_string()),
            enctype: attr(&form, "enctype"),
            fields: form
                .select(&field_selector)
                .map(|field| {
                    let tag = field.value().name();
                    FormField {
                        name: attr(&field, "name"),
                        kind: match tag {
                            "input" => attr(&field, "type").unwrap_or_else(|| "text".to_string()),
                            other => other.to_string(),
                        },
                        value: attr(&field, "value"),
                        placeholder: attr(&field, "placeholder"),
                        required: field.value().attr("required").is_some(),
                    }
                })
                .collect(),
        })
        .collect()
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    // Skip empty hrefs
    if href.is_empty() {
        return None;
    }

    // Skip special schemes
    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    // Skip fragment-only links (same page anchors)
    if href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => {
            Some(absolute_url.to_string())
        }
        _ => None,
    }
}

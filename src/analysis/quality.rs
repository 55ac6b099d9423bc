//! Multi-signal page quality scoring
//!
//! A page is scored 0-100 on five dimensions, which are averaged into an
//! overall score and a letter grade:
//!
//! | Dimension | Signals |
//! |-----------|---------|
//! | SEO | title, description, h1, canonical, Open Graph, structured data |
//! | Accessibility | language, image alt text, headings, form field labels |
//! | Performance | page size, image count, `document.write`, script count |
//! | Content | word count, readability, headings, paragraphs |
//! | Technical | 2xx status, viewport, encoding, HTTPS, mixed content |
//!
//! The SEO checks add up to 90, so an SEO score of 100 is unreachable.

use crate::crawler::{FetchResult, ParsedPage};
use serde::Serialize;
use std::fmt;

/// Dimensions scoring below this produce a recommendation
pub const RECOMMENDATION_THRESHOLD: f64 = 70.0;

/// A scored aspect of page quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Seo,
    Accessibility,
    Performance,
    Content,
    Technical,
}

impl Dimension {
    /// Every dimension, in reporting order
    pub const ALL: [Dimension; 5] = [
        Dimension::Seo,
        Dimension::Accessibility,
        Dimension::Performance,
        Dimension::Content,
        Dimension::Technical,
    ];

    /// Advice given when this dimension scores poorly
    pub fn recommendation(self) -> &'static str {
        match self {
            Self::Seo => "Improve SEO by adding proper title, meta description, and structured data",
            Self::Accessibility => {
                "Enhance accessibility with alt texts, proper headings, and language attributes"
            }
            Self::Performance => "Optimize page performance by reducing file sizes and script count",
            Self::Content => "Improve content quality with better structure and readability",
            Self::Technical => "Fix technical issues like HTTPS, viewport, and status codes",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Seo => "SEO",
            Self::Accessibility => "Accessibility",
            Self::Performance => "Performance",
            Self::Content => "Content",
            Self::Technical => "Technical",
        };
        f.write_str(name)
    }
}

/// Per-dimension scores
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScoreBreakdown {
    pub seo: f64,
    pub accessibility: f64,
    pub performance: f64,
    pub content: f64,
    pub technical: f64,
}

impl ScoreBreakdown {
    pub fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Seo => self.seo,
            Dimension::Accessibility => self.accessibility,
            Dimension::Performance => self.performance,
            Dimension::Content => self.content,
            Dimension::Technical => self.technical,
        }
    }

    /// Scores in reporting order
    pub fn iter(&self) -> impl Iterator<Item = (Dimension, f64)> + '_ {
        Dimension::ALL.into_iter().map(|d| (d, self.get(d)))
    }

    /// Mean of the five scores
    pub fn mean(&self) -> f64 {
        self.iter().map(|(_, score)| score).sum::<f64>() / Dimension::ALL.len() as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Grades an unrounded score, so 89.6 is still an A
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 90.0 => Self::APlus,
            s if s >= 80.0 => Self::A,
            s if s >= 70.0 => Self::B,
            s if s >= 60.0 => Self::C,
            s if s >= 50.0 => Self::D,
            _ => Self::F,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::APlus => "A+",
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityScore {
    /// Rounded mean of the breakdown, 0-100
    pub overall: u8,
    pub breakdown: ScoreBreakdown,
    /// Grade of the unrounded mean
    pub grade: Grade,
    /// One entry per dimension below 70, in reporting order
    pub recommendations: Vec<String>,
}

impl QualityScore {
    /// Derives the overall score, grade and advice from dimension scores
    pub fn from_breakdown(breakdown: ScoreBreakdown) -> Self {
        let mean = breakdown.mean();
        let recommendations = breakdown
            .iter()
            .filter(|&(_, score)| score < RECOMMENDATION_THRESHOLD)
            .map(|(dimension, _)| dimension.recommendation().to_string())
            .collect();

        Self {
            overall: mean.round().clamp(0.0, 100.0) as u8,
            breakdown,
            grade: Grade::from_score(mean),
            recommendations,
        }
    }
}

/// Everything the scorer looks at for one page
#[derive(Debug, Clone, Copy)]
pub struct QualityInput<'a> {
    /// Final URL of the page
    pub url: &'a str,
    pub status_code: u16,
    /// Decoded markup
    pub html: &'a str,
    /// Body size in bytes
    pub size: usize,
    /// Encoding the body was decoded with
    pub encoding: &'a str,
    pub page: &'a ParsedPage,
    /// Flesch reading ease of the page text
    pub readability: f64,
}

impl<'a> QualityInput<'a> {
    pub fn new(fetch: &'a FetchResult, page: &'a ParsedPage, readability: f64) -> Self {
        Self {
            url: &fetch.final_url,
            status_code: fetch.status_code,
            html: &fetch.body,
            size: fetch.size,
            encoding: &fetch.encoding,
            page,
            readability,
        }
    }
}

/// Scores a page on every dimension
pub fn score_page(input: &QualityInput<'_>) -> QualityScore {
    let breakdown = ScoreBreakdown {
        seo: score_seo(input),
        accessibility: score_accessibility(input),
        performance: score_performance(input),
        content: score_content(input),
        technical: score_technical(input),
    };

    QualityScore::from_breakdown(breakdown)
}

fn points(condition: bool, weight: f64) -> f64 {
    if condition {
        weight
    } else {
        0.0
    }
}

fn score_seo(input: &QualityInput<'_>) -> f64 {
    let meta = &input.page.metadata;
    let title_len = meta.title.as_deref().map(|t| t.chars().count());
    let description_len = meta.description.as_deref().map(|d| d.chars().count());

    points(title_len.is_some(), 20.0)
        + points(title_len.is_some_and(|len| (30..=60).contains(&len)), 15.0)
        + points(description_len.is_some(), 15.0)
        + points(
            description_len.is_some_and(|len| (120..=160).contains(&len)),
            10.0,
        )
        + points(input.page.text.headings.iter().any(|h| h.level == 1), 10.0)
        + points(meta.canonical.is_some(), 10.0)
        + points(input.page.open_graph.title.is_some(), 10.0)
        + points(!input.page.schema.is_empty(), 10.0)
}

fn score_accessibility(input: &QualityInput<'_>) -> f64 {
    let page = input.page;
    let with_alt = page.images.iter().filter(|img| img.alt.is_some()).count();
    let alt_ratio = with_alt as f64 / page.images.len().max(1) as f64;
    let fields_labelled = page
        .forms
        .iter()
        .flat_map(|form| &form.fields)
        .all(|field| field.name.is_some() || field.placeholder.is_some());

    points(page.metadata.language.is_some(), 25.0)
        + alt_ratio * 25.0
        + points(!page.text.headings.is_empty(), 25.0)
        + points(fields_labelled, 25.0)
}

fn score_performance(input: &QualityInput<'_>) -> f64 {
    let mut score: f64 = 100.0;

    if input.size > 1_000_000 {
        score -= 20.0;
    } else if input.size > 500_000 {
        score -= 10.0;
    }

    if input.page.images.len() > 20 {
        score -= 15.0;
    }

    if input.html.contains("document.write") {
        score -= 10.0;
    }

    if input.html.matches("<script").count() > 10 {
        score -= 10.0;
    }

    score.max(0.0)
}

fn score_content(input: &QualityInput<'_>) -> f64 {
    let text = &input.page.text;

    let words = match text.word_count {
        n if n >= 300 => 25.0,
        n if n >= 150 => 15.0,
        _ => 0.0,
    };
    let readability = match input.readability {
        r if r >= 60.0 => 25.0,
        r if r >= 30.0 => 15.0,
        _ => 0.0,
    };

    words
        + readability
        + points(text.headings.len() >= 3, 25.0)
        + points(text.paragraphs.len() >= 3, 25.0)
}

fn score_technical(input: &QualityInput<'_>) -> f64 {
    let is_https = input.url.starts_with("https://");
    let no_mixed_content = !input.html.contains("http://") || input.url.starts_with("http://");

    points((200..300).contains(&input.status_code), 20.0)
        + points(input.page.metadata.viewport.is_some(), 20.0)
        + points(!input.encoding.is_empty(), 20.0)
        + points(is_https, 20.0)
        + points(no_mixed_content, 20.0)
}

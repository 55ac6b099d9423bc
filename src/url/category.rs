//! Coarse URL categories from file extensions and keywords

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

static IMAGES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(jpg|jpeg|png|gif|webp|svg|bmp|ico)$")
        .expect("IMAGES: hardcoded regex is valid")
});

static DOCUMENTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(pdf|doc|docx|xls|xlsx|ppt|pptx|txt)$")
        .expect("DOCUMENTS: hardcoded regex is valid")
});

static VIDEOS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(mp4|avi|mov|wmv|flv|webm|mkv)$").expect("VIDEOS: hardcoded regex is valid")
});

static AUDIO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(mp3|wav|flac|aac|ogg|wma)$").expect("AUDIO: hardcoded regex is valid")
});

static ARCHIVES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(zip|rar|tar|gz|7z|bz2)$").expect("ARCHIVES: hardcoded regex is valid")
});

static SOCIAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(facebook|twitter|instagram|linkedin|youtube|tiktok|pinterest)\.")
        .expect("SOCIAL: hardcoded regex is valid")
});

static ECOMMERCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(shop|store|buy|cart|checkout|product)\b")
        .expect("ECOMMERCE: hardcoded regex is valid")
});

static BLOG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(blog|post|article|news)\b").expect("BLOG: hardcoded regex is valid")
});

/// What a URL most likely points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlCategory {
    Images,
    Documents,
    Videos,
    Audio,
    Archives,
    Social,
    Ecommerce,
    Blog,
}

impl UrlCategory {
    pub const ALL: [UrlCategory; 8] = [
        UrlCategory::Images,
        UrlCategory::Documents,
        UrlCategory::Videos,
        UrlCategory::Audio,
        UrlCategory::Archives,
        UrlCategory::Social,
        UrlCategory::Ecommerce,
        UrlCategory::Blog,
    ];

    /// Returns true if `url` belongs to this category
    pub fn matches(self, url: &str) -> bool {
        let pattern: &Regex = match self {
            Self::Images => &*IMAGES,
            Self::Documents => &*DOCUMENTS,
            Self::Videos => &*VIDEOS,
            Self::Audio => &*AUDIO,
            Self::Archives => &*ARCHIVES,
            Self::Social => &*SOCIAL,
            Self::Ecommerce => &*ECOMMERCE,
            Self::Blog => &*BLOG,
        };
        pattern.is_match(url)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Images => "images",
            Self::Documents => "documents",
            Self::Videos => "videos",
            Self::Audio => "audio",
            Self::Archives => "archives",
            Self::Social => "social",
            Self::Ecommerce => "ecommerce",
            Self::Blog => "blog",
        }
    }
}

impl fmt::Display for UrlCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// URLs grouped by category
///
/// A URL can fall into several categories. Only non-empty categories are
/// stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UrlCategories {
    pub categories: BTreeMap<UrlCategory, Vec<String>>,
    /// URLs matching no category
    pub uncategorized: Vec<String>,
}

impl UrlCategories {
    /// URLs in `category`, in input order
    pub fn get(&self, category: UrlCategory) -> &[String] {
        self.categories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Sorts URLs into categories
pub fn categorize_urls<S: AsRef<str>>(urls: &[S]) -> UrlCategories {
    let mut result = UrlCategories::default();

    for url in urls {
        let url = url.as_ref();
        let mut matched = false;
        for category in UrlCategory::ALL {
            if category.matches(url) {
                result
                    .categories
                    .entry(category)
                    .or_default()
                    .push(url.to_string());
                matched = true;
            }
        }
        if !matched {
            result.uncategorized.push(url.to_string());
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_categories() {
        let urls = [
            "https://files.test/logo.PNG",
            "https://files.test/report.pdf",
            "https://files.test/intro.webm",
            "https://files.test/theme.mp3",
            "https://files.test/source.tar",
        ];
        let result = categorize_urls(&urls);

        assert_eq!(result.get(UrlCategory::Images), ["https://files.test/logo.PNG"]);
        assert_eq!(result.get(UrlCategory::Documents), ["https://files.test/report.pdf"]);
        assert_eq!(result.get(UrlCategory::Videos), ["https://files.test/intro.webm"]);
        assert_eq!(result.get(UrlCategory::Audio), ["https://files.test/theme.mp3"]);
        assert_eq!(result.get(UrlCategory::Archives), ["https://files.test/source.tar"]);
    }

    #[test]
    fn test_extension_must_end_the_url() {
        let result = categorize_urls(&["https://a.test/logo.png?size=2"]);
        assert!(result.get(UrlCategory::Images).is_empty());
        assert_eq!(result.uncategorized, vec!["https://a.test/logo.png?size=2"]);
    }

    #[test]
    fn test_keyword_categories_and_overlap() {
        let result = categorize_urls(&[
            "https://www.youtube.com/watch",
            "https://a.test/blog/shop-news",
            "https://a.test/about",
        ]);

        assert_eq!(result.get(UrlCategory::Social), ["https://www.youtube.com/watch"]);
        // one URL can land in several categories
        assert_eq!(result.get(UrlCategory::Ecommerce), ["https://a.test/blog/shop-news"]);
        assert_eq!(result.get(UrlCategory::Blog), ["https://a.test/blog/shop-news"]);
        assert_eq!(result.uncategorized, vec!["https://a.test/about"]);
    }

    #[test]
    fn test_keywords_need_word_boundaries() {
        let result = categorize_urls(&["https://a.test/shopping", "https://a.test/posters"]);
        assert!(result.categories.is_empty());
        assert_eq!(result.uncategorized.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        let result = categorize_urls::<&str>(&[]);
        assert_eq!(result, UrlCategories::default());
        assert_eq!(UrlCategory::Ecommerce.to_string(), "ecommerce");
    }
}

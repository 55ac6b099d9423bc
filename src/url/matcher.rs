use crate::UrlError;
use regex::{Regex, RegexBuilder};

/// A glob pattern compiled for matching whole URLs
///
/// Supported wildcards:
/// 1. `*` matches any run of characters, including none and including `/`
/// 2. `?` matches exactly one character
///
/// Every other character matches itself literally. Matching is anchored at
/// both ends and case-insensitive.
///
/// # Examples
///
/// ```
/// use skewer::url::UrlPattern;
///
/// let pattern = UrlPattern::new("https://example.com/blog/*").unwrap();
/// assert!(pattern.matches("https://example.com/blog/2024/post"));
/// assert!(pattern.matches("HTTPS://EXAMPLE.COM/blog/"));
/// assert!(!pattern.matches("https://example.com/shop/item"));
/// ```
#[derive(Debug, Clone)]
pub struct UrlPattern {
    glob: String,
    regex: Regex,
}

impl UrlPattern {
    /// Compiles a glob pattern
    pub fn new(glob: &str) -> Result<Self, UrlError> {
        let regex = RegexBuilder::new(&glob_to_regex(glob))
            .case_insensitive(true)
            .build()
            .map_err(|e| UrlError::InvalidPattern {
                pattern: glob.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            glob: glob.to_string(),
            regex,
        })
    }

    /// Returns true if the whole candidate matches the pattern
    pub fn matches(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }

    /// The glob this pattern was compiled from
    pub fn as_str(&self) -> &str {
        &self.glob
    }
}

/// Translates a glob into an anchored regular expression
fn glob_to_regex(glob: &str) -> String {
    let mut pattern = String::with_capacity(glob.len() + 8);
    pattern.push('^');

    let mut buf = [0u8; 4];
    for c in glob.chars() {
        match c {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            other => pattern.push_str(&regex::escape(other.encode_utf8(&mut buf))),
        }
    }

    pattern.push('$');
    pattern
}

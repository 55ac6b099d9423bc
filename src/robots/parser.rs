//! Per-origin robots.txt policy
//!
//! Rule matching is delegated to the `robotstxt` crate; this type only keeps
//! the fetched rules and decides which agent name they are matched against.

use robotstxt::DefaultMatcher;

/// The robots.txt rules of one origin
///
/// A policy without rules permits everything. That is what an origin gets
/// when its robots.txt is missing, unreachable or empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRobots {
    rules: Option<String>,
}

impl ParsedRobots {
    /// Wraps the body of a robots.txt file
    pub fn from_content(content: &str) -> Self {
        let rules = (!content.trim().is_empty()).then(|| content.to_string());
        Self { rules }
    }

    /// A policy that permits every URL
    pub fn allow_all() -> Self {
        Self { rules: None }
    }

    /// Returns true if no rule can ever deny a URL
    pub fn is_permissive(&self) -> bool {
        self.rules.is_none()
    }

    /// Checks whether `user_agent` may fetch `url`
    ///
    /// `user_agent` may be a full header value such as
    /// `Skewer/1.0 (+https://example.com)`; only its product token is matched
    /// against `User-agent` lines.
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        match &self.rules {
            None => true,
            Some(rules) => DefaultMatcher::default().one_agent_allowed_by_robots(
                rules,
                product_token(user_agent),
                url,
            ),
        }
    }
}

/// Returns the product token of a user agent string
///
/// `Skewer/1.0 (+https://example.com)` becomes `Skewer`.
pub fn product_token(user_agent: &str) -> &str {
    let trimmed = user_agent.trim();
    trimmed
        .split(|c: char| c == '/' || c.is_whitespace())
        .next()
        .filter(|token| !token.is_empty())
        .unwrap_or(trimmed)
}

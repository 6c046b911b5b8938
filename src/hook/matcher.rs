// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Absolute HTTP(S) URL recognition

use lazy_static::lazy_static;
use regex::Regex;

/// Pattern for absolute HTTP(S) URLs embedded in arbitrary text
pub const URL_PATTERN: &str = r#"(?i)https?://[^\s"'<>]+"#;

lazy_static! {
    static ref URL_REGEX: Regex = Regex::new(URL_PATTERN).expect("URL pattern compiles");
}

/// Finds URLs in text.
///
/// Matching is purely lexical: trailing punctuation stays in the match and
/// nothing is validated beyond the scheme prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlMatcher;

impl UrlMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Whether `text` contains at least one URL
    pub fn is_match(&self, text: &str) -> bool {
        URL_REGEX.is_match(text)
    }

    /// All URLs in `text`, left to right
    pub fn find_iter<'t>(&self, text: &'t str) -> impl Iterator<Item = &'t str> + 't {
        URL_REGEX.find_iter(text).map(|m| m.as_str())
    }

    pub fn first<'t>(&self, text: &'t str) -> Option<&'t str> {
        URL_REGEX.find(text).map(|m| m.as_str())
    }

    pub fn pattern(&self) -> &'static str {
        URL_PATTERN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_both_urls() {
        let matcher = UrlMatcher::new();
        let text = "see https://example.com/a and http://x.y/z?q=1 but not ftp://nope or plain words";
        let found: Vec<_> = matcher.find_iter(text).collect();
        assert_eq!(found, vec!["https://example.com/a", "http://x.y/z?q=1"]);
    }

    #[test]
    fn test_case_insensitive_scheme() {
        let matcher = UrlMatcher::new();
        assert_eq!(matcher.first("HTTPS://Example.COM/x"), Some("HTTPS://Example.COM/x"));
    }

    #[test]
    fn test_stops_at_quotes_and_brackets() {
        let matcher = UrlMatcher::new();
        let found: Vec<_> = matcher
            .find_iter(r#"fetch("https://a.test/1");var u='https://b.test/2'<br>"#)
            .collect();
        assert_eq!(found, vec!["https://a.test/1", "https://b.test/2"]);
    }

    #[test]
    fn test_trailing_punctuation_kept() {
        let matcher = UrlMatcher::new();
        assert_eq!(matcher.first("go to https://a.test/x."), Some("https://a.test/x."));
    }

    #[test]
    fn test_relative_urls_not_matched() {
        let matcher = UrlMatcher::new();
        assert!(!matcher.is_match("/api/data"));
        assert!(!matcher.is_match("//cdn.test/lib.js"));
        assert!(matcher.first("").is_none());
    }
}

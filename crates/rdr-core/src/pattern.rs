//! Pattern compilation.
//!
//! Turns a rule's pattern text plus its pattern-type flag into an
//! executable matcher. Wildcard patterns are translated into anchored
//! regexes where every `*` becomes a lazy capturing group; regex patterns
//! are used verbatim but anchored to the full URL. Both compile
//! case-insensitively, matching the enforcement collaborator's
//! `case_sensitive: false` descriptors.
//!
//! The anchored pattern text is kept alongside the compiled regex. The
//! static rule compiler hands that exact text to the declarative
//! enforcement mechanism, so the dynamic and static paths match the same
//! URLs. Only escapes, `(.*?)` groups and `^`/`$` anchors are emitted,
//! a subset valid in both the `regex` crate and the RE2 dialect the
//! enforcement mechanism speaks.

use serde::{Deserialize, Serialize};

use crate::error::PatternError;

/// How a rule's pattern text is interpreted.
///
/// Serialized as the storage format's one-letter codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PatternType {
    /// `*` matches any character sequence; everything else is literal.
    #[default]
    #[serde(rename = "W")]
    Wildcard,
    /// Pattern text is a regular expression.
    #[serde(rename = "R")]
    Regex,
}

/// A compiled, immutable matcher. Rebuilt whenever the source rule's
/// pattern text changes.
#[derive(Debug, Clone)]
pub struct CompiledMatcher {
    regex: regex::Regex,
    anchored: String,
}

impl CompiledMatcher {
    /// Run the matcher against a candidate URL.
    ///
    /// Returns the ordered capture list on a full match, `None` otherwise.
    /// Unmatched optional groups capture as the empty string.
    pub fn captures(&self, url: &str) -> Option<Vec<String>> {
        let caps = self.regex.captures(url)?;
        Some(
            caps.iter()
                .skip(1)
                .map(|group| group.map(|m| m.as_str().to_string()).unwrap_or_default())
                .collect(),
        )
    }

    /// Whether the matcher matches the whole URL.
    pub fn is_match(&self, url: &str) -> bool {
        self.regex.is_match(url)
    }

    /// The anchored, flag-free pattern text used for matching.
    pub fn as_anchored_pattern(&self) -> &str {
        &self.anchored
    }
}

/// Compile pattern text into a matcher.
pub fn compile(pattern: &str, pattern_type: PatternType) -> Result<CompiledMatcher, PatternError> {
    let anchored = match pattern_type {
        PatternType::Wildcard => wildcard_to_regex(pattern),
        // The non-capturing wrapper preserves the author's capture indices.
        PatternType::Regex => format!("^(?:{pattern})$"),
    };

    let regex = regex::RegexBuilder::new(&anchored)
        .case_insensitive(true)
        .build()
        .map_err(|source| PatternError::InvalidRegex {
            pattern: pattern.to_string(),
            source: Box::new(source),
        })?;

    Ok(CompiledMatcher { regex, anchored })
}

/// Translate a wildcard pattern into anchored regex text.
///
/// Literal segments are escaped; each run of consecutive `*` collapses to
/// a single lazy capturing group. A pattern without `*` matches only the
/// exact literal URL.
fn wildcard_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');

    let mut literal = String::new();
    let mut chars = pattern.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '*' {
            if !literal.is_empty() {
                out.push_str(&regex::escape(&literal));
                literal.clear();
            }
            while chars.peek() == Some(&'*') {
                chars.next();
            }
            out.push_str("(.*?)");
        } else {
            literal.push(ch);
        }
    }
    if !literal.is_empty() {
        out.push_str(&regex::escape(&literal));
    }

    out.push('$');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_translation() {
        assert_eq!(
            wildcard_to_regex("http://example.com/*"),
            "^http://example\\.com/(.*?)$"
        );
        assert_eq!(wildcard_to_regex("no-stars"), "^no\\-stars$");
    }

    #[test]
    fn test_wildcard_captures_replaced_text() {
        let m = compile("http://example.com/*", PatternType::Wildcard).unwrap();
        let caps = m.captures("http://example.com/cats").unwrap();
        assert_eq!(caps, vec!["cats".to_string()]);
    }

    #[test]
    fn test_wildcard_is_anchored() {
        let m = compile("http://example.com/*", PatternType::Wildcard).unwrap();
        assert!(m.captures("http://example.org/cats").is_none());
        assert!(m.captures("xhttp://example.com/cats").is_none());
    }

    #[test]
    fn test_wildcard_without_star_is_exact() {
        let m = compile("http://example.com/page", PatternType::Wildcard).unwrap();
        assert_eq!(m.captures("http://example.com/page"), Some(vec![]));
        assert!(m.captures("http://example.com/page2").is_none());
    }

    #[test]
    fn test_consecutive_stars_collapse() {
        let m = compile("http://a.com/**b", PatternType::Wildcard).unwrap();
        let caps = m.captures("http://a.com/xyzb").unwrap();
        assert_eq!(caps, vec!["xyz".to_string()]);
        assert_eq!(
            wildcard_to_regex("http://a.com/**b"),
            "^http://a\\.com/(.*?)b$"
        );
    }

    #[test]
    fn test_multiple_wildcards() {
        let m = compile("*://www.*.com/*", PatternType::Wildcard).unwrap();
        let caps = m.captures("https://www.example.com/path?q=1").unwrap();
        assert_eq!(caps, vec!["https", "example", "path?q=1"]);
    }

    #[test]
    fn test_lazy_groups_take_shortest_expansion() {
        let m = compile("http://*/*", PatternType::Wildcard).unwrap();
        let caps = m.captures("http://host/a/b").unwrap();
        // First group stops at the earliest '/' consistent with a full match.
        assert_eq!(caps, vec!["host", "a/b"]);
    }

    #[test]
    fn test_case_insensitive_match() {
        let m = compile("http://Example.COM/*", PatternType::Wildcard).unwrap();
        assert!(m.is_match("HTTP://example.com/x"));
    }

    #[test]
    fn test_regex_pattern_verbatim() {
        let m = compile(r"^http://foo\.com/(a|b)$", PatternType::Regex).unwrap();
        assert_eq!(m.captures("http://foo.com/a").unwrap(), vec!["a"]);
        assert!(m.captures("http://foo.com/c").is_none());
    }

    #[test]
    fn test_regex_anchoring_rejects_substring_match() {
        let m = compile(r"foo\.com/(\d+)", PatternType::Regex).unwrap();
        assert!(m.captures("http://foo.com/123").is_none());
        assert_eq!(m.captures("foo.com/123").unwrap(), vec!["123"]);
    }

    #[test]
    fn test_invalid_regex_reports_pattern() {
        let err = compile("http://foo.com/(", PatternType::Regex).unwrap_err();
        let PatternError::InvalidRegex { pattern, .. } = err;
        assert_eq!(pattern, "http://foo.com/(");
    }

    #[test]
    fn test_pattern_type_serde_codes() {
        let t: PatternType = serde_json::from_str("\"W\"").unwrap();
        assert_eq!(t, PatternType::Wildcard);
        let t: PatternType = serde_json::from_str("\"R\"").unwrap();
        assert_eq!(t, PatternType::Regex);
    }
}

//! Url-filter validation
//!
//! Content-blocking engines accept a small regular-expression dialect:
//! literals, `.`, `?`, `+`, `*`, character classes, groups and the `^`/`$`
//! anchors. No alternation, no counted repetition and no class escapes such
//! as `\d` or backreferences such as `\1`.

use regex::RegexBuilder;

use crate::syntax::SupportedSyntax;

/// True if `pattern` can be handed to the engine as a `url-filter`.
///
/// The empty pattern is valid; callers substitute a default for it.
pub fn is_valid_url_filter(pattern: &str, syntax: &SupportedSyntax) -> bool {
    pattern.is_ascii()
        && !syntax.has_forbidden_char(pattern)
        && is_portable(pattern)
        && compiles(pattern)
}

/// Rejects constructs outside the portable subset.
fn is_portable(pattern: &str) -> bool {
    let bytes = pattern.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => match bytes.get(i + 1) {
                // escaped punctuation is a literal
                Some(next) if !next.is_ascii_alphanumeric() => i += 2,
                _ => return false,
            },
            b'{' | b'}' => return false,
            _ => i += 1,
        }
    }
    true
}

fn compiles(pattern: &str) -> bool {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid(pattern: &str) -> bool {
        is_valid_url_filter(pattern, &SupportedSyntax::default())
    }

    #[test]
    fn test_accepts_plain_patterns() {
        assert!(valid("ads.example.com"));
        assert!(valid("/banner/ads/"));
        assert!(valid("^https?://"));
        assert!(valid("&ad_type="));
        assert!(valid("-ad-banner\\."));
        assert!(valid("[a-z]+track\\/pixel"));
        assert!(valid(""));
    }

    #[test]
    fn test_rejects_forbidden_chars() {
        assert!(!valid("ads*banner"));
        assert!(!valid("ads|banner"));
    }

    #[test]
    fn test_rejects_non_ascii() {
        assert!(!valid("werbung-ü.de"));
        assert!(!valid("广告/banner"));
    }

    #[test]
    fn test_rejects_engine_specific_escapes() {
        assert!(!valid("ad\\d+"));
        assert!(!valid("(ad)\\1"));
        assert!(!valid("\\bads"));
        assert!(!valid("trailing\\"));
    }

    #[test]
    fn test_rejects_counted_repetition() {
        assert!(!valid("a{2,3}"));
        assert!(!valid("ad{"));
    }

    #[test]
    fn test_rejects_invalid_regex() {
        assert!(!valid("(unclosed"));
        assert!(!valid("[unclosed"));
        assert!(!valid("+leading"));
    }
}

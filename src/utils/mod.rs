//! Utility functions and helpers.

pub mod http;

use scraper::Selector;

use crate::error::{AppError, Result};

/// Parse a CSS selector, mapping failures to [`AppError::Selector`].
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Make a string safe to use inside a single path segment.
///
/// Every character that is not alphanumeric, a space or an underscore
/// becomes `_`.
pub fn sanitize_segment(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == ' ' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Collapse runs of whitespace into single spaces.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selector_valid() {
        assert!(parse_selector("table.league-ladder__entries").is_ok());
        assert!(parse_selector("tbody tr").is_ok());
    }

    #[test]
    fn test_parse_selector_invalid() {
        assert!(parse_selector("[[invalid").is_err());
    }

    #[test]
    fn test_sanitize_segment() {
        assert_eq!(sanitize_segment("Foo#1234"), "Foo_1234");
        assert_eq!(sanitize_segment("My Char_Name"), "My Char_Name");
        assert_eq!(sanitize_segment("a/b\\c:d.e"), "a_b_c_d_e");
        assert_eq!(sanitize_segment("Überläufer"), "Überläufer");
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a \n\t b  "), "a b");
    }
}

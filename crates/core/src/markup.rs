//! Inline `**bold**` / `*italic*` markup used in bullet text.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Non-greedy bold span first, then italic span, on a single line.
static MARKUP_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*.*?\*\*|\*.*?\*").unwrap());

/// A piece of text with uniform emphasis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyledSpan {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
}

impl StyledSpan {
    /// Unstyled text.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
            italic: false,
        }
    }

    /// Bold text.
    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            bold: true,
            ..Self::plain(text)
        }
    }

    /// Italic text.
    pub fn italic(text: impl Into<String>) -> Self {
        Self {
            italic: true,
            ..Self::plain(text)
        }
    }
}

/// Split `text` into styled spans, consuming the delimiters.
///
/// Empty spans are dropped, so `"**"` or `"a ** b"` never produce an empty
/// run. Unbalanced single asterisks are left as literal text.
pub fn parse_markup(text: &str) -> Vec<StyledSpan> {
    let mut spans = Vec::new();
    let mut last = 0;

    for m in MARKUP_REGEX.find_iter(text) {
        if m.start() > last {
            spans.push(StyledSpan::plain(&text[last..m.start()]));
        }

        let token = m.as_str();
        let span = if token.len() >= 4 && token.starts_with("**") && token.ends_with("**") {
            StyledSpan::bold(&token[2..token.len() - 2])
        } else {
            StyledSpan::italic(&token[1..token.len() - 1])
        };
        if !span.text.is_empty() {
            spans.push(span);
        }

        last = m.end();
    }

    if last < text.len() {
        spans.push(StyledSpan::plain(&text[last..]));
    }

    spans
}

/// Text with all markup delimiters removed.
pub fn strip_markup(text: &str) -> String {
    parse_markup(text).into_iter().map(|s| s.text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bold_and_italic() {
        assert_eq!(
            parse_markup("**A** and *B*"),
            vec![
                StyledSpan::bold("A"),
                StyledSpan::plain(" and "),
                StyledSpan::italic("B"),
            ]
        );
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(parse_markup("no markup"), vec![StyledSpan::plain("no markup")]);
        assert!(parse_markup("").is_empty());
    }

    #[test]
    fn test_leading_bold() {
        assert_eq!(
            parse_markup("**Point** one"),
            vec![StyledSpan::bold("Point"), StyledSpan::plain(" one")]
        );
    }

    #[test]
    fn test_empty_delimiters_dropped() {
        assert_eq!(
            parse_markup("a ** b"),
            vec![StyledSpan::plain("a "), StyledSpan::plain(" b")]
        );
    }

    #[test]
    fn test_unbalanced_asterisk_kept() {
        assert_eq!(parse_markup("5 * 3"), vec![StyledSpan::plain("5 * 3")]);
    }

    #[test]
    fn test_no_literal_asterisks_remain() {
        let text = "Use **cloud** for *scale* and **cost**";
        assert!(!strip_markup(text).contains('*'));
        assert_eq!(strip_markup(text), "Use cloud for scale and cost");
    }
}

//! Lenient clean-up of "almost JSON" knowledge files.
//!
//! Hand-edited knowledge bases tend to carry `//` notes, `/* */` blocks and
//! trailing commas. Both passes match string literals first and hand them
//! back untouched, so text that is already strict JSON comes out unchanged.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)"(?:[^"\\]|\\.)*"|/\*.*?\*/|//[^\r\n]*"#).expect("comment pattern is valid")
});

static TRAILING_COMMA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)"(?:[^"\\]|\\.)*"|,(\s*[}\]])"#).expect("trailing comma pattern is valid")
});

/// Strips comments and trailing commas. Total over any input; does not
/// check that the result is JSON.
pub fn normalize(raw: &str) -> String {
    let without_comments = strip_comments(raw);
    strip_trailing_commas(&without_comments)
}

fn strip_comments(text: &str) -> String {
    COMMENT_RE
        .replace_all(text, |caps: &Captures| {
            let matched = &caps[0];
            if matched.starts_with('"') {
                matched.to_string()
            } else {
                String::new()
            }
        })
        .into_owned()
}

fn strip_trailing_commas(text: &str) -> String {
    TRAILING_COMMA_RE
        .replace_all(text, |caps: &Captures| match caps.get(1) {
            // keep the whitespace and the closing bracket, drop the comma
            Some(closing) => closing.as_str().to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

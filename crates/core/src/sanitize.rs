//! Recovery of a slide outline from raw model output.
//!
//! Models wrap the requested JSON array in commentary and get escaping
//! wrong. The sanitizer cuts out the outermost array, repairs the two
//! mistakes seen most often (stray backslashes, trailing commas) and hands
//! the result to the lenient parser.

use crate::lenient;
use crate::types::Outline;
use crate::{Error, Result};
use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;
use std::sync::LazyLock;

/// Greedy match from the first `[` to the last `]`.
static ARRAY_SPAN_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\[.*\]").unwrap());

/// A comma followed only by whitespace before a closing bracket or brace.
static TRAILING_COMMA_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[\]\}])").unwrap());

/// Characters that may follow a backslash in a recognized escape.
const ESCAPE_CHARS: &[char] = &['"', '\'', '\\', '/', 'b', 'f', 'n', 'r', 't'];

/// Locate the outermost bracketed span in `text`.
pub fn extract_array(text: &str) -> Result<&str> {
    ARRAY_SPAN_REGEX
        .find(text)
        .map(|m| m.as_str())
        .ok_or_else(|| Error::OutlineParse("could not find a JSON array in model output".to_string()))
}

/// Double every backslash that does not start a recognized escape sequence.
pub fn escape_stray_backslashes(json: &str) -> String {
    let chars: Vec<char> = json.chars().collect();
    let mut output = String::with_capacity(json.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c != '\\' {
            output.push(c);
            i += 1;
            continue;
        }

        match chars.get(i + 1) {
            Some(&next) if ESCAPE_CHARS.contains(&next) => {
                output.push('\\');
                output.push(next);
                i += 2;
            }
            Some('u') if is_unicode_escape(&chars[i + 2..]) => {
                output.push_str("\\u");
                i += 2;
            }
            _ => {
                output.push_str("\\\\");
                i += 1;
            }
        }
    }

    output
}

fn is_unicode_escape(rest: &[char]) -> bool {
    rest.len() >= 4 && rest[..4].iter().all(|c| c.is_ascii_hexdigit())
}

/// Remove commas that directly precede `]` or `}`.
pub fn strip_trailing_commas(json: &str) -> Cow<'_, str> {
    TRAILING_COMMA_REGEX.replace_all(json, "$1")
}

/// Extract, repair and parse the JSON array embedded in `text`.
pub fn sanitize_json(text: &str) -> Result<Vec<Value>> {
    let span = extract_array(text)?;
    let escaped = escape_stray_backslashes(span);
    let repaired = strip_trailing_commas(&escaped);

    let value = lenient::parse(&repaired)
        .map_err(|e| Error::OutlineParse(format!("failed to parse model JSON: {}", e)))?;

    match value {
        Value::Array(items) => Ok(items),
        other => Err(Error::OutlineParse(format!(
            "model output is not a JSON array (found {})",
            json_kind(&other)
        ))),
    }
}

/// Recover a full [`Outline`] from raw model output.
pub fn parse_outline(text: &str) -> Result<Outline> {
    let entries = sanitize_json(text)?;
    log::debug!("Recovered {} outline entries from model output", entries.len());
    Outline::from_entries(entries)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

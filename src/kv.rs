//! Parser for loosely formatted `key:value` lists.
//!
//! Upstream text (AI output, hand-edited exports) often arrives as
//! `["出荷日:2025/07/10","受注番号:1002889"]` or the unquoted variant
//! `[出荷日:2025/07/10, 受注番号:1002889]`. Both become a plain mapping.

use crate::statics;
use crate::value::strip_one_quote;
use serde_json::{Map, Value};

/// Parses `text` into a mapping, or `None` when no key could be captured.
///
/// A JSON object is returned as-is. A JSON array contributes one token per
/// string element. Text that is not JSON is split on commas outside double
/// quotes after removing one layer of enclosing brackets.
pub fn parse_key_value_list(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        Ok(Value::Array(items)) => {
            let tokens = items.iter().filter_map(Value::as_str);
            collect_tokens(tokens)
        }
        Ok(_) => None,
        Err(_) => {
            let body = strip_outer_brackets(text);
            let tokens = split_unquoted_commas(body)
                .into_iter()
                .map(|part| strip_one_quote(part.trim()))
                .filter(|part| !part.is_empty());
            collect_tokens(tokens)
        }
    }
}

fn collect_tokens<'a>(tokens: impl Iterator<Item = &'a str>) -> Option<Map<String, Value>> {
    let mut out = Map::new();
    for token in tokens {
        if let Some((key, value)) = split_token(token) {
            out.insert(key.to_string(), Value::String(value.to_string()));
        }
    }
    (!out.is_empty()).then_some(out)
}

/// Splits one `key<sep>value` token at the first separator.
fn split_token(token: &str) -> Option<(&str, &str)> {
    let token = strip_one_quote(token.trim());
    let (pos, sep) = token
        .char_indices()
        .find(|(_, c)| statics::KV_SEPARATORS.contains(c))?;

    let key = strip_one_quote(token[..pos].trim()).trim();
    let value = strip_one_quote(token[pos + sep.len_utf8()..].trim()).trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value))
}

fn strip_outer_brackets(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(text)
}

/// Splits on commas followed by an even number of double quotes, i.e. commas
/// outside any quoted segment.
fn split_unquoted_commas(body: &str) -> Vec<&str> {
    let total_quotes = body.matches('"').count();
    let mut seen_quotes = 0usize;
    let mut parts = Vec::new();
    let mut start = 0usize;

    for (i, c) in body.char_indices() {
        match c {
            '"' => seen_quotes += 1,
            ',' if (total_quotes - seen_quotes) % 2 == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts
}

//! Turning model output into a record.
//!
//! The model is told to answer with JSON only, but it sometimes wraps the
//! object in prose or a code fence. Recovery runs in stages and stops at the
//! first one that yields a JSON object:
//!
//! 1. the whole text;
//! 2. the outermost `{ ... }` span (first `{` to last `}`);
//! 3. each balanced top-level brace span, in order of appearance.
//!
//! Stage 2 assumes a single embedded object. Stage 3 catches the cases it
//! gets wrong, such as two fragments or a stray `}` in trailing prose.

use crate::{error::ExtractError, record::ReceiptRecord};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use tracing::debug;

fn outer_span_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("static regex"))
}

pub fn recover(raw: &str) -> Result<ReceiptRecord, ExtractError> {
    if let Some(obj) = parse_object(raw) {
        return Ok(ReceiptRecord::from_map(obj));
    }

    if let Some(span) = outer_span_re().find(raw) {
        if let Some(obj) = parse_object(span.as_str()) {
            debug!("recovered JSON from outermost brace span");
            return Ok(ReceiptRecord::from_map(obj));
        }
    }

    for span in balanced_spans(raw) {
        if let Some(obj) = parse_object(span) {
            debug!("recovered JSON from balanced brace span");
            return Ok(ReceiptRecord::from_map(obj));
        }
    }

    Err(ExtractError::Format {
        raw: raw.to_string(),
    })
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Top-level `{ ... }` spans whose braces balance, ignoring braces inside
/// JSON string literals.
pub fn balanced_spans(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    spans.push(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    spans
}

//! Response snapshot captured after each execution.
//!
//! # Design
//! The body is a sum type rather than one field that silently changes shape
//! when JSON decoding is armed: callers match on `Raw` or `Json`, and the
//! raw bytes stay reachable either way through `Response::raw`.

use std::path::PathBuf;

use serde::Deserialize;

use crate::engine::TransferInfo;

/// Default nesting bound for JSON decoding.
pub const DEFAULT_JSON_DEPTH: usize = 512;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResponseBody {
    /// Nothing has executed since construction or the last reset.
    #[default]
    Empty,
    Raw(Vec<u8>),
    Json(serde_json::Value),
    /// The body was streamed to this file instead of being buffered.
    Saved(PathBuf),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    pub body: ResponseBody,
    /// Undecoded body bytes; empty for downloads.
    pub raw: Vec<u8>,
    pub status: u32,
    /// Received header lines in arrival order, status lines included.
    pub headers: Vec<String>,
    pub info: TransferInfo,
}

impl Response {
    /// Raw body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.raw).into_owned()
    }

    pub fn json(&self) -> Option<&serde_json::Value> {
        match &self.body {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Value of the first `name: value` header line, name compared
    /// case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim().eq_ignore_ascii_case(name).then(|| value.trim())
        })
    }
}

/// Decode `raw` as JSON when its nesting stays within `depth`.
///
/// Scalars have depth 1; each array or object adds one level. Documents
/// whose brackets already nest deeper than `depth` are refused before
/// parsing, so parser recursion is bounded by `depth` too.
pub fn decode_json(raw: &[u8], depth: usize) -> Option<serde_json::Value> {
    if bracket_depth(raw) > depth {
        tracing::warn!(depth, "response JSON exceeds nesting depth");
        return None;
    }
    let mut deserializer = serde_json::Deserializer::from_slice(raw);
    deserializer.disable_recursion_limit();
    let parsed = serde_json::Value::deserialize(&mut deserializer)
        .and_then(|value| deserializer.end().map(|()| value));
    let value = match parsed {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(%err, "response body is not valid JSON");
            return None;
        }
    };
    if nesting(&value) > depth {
        tracing::warn!(depth, "response JSON exceeds nesting depth");
        return None;
    }
    Some(value)
}

/// Deepest array/object nesting, ignoring brackets inside strings.
fn bracket_depth(raw: &[u8]) -> usize {
    let (mut depth, mut max) = (0usize, 0usize);
    let (mut in_string, mut escaped) = (false, false);
    for &byte in raw {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                max = max.max(depth);
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    max
}

fn nesting(value: &serde_json::Value) -> usize {
    match value {
        serde_json::Value::Array(items) => 1 + items.iter().map(nesting).max().unwrap_or(0),
        serde_json::Value::Object(map) => 1 + map.values().map(nesting).max().unwrap_or(0),
        _ => 1,
    }
}

//! Plain-data request vocabulary: methods, content types, targets and bodies.
//!
//! # Design
//! These types describe what the caller wants sent, independent of the
//! engine. All fields use owned types so a request snapshot can be kept on
//! the client after execution and read back by the caller.

use std::fmt;

/// HTTP method for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    /// Any other verb, sent verbatim as a custom request.
    Custom(String),
}

impl Method {
    /// Normalize a verb string; well-known verbs map to their variant.
    pub fn parse(verb: &str) -> Self {
        match verb.to_ascii_uppercase().as_str() {
            "GET" => Method::Get,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "PATCH" => Method::Patch,
            "DELETE" => Method::Delete,
            "OPTIONS" => Method::Options,
            other => Method::Custom(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
            Method::Custom(verb) => verb,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body encoding scheme understood by the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentType {
    #[default]
    Urlencoded,
    FormData,
    Json,
    Xml,
    Text,
}

impl ContentType {
    /// Value sent in the `Content-Type` header for this scheme.
    pub fn header_value(self) -> &'static str {
        match self {
            ContentType::Urlencoded => "application/x-www-form-urlencoded",
            ContentType::FormData => "multipart/form-data",
            ContentType::Json => "application/json",
            ContentType::Xml => "application/xml",
            ContentType::Text => "text/plain",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header_value())
    }
}

/// Where a request goes: a URL string, or a base URL plus query params
/// that are appended when the URL is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub base: String,
    pub params: Vec<(String, String)>,
}

impl Target {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }
}

impl From<&str> for Target {
    fn from(url: &str) -> Self {
        Target::new(url)
    }
}

impl From<String> for Target {
    fn from(url: String) -> Self {
        Target::new(url)
    }
}

impl From<&String> for Target {
    fn from(url: &String) -> Self {
        Target::new(url.as_str())
    }
}

impl<B, K, V, const N: usize> From<(B, [(K, V); N])> for Target
where
    B: Into<String>,
    K: Into<String>,
    V: Into<String>,
{
    fn from((base, params): (B, [(K, V); N])) -> Self {
        Self {
            base: base.into(),
            params: params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Request payload as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Body {
    #[default]
    Empty,
    /// Wire-ready text, sent unchanged whatever the content type.
    Raw(String),
    /// Ordered string fields; the content type decides their encoding.
    Fields(Vec<(String, String)>),
    /// A structured JSON document.
    Json(serde_json::Value),
}

impl Body {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Body::Empty => "empty",
            Body::Raw(_) => "raw",
            Body::Fields(_) => "field",
            Body::Json(_) => "json",
        }
    }
}

impl From<()> for Body {
    fn from(_: ()) -> Self {
        Body::Empty
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Raw(text.to_string())
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Raw(text)
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Body::Json(value)
    }
}

impl<K: Into<String>, V: Into<String>> From<Vec<(K, V)>> for Body {
    fn from(fields: Vec<(K, V)>) -> Self {
        Body::Fields(fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Body {
    fn from(fields: [(K, V); N]) -> Self {
        Body::Fields(fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

//! Request builder state accumulated by the fluent client.
//!
//! # Design
//! `Request` is a snapshot of everything configured on a client: headers and
//! cookies keep insertion order (wire order) with last-write-wins on a
//! repeated key, and upload attachments are merged with data fields only
//! when a POST is encoded.

use std::path::PathBuf;

use crate::encode::{encode_body, FormPart, Payload};
use crate::error::{Error, Result};
use crate::http::{Body, ContentType, Method};

#[derive(Debug, Clone, Default)]
pub struct Request {
    pub method: Option<Method>,
    /// Fully resolved URL of the last request, query params merged.
    pub url: Option<String>,
    pub headers: Vec<(String, String)>,
    pub cookies: Vec<(String, String)>,
    pub body: Body,
    /// Field name to file path.
    pub uploads: Vec<(String, PathBuf)>,
    pub content_type: ContentType,
    pub user_agent: Option<String>,
}

fn upsert(entries: &mut Vec<(String, String)>, key: &str, value: String) {
    match entries.iter_mut().find(|(k, _)| k == key) {
        Some(entry) => entry.1 = value,
        None => entries.push((key.to_string(), value)),
    }
}

impl Request {
    /// Insert or replace a header. Keys compare case-sensitively.
    pub fn set_header(&mut self, key: &str, value: impl Into<String>) {
        upsert(&mut self.headers, key, value.into());
    }

    pub fn remove_header(&mut self, key: &str) {
        self.headers.retain(|(k, _)| k != key);
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Header lines in wire order, `Key: value`.
    pub fn header_lines(&self) -> Vec<String> {
        self.headers.iter().map(|(k, v)| format!("{k}: {v}")).collect()
    }

    pub fn set_cookie(&mut self, key: &str, value: impl Into<String>) {
        upsert(&mut self.cookies, key, value.into());
    }

    /// The whole jar as one `Cookie` value, `k=v; k2=v2`, or `None` when
    /// no cookie is set.
    pub fn cookie_line(&self) -> Result<Option<String>> {
        if self.cookies.is_empty() {
            return Ok(None);
        }
        let pairs = self
            .cookies
            .iter()
            .map(|pair| serde_urlencoded::to_string(std::slice::from_ref(pair)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(pairs.join("; ")))
    }

    pub fn add_upload(&mut self, field: &str, path: impl Into<PathBuf>) {
        let path = path.into();
        match self.uploads.iter_mut().find(|(k, _)| k == field) {
            Some(entry) => entry.1 = path,
            None => self.uploads.push((field.to_string(), path)),
        }
    }

    /// Switch the encoding scheme and push its header.
    ///
    /// Form-data drops any explicit `Content-Type`: the engine writes that
    /// header itself because it must carry the multipart boundary.
    pub fn set_content_type(&mut self, content_type: ContentType) {
        self.content_type = content_type;
        match content_type {
            ContentType::FormData => self.remove_header("Content-Type"),
            other => self.set_header("Content-Type", other.header_value()),
        }
    }

    /// Encode `body` for `method` under the current content type.
    ///
    /// A POST with registered uploads becomes multipart: attachments first,
    /// then data fields, where a data field replaces an attachment of the
    /// same name in place.
    pub fn payload(&self, method: &Method, body: &Body) -> Result<Payload> {
        if *method != Method::Post || self.uploads.is_empty() {
            return encode_body(body, self.content_type);
        }
        let mut parts: Vec<FormPart> = self
            .uploads
            .iter()
            .map(|(field, path)| FormPart::file(field, path))
            .collect();
        let fields = match body {
            Body::Empty => &[][..],
            Body::Fields(fields) => fields.as_slice(),
            other => {
                return Err(Error::InvalidRequestBody {
                    content_type: ContentType::FormData,
                    body: other.kind(),
                })
            }
        };
        for (name, value) in fields {
            let part = FormPart::text(name, value);
            match parts.iter_mut().find(|p| p.name == *name) {
                Some(existing) => *existing = part,
                None => parts.push(part),
            }
        }
        Ok(Payload::Form(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::PartValue;

    #[test]
    fn set_header_upserts_without_growing() {
        let mut request = Request::default();
        request.set_header("X-A", "1");
        request.set_header("X-B", "2");
        request.set_header("X-A", "3");
        assert_eq!(request.headers.len(), 2);
        assert_eq!(request.header_lines(), vec!["X-A: 3", "X-B: 2"]);
    }

    #[test]
    fn header_keys_are_case_sensitive() {
        let mut request = Request::default();
        request.set_header("x-a", "1");
        request.set_header("X-A", "2");
        assert_eq!(request.headers.len(), 2);
    }

    #[test]
    fn cookie_line_joins_and_encodes() {
        let mut request = Request::default();
        assert_eq!(request.cookie_line().unwrap(), None);
        request.set_cookie("a", "b");
        request.set_cookie("c", "d e");
        request.set_cookie("a", "z");
        assert_eq!(request.cookie_line().unwrap().as_deref(), Some("a=z; c=d+e"));
    }

    #[test]
    fn content_type_pushes_header() {
        let mut request = Request::default();
        request.set_content_type(ContentType::Json);
        assert_eq!(request.header("Content-Type"), Some("application/json"));
        request.set_content_type(ContentType::FormData);
        assert_eq!(request.header("Content-Type"), None);
        assert_eq!(request.content_type, ContentType::FormData);
    }

    #[test]
    fn post_with_uploads_merges_data_over_attachments() {
        let mut request = Request::default();
        request.add_upload("file", "/tmp/a.txt");
        request.add_upload("avatar", "/tmp/b.png");
        let body = Body::from([("avatar", "none"), ("name", "grass")]);
        let payload = request.payload(&Method::Post, &body).unwrap();
        let Payload::Form(parts) = payload else {
            panic!("expected multipart");
        };
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].value, PartValue::File("/tmp/a.txt".into()));
        assert_eq!(parts[1], FormPart::text("avatar", "none"));
        assert_eq!(parts[2], FormPart::text("name", "grass"));
    }

    #[test]
    fn uploads_are_ignored_outside_post() {
        let mut request = Request::default();
        request.add_upload("file", "/tmp/a.txt");
        let payload = request.payload(&Method::Put, &Body::from([("a", "b")])).unwrap();
        assert_eq!(payload, Payload::Bytes(b"a=b".to_vec()));
    }

    #[test]
    fn uploads_reject_raw_body() {
        let mut request = Request::default();
        request.add_upload("file", "/tmp/a.txt");
        assert!(request.payload(&Method::Post, &Body::from("raw")).is_err());
    }
}

//! Body encoding per content type.
//!
//! Raw text always passes through. Structured fields are urlencoded,
//! serialized as a JSON object, or handed to the engine as multipart parts;
//! xml and text have no field encoding and reject them.

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::http::{Body, ContentType};

/// Wire-ready body handed to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    None,
    Bytes(Vec<u8>),
    /// Multipart parts; the engine performs the multipart encoding.
    Form(Vec<FormPart>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: String,
    pub value: PartValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartValue {
    Text(String),
    File(PathBuf),
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: PartValue::Text(value.into()),
        }
    }

    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            value: PartValue::File(path.into()),
        }
    }
}

/// Encode `body` for transmission under `content_type`.
pub fn encode_body(body: &Body, content_type: ContentType) -> Result<Payload> {
    match (body, content_type) {
        (Body::Empty, _) => Ok(Payload::None),
        (Body::Raw(text), _) => Ok(Payload::Bytes(text.clone().into_bytes())),
        (Body::Fields(fields), ContentType::Urlencoded) => {
            Ok(Payload::Bytes(serde_urlencoded::to_string(fields)?.into_bytes()))
        }
        (Body::Fields(fields), ContentType::Json) => {
            let object: serde_json::Map<String, serde_json::Value> = fields
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect();
            Ok(Payload::Bytes(serde_json::to_vec(&object)?))
        }
        (Body::Fields(fields), ContentType::FormData) => Ok(Payload::Form(
            fields.iter().map(|(k, v)| FormPart::text(k, v)).collect(),
        )),
        (Body::Json(value), ContentType::Json) => Ok(Payload::Bytes(serde_json::to_vec(value)?)),
        (body, content_type) => Err(Error::InvalidRequestBody {
            content_type,
            body: body.kind(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> Body {
        Body::from([("a", "b"), ("c", "d")])
    }

    #[test]
    fn raw_text_passes_through_every_content_type() {
        for content_type in [
            ContentType::Urlencoded,
            ContentType::FormData,
            ContentType::Json,
            ContentType::Xml,
            ContentType::Text,
        ] {
            let payload = encode_body(&Body::from("a=b&c=d"), content_type).unwrap();
            assert_eq!(payload, Payload::Bytes(b"a=b&c=d".to_vec()), "{content_type}");
        }
    }

    #[test]
    fn fields_urlencode() {
        let payload = encode_body(&fields(), ContentType::Urlencoded).unwrap();
        assert_eq!(payload, Payload::Bytes(b"a=b&c=d".to_vec()));
    }

    #[test]
    fn fields_become_json_object() {
        let Payload::Bytes(bytes) = encode_body(&fields(), ContentType::Json).unwrap() else {
            panic!("expected bytes");
        };
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value, serde_json::json!({"a": "b", "c": "d"}));
    }

    #[test]
    fn fields_become_form_parts() {
        let payload = encode_body(&fields(), ContentType::FormData).unwrap();
        assert_eq!(
            payload,
            Payload::Form(vec![FormPart::text("a", "b"), FormPart::text("c", "d")])
        );
    }

    #[test]
    fn fields_have_no_xml_encoding() {
        let err = encode_body(&fields(), ContentType::Xml).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidRequestBody { content_type: ContentType::Xml, body: "field" }
        ));
    }

    #[test]
    fn json_value_requires_json_content_type() {
        let body = Body::from(serde_json::json!({"n": 1}));
        assert_eq!(
            encode_body(&body, ContentType::Json).unwrap(),
            Payload::Bytes(br#"{"n":1}"#.to_vec())
        );
        assert!(encode_body(&body, ContentType::Urlencoded).is_err());
    }

    #[test]
    fn empty_body_encodes_to_nothing() {
        assert_eq!(encode_body(&Body::Empty, ContentType::Text).unwrap(), Payload::None);
    }
}

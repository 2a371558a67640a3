//! Verify URL building and body encoding against JSON vectors in `test-vectors/`.
//!
//! JSON bodies are compared as parsed values, not raw strings, so key order
//! in the encoder output does not matter.

use fluent_curl::{build_url, encode_body, Body, ContentType, Error, FormPart, Payload, Target};
use serde_json::Value;

fn pairs(value: &Value) -> Vec<(String, String)> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|pair| {
            let pair = pair.as_array().unwrap();
            (pair[0].as_str().unwrap().to_string(), pair[1].as_str().unwrap().to_string())
        })
        .collect()
}

fn parse_content_type(s: &str) -> ContentType {
    match s {
        "urlencoded" => ContentType::Urlencoded,
        "form_data" => ContentType::FormData,
        "json" => ContentType::Json,
        "xml" => ContentType::Xml,
        "text" => ContentType::Text,
        other => panic!("unknown content type: {other}"),
    }
}

fn parse_body(value: &Value) -> Body {
    let (kind, inner) = value.as_object().unwrap().iter().next().unwrap();
    match kind.as_str() {
        "empty" => Body::Empty,
        "raw" => Body::Raw(inner.as_str().unwrap().to_string()),
        "fields" => Body::Fields(pairs(inner)),
        "json" => Body::Json(inner.clone()),
        other => panic!("unknown body kind: {other}"),
    }
}

// ---------------------------------------------------------------------------
// URL building
// ---------------------------------------------------------------------------

#[test]
fn build_url_vectors() {
    let raw = include_str!("../../test-vectors/build_url.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let target = Target {
            base: case["base"].as_str().unwrap().to_string(),
            params: pairs(&case["params"]),
        };
        let url = build_url(&target).unwrap();
        assert_eq!(url, case["expected"].as_str().unwrap(), "{name}");
    }
}

// ---------------------------------------------------------------------------
// Body encoding
// ---------------------------------------------------------------------------

#[test]
fn encode_body_vectors() {
    let raw = include_str!("../../test-vectors/encode_body.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let content_type = parse_content_type(case["content_type"].as_str().unwrap());
        let body = parse_body(&case["body"]);
        let (kind, expected) = case["expected"].as_object().unwrap().iter().next().unwrap();

        let result = encode_body(&body, content_type);
        match kind.as_str() {
            "bytes" => {
                let payload = result.unwrap();
                assert_eq!(
                    payload,
                    Payload::Bytes(expected.as_str().unwrap().as_bytes().to_vec()),
                    "{name}"
                );
            }
            "json" => {
                let Payload::Bytes(bytes) = result.unwrap() else {
                    panic!("{name}: expected bytes");
                };
                let value: Value = serde_json::from_slice(&bytes).unwrap();
                assert_eq!(&value, expected, "{name}");
            }
            "form" => {
                let parts = pairs(expected)
                    .into_iter()
                    .map(|(k, v)| FormPart::text(k, v))
                    .collect();
                assert_eq!(result.unwrap(), Payload::Form(parts), "{name}");
            }
            "error" => match result {
                Err(Error::InvalidRequestBody { content_type: ct, body }) => {
                    assert_eq!(ct, content_type, "{name}");
                    assert_eq!(body, expected.as_str().unwrap(), "{name}");
                }
                other => panic!("{name}: expected InvalidRequestBody, got {other:?}"),
            },
            "none" => assert_eq!(result.unwrap(), Payload::None, "{name}"),
            other => panic!("{name}: unknown expectation {other}"),
        }
    }
}

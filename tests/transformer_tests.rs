//! Tests for event normalization through the kernel
//!
//! Covers the serverless transformer against realistic proxy events, body
//! format selection, custom transformers and build-time rejection of
//! unknown transformer kinds and body formats.

mod common;

use std::sync::Arc;

use base64::Engine;
use common::events::{post_pet, proxy_event};
use lambda_kernel::runtime_config::KernelConfig;
use lambda_kernel::transformer::{
    json_body_parser, text_body_parser, BodyParser, EventTransformer, ServerlessTransformer,
};
use lambda_kernel::{DispatchConfig, Kernel, KernelError, Request, Response};
use serde_json::{json, Map, Value};

fn echo_data() -> DispatchConfig {
    DispatchConfig::new(|req: Request, _env, _mw| {
        Ok(Response::new(serde_json::to_value(req.data())?).into())
    })
}

fn reply_body(kernel: &Kernel, event: &Value) -> (u16, Value) {
    let reply = kernel.handle(event, &echo_data());
    (reply.status_code, serde_json::from_str(&reply.body).unwrap())
}

#[test]
fn test_serverless_event_is_normalized() {
    let kernel = Kernel::with_defaults().unwrap();
    let mut event = post_pet("dev", &json!({ "name": "Rex", "tags": ["good"] }));
    event["queryStringParameters"] = json!({ "dryRun": "true" });

    let (status, body) = reply_body(&kernel, &event);
    assert_eq!(status, 200);
    assert_eq!(body["path"], "/pets");
    assert_eq!(body["method"], "POST");
    assert_eq!(body["headers"]["X-Request-Source"], "tests");
    assert_eq!(body["query"], json!({ "dryRun": "true" }));
    assert_eq!(body["body"], json!({ "name": "Rex", "tags": ["good"] }));
}

#[test]
fn test_base64_body_is_decoded() {
    let kernel = Kernel::with_defaults().unwrap();
    let mut event = proxy_event("dev", "PUT", "/pets/1");
    event["body"] = json!(base64::engine::general_purpose::STANDARD.encode(r#"{"id":1}"#));
    event["isBase64Encoded"] = json!(true);

    let (status, body) = reply_body(&kernel, &event);
    assert_eq!(status, 200);
    assert_eq!(body["body"], json!({ "id": 1 }));
}

#[test]
fn test_invalid_base64_is_500() {
    let kernel = Kernel::with_defaults().unwrap();
    let mut event = proxy_event("dev", "PUT", "/pets/1");
    event["body"] = json!("%%%");
    event["isBase64Encoded"] = json!(true);

    let (status, body) = reply_body(&kernel, &event);
    assert_eq!(status, 500);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("invalid base64 body"));
}

#[test]
fn test_wrong_field_types_are_500() {
    let kernel = Kernel::with_defaults().unwrap();
    for (field, value) in [
        ("path", json!(42)),
        ("headers", json!(["not", "a", "map"])),
        ("queryStringParameters", json!("a=b")),
        ("body", json!({ "already": "parsed" })),
    ] {
        let mut event = proxy_event("dev", "GET", "/");
        event[field] = value;
        let (status, body) = reply_body(&kernel, &event);
        assert_eq!(status, 500, "{field}");
        assert!(body["message"].as_str().unwrap().contains(field), "{field}");
    }
}

#[test]
fn test_text_body_format_from_config() {
    let kernel = Kernel::builder()
        .config(KernelConfig {
            body_format: "text".into(),
            ..KernelConfig::default()
        })
        .build()
        .unwrap();
    let mut event = proxy_event("dev", "POST", "/notes");
    event["body"] = json!("plain words, not json");

    let (status, body) = reply_body(&kernel, &event);
    assert_eq!(status, 200);
    assert_eq!(body["body"], "plain words, not json");
}

#[test]
fn test_unknown_names_fail_build() {
    let err = Kernel::builder()
        .config(KernelConfig {
            transformer: "soap".into(),
            ..KernelConfig::default()
        })
        .build()
        .err();
    assert_eq!(
        err,
        Some(KernelError::TypeMismatch {
            component: "transformer",
            found: "soap".into()
        })
    );

    let err = Kernel::builder()
        .config(KernelConfig {
            body_format: "xml".into(),
            ..KernelConfig::default()
        })
        .build()
        .err();
    assert!(matches!(
        err,
        Some(KernelError::TypeMismatch {
            component: "body format",
            ..
        })
    ));
}

/// Transformer for a queue-style event: `{ "route": .., "verb": .., "payload": .. }`
struct QueueTransformer {
    parser: BodyParser,
}

impl EventTransformer for QueueTransformer {
    fn body_parser(&self) -> &BodyParser {
        &self.parser
    }

    fn parse_path(&self, event: &Value) -> Result<String, KernelError> {
        Ok(event["route"].as_str().unwrap_or("/").to_string())
    }

    fn parse_method(&self, event: &Value) -> Result<String, KernelError> {
        Ok(event["verb"].as_str().unwrap_or("POST").to_uppercase())
    }

    fn parse_headers(&self, _event: &Value) -> Result<Map<String, Value>, KernelError> {
        Ok(Map::new())
    }

    fn parse_query(&self, _event: &Value) -> Result<Map<String, Value>, KernelError> {
        Ok(Map::new())
    }

    fn raw_body(&self, event: &Value) -> Result<Option<String>, KernelError> {
        Ok(event["payload"].as_str().map(str::to_string))
    }
}

#[test]
fn test_custom_transformer() {
    let kernel = Kernel::builder()
        .transformer(Arc::new(QueueTransformer {
            parser: json_body_parser(),
        }))
        .build()
        .unwrap();
    let event = json!({
        "route": "/jobs",
        "verb": "put",
        "payload": "{\"job\":7}",
        "requestContext": { "stage": "qa" }
    });

    let (status, body) = reply_body(&kernel, &event);
    assert_eq!(status, 200);
    assert_eq!(body["path"], "/jobs");
    assert_eq!(body["method"], "PUT");
    assert_eq!(body["headers"], json!({}));
    assert_eq!(body["body"], json!({ "job": 7 }));
}

/// Only knows how to find the path
struct PathOnly {
    parser: BodyParser,
}

impl EventTransformer for PathOnly {
    fn body_parser(&self) -> &BodyParser {
        &self.parser
    }

    fn parse_path(&self, event: &Value) -> Result<String, KernelError> {
        Ok(event["path"].as_str().unwrap_or_default().to_string())
    }
}

#[test]
fn test_unimplemented_extraction_is_500() {
    let kernel = Kernel::builder()
        .transformer(Arc::new(PathOnly {
            parser: text_body_parser(),
        }))
        .build()
        .unwrap();

    let (status, body) = reply_body(&kernel, &proxy_event("dev", "GET", "/"));
    assert_eq!(status, 500);
    assert_eq!(
        body["message"],
        "parse_method must be implemented by the transformer"
    );
}

#[test]
fn test_default_transformer_matches_explicit() {
    let explicit = Kernel::builder()
        .transformer(Arc::new(ServerlessTransformer::default()))
        .build()
        .unwrap();
    let defaults = Kernel::with_defaults().unwrap();
    let event = post_pet("test", &json!({ "n": 1 }));

    assert_eq!(reply_body(&explicit, &event), reply_body(&defaults, &event));
}

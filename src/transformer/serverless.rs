use base64::Engine;
use serde_json::{Map, Value};

use super::{BodyParser, EventTransformer};
use crate::error::KernelError;

/// Transformer for the API-gateway "proxy" integration event used by
/// Serverless-style Lambda deployments.
pub struct ServerlessTransformer {
    parser: BodyParser,
}

impl ServerlessTransformer {
    #[must_use]
    pub fn new(parser: BodyParser) -> Self {
        Self { parser }
    }
}

impl Default for ServerlessTransformer {
    fn default() -> Self {
        Self::new(super::json_body_parser())
    }
}

fn string_field(event: &Value, field: &str) -> Result<String, KernelError> {
    match event.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Null) | None => Ok(String::new()),
        Some(other) => Err(KernelError::TransformFailure(format!(
            "event field `{field}` must be a string, got: {other}"
        ))),
    }
}

/// `null` and missing mappings normalize to an empty mapping.
fn mapping_field(event: &Value, field: &str) -> Result<Map<String, Value>, KernelError> {
    match event.get(field) {
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(Value::Null) | None => Ok(Map::new()),
        Some(other) => Err(KernelError::TransformFailure(format!(
            "event field `{field}` must be a mapping, got: {other}"
        ))),
    }
}

impl EventTransformer for ServerlessTransformer {
    fn body_parser(&self) -> &BodyParser {
        &self.parser
    }

    fn parse_path(&self, event: &Value) -> Result<String, KernelError> {
        string_field(event, "path")
    }

    fn parse_method(&self, event: &Value) -> Result<String, KernelError> {
        string_field(event, "httpMethod")
    }

    fn parse_headers(&self, event: &Value) -> Result<Map<String, Value>, KernelError> {
        mapping_field(event, "headers")
    }

    fn parse_query(&self, event: &Value) -> Result<Map<String, Value>, KernelError> {
        mapping_field(event, "queryStringParameters")
    }

    fn raw_body(&self, event: &Value) -> Result<Option<String>, KernelError> {
        let body = match event.get("body") {
            Some(Value::String(s)) => s,
            Some(Value::Null) | None => return Ok(None),
            Some(other) => {
                return Err(KernelError::TransformFailure(format!(
                    "event field `body` must be a string, got: {other}"
                )))
            }
        };

        let encoded = event
            .get("isBase64Encoded")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !encoded {
            return Ok(Some(body.clone()));
        }

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(body)
            .map_err(|e| KernelError::TransformFailure(format!("invalid base64 body: {e}")))?;
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| KernelError::TransformFailure(format!("body is not UTF-8: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event() -> Value {
        json!({
            "path": "/pets/42",
            "httpMethod": "GET",
            "headers": { "Accept": "application/json" },
            "queryStringParameters": { "verbose": "1" },
            "body": null,
            "requestContext": { "stage": "dev" }
        })
    }

    #[test]
    fn extracts_fields() {
        let data = ServerlessTransformer::default()
            .parse_from_event(&event())
            .unwrap();
        assert_eq!(data.path(), "/pets/42");
        assert_eq!(data.method(), "GET");
        assert_eq!(data.headers()["Accept"], json!("application/json"));
        assert_eq!(data.query()["verbose"], json!("1"));
        assert_eq!(data.body(), &Value::Null);
    }

    #[test]
    fn null_mappings_become_empty() {
        let mut e = event();
        e["headers"] = Value::Null;
        if let Some(map) = e.as_object_mut() {
            map.remove("queryStringParameters");
        }
        let data = ServerlessTransformer::default().parse_from_event(&e).unwrap();
        assert!(data.headers().is_empty());
        assert!(data.query().is_empty());
    }

    #[test]
    fn bad_json_body_is_a_transform_failure() {
        let mut e = event();
        e["body"] = json!("{not json");
        let err = ServerlessTransformer::default()
            .parse_from_event(&e)
            .unwrap_err();
        assert!(matches!(err, KernelError::TransformFailure(_)));
    }

    #[test]
    fn decodes_base64_bodies() {
        let mut e = event();
        e["body"] = json!(base64::engine::general_purpose::STANDARD.encode(r#"{"a":1}"#));
        e["isBase64Encoded"] = json!(true);
        let data = ServerlessTransformer::default().parse_from_event(&e).unwrap();
        assert_eq!(data.body(), &json!({ "a": 1 }));
    }

    #[test]
    fn rejects_non_mapping_headers() {
        let mut e = event();
        e["headers"] = json!(["Accept"]);
        let err = ServerlessTransformer::default()
            .parse_headers(&e)
            .unwrap_err();
        assert!(matches!(err, KernelError::TransformFailure(_)));
    }
}

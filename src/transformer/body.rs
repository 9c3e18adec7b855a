use std::sync::Arc;

use anyhow::Context;
use serde_json::Value;

use crate::error::KernelError;

/// Deserializer applied to the raw body text of an event.
///
/// Receives `None` when the event carries no body.
pub type BodyParser = Arc<dyn Fn(Option<&str>) -> anyhow::Result<Value> + Send + Sync>;

/// Strict JSON body parsing. A missing body parses to `null`; an empty body is an error.
#[must_use]
pub fn json_body_parser() -> BodyParser {
    Arc::new(|raw| match raw {
        None => Ok(Value::Null),
        Some(text) => serde_json::from_str(text).context("request body is not valid JSON"),
    })
}

/// Pass the raw body through as a JSON string.
#[must_use]
pub fn text_body_parser() -> BodyParser {
    Arc::new(|raw| Ok(raw.map_or(Value::Null, |text| Value::String(text.to_string()))))
}

/// Body formats that can be selected by name from configuration.
pub fn body_parser_for(format: &str) -> Result<BodyParser, KernelError> {
    match format.to_ascii_lowercase().as_str() {
        "json" => Ok(json_body_parser()),
        "text" => Ok(text_body_parser()),
        _ => Err(KernelError::TypeMismatch {
            component: "body format",
            found: format.to_string(),
        }),
    }
}

//! # Transformer Module
//!
//! Converts a platform invocation event into [`RequestData`].
//!
//! The contract is split into five extraction operations (path, method,
//! headers, query, raw body) plus an injected [`BodyParser`] that turns the
//! raw body text into a JSON value. A concrete transformer overrides the five
//! extraction methods; any it leaves alone fail with
//! [`KernelError::NotImplemented`].
//!
//! ```rust
//! use lambda_kernel::transformer::{json_body_parser, EventTransformer, ServerlessTransformer};
//! use serde_json::json;
//!
//! let transformer = ServerlessTransformer::new(json_body_parser());
//! let data = transformer
//!     .parse_from_event(&json!({
//!         "path": "/pets",
//!         "httpMethod": "POST",
//!         "headers": { "Content-Type": "application/json" },
//!         "queryStringParameters": null,
//!         "body": "{\"name\":\"rex\"}"
//!     }))
//!     .unwrap();
//! assert_eq!(data.path(), "/pets");
//! assert_eq!(data.body()["name"], "rex");
//! ```

mod body;
mod serverless;

pub use body::{body_parser_for, json_body_parser, text_body_parser, BodyParser};
pub use serverless::ServerlessTransformer;

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::KernelError;
use crate::request::RequestData;

/// Capability contract for turning an event into normalized request data.
pub trait EventTransformer: Send + Sync {
    /// The parser applied to the raw body text
    fn body_parser(&self) -> &BodyParser;

    fn parse_path(&self, _event: &Value) -> Result<String, KernelError> {
        Err(KernelError::NotImplemented {
            operation: "parse_path",
        })
    }

    fn parse_method(&self, _event: &Value) -> Result<String, KernelError> {
        Err(KernelError::NotImplemented {
            operation: "parse_method",
        })
    }

    fn parse_headers(&self, _event: &Value) -> Result<Map<String, Value>, KernelError> {
        Err(KernelError::NotImplemented {
            operation: "parse_headers",
        })
    }

    fn parse_query(&self, _event: &Value) -> Result<Map<String, Value>, KernelError> {
        Err(KernelError::NotImplemented {
            operation: "parse_query",
        })
    }

    /// Return the raw body string from the event, `None` when it has no body
    fn raw_body(&self, _event: &Value) -> Result<Option<String>, KernelError> {
        Err(KernelError::NotImplemented {
            operation: "raw_body",
        })
    }

    /// Apply the body parser to the raw body.
    fn parse_body(&self, event: &Value) -> Result<Value, KernelError> {
        let raw = self.raw_body(event)?;
        (self.body_parser())(raw.as_deref())
            .map_err(|e| KernelError::TransformFailure(format!("{e:#}")))
    }

    fn parse_from_event(&self, event: &Value) -> Result<RequestData, KernelError> {
        Ok(RequestData::new(
            self.parse_path(event)?,
            self.parse_method(event)?,
            self.parse_headers(event)?,
            self.parse_body(event)?,
            self.parse_query(event)?,
        ))
    }
}

/// Resolve a transformer by configured kind (`serverless`).
pub fn transformer_for(
    kind: &str,
    parser: BodyParser,
) -> Result<Arc<dyn EventTransformer>, KernelError> {
    match kind.to_ascii_lowercase().as_str() {
        "serverless" => Ok(Arc::new(ServerlessTransformer::new(parser))),
        _ => Err(KernelError::TypeMismatch {
            component: "transformer",
            found: kind.to_string(),
        }),
    }
}

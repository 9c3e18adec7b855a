//! Responses returned by actions and the reply shape handed back to the platform.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::KernelError;

/// Header every response carries unless the action supplies its own headers
pub const CORS_HEADER: &str = "Access-Control-Allow-Origin";

/// Default status code
pub const DEFAULT_STATUS: u16 = 200;

fn default_headers() -> HashMap<String, String> {
    let mut headers = HashMap::with_capacity(1);
    headers.insert(CORS_HEADER.to_string(), "*".to_string());
    headers
}

/// Response produced by an action (or by the kernel's error path).
///
/// Consumed exactly once by [`Response::simplified`].
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    body: Value,
    code: u16,
    headers: HashMap<String, String>,
}

impl Response {
    /// Create a `200` response with the default CORS header
    #[must_use]
    pub fn new(body: Value) -> Self {
        Self {
            body,
            code: DEFAULT_STATUS,
            headers: default_headers(),
        }
    }

    /// Serialize any value into a `200` response body
    pub fn from_serialize<T: Serialize>(body: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::to_value(body)?))
    }

    /// Build a response from loosely typed parts.
    ///
    /// A missing or `null` code defaults to `200`; any code that is not an
    /// integer in `0..=65535` is rejected. Missing headers default to the
    /// CORS header, while an explicitly empty map stays empty.
    pub fn from_parts(
        body: Value,
        code: Option<&Value>,
        headers: Option<HashMap<String, String>>,
    ) -> Result<Self, KernelError> {
        let code = match code {
            None | Some(Value::Null) => DEFAULT_STATUS,
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|n| u16::try_from(n).ok())
                .ok_or_else(|| KernelError::InvalidStatus(n.to_string()))?,
            Some(other) => return Err(KernelError::InvalidStatus(other.to_string())),
        };
        Ok(Self {
            body,
            code,
            headers: headers.unwrap_or_else(default_headers),
        })
    }

    /// Replace the status code
    #[must_use]
    pub fn with_status(mut self, code: u16) -> Self {
        self.code = code;
        self
    }

    /// Replace all headers, dropping the default CORS header
    #[must_use]
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    /// Add or overwrite a single header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn body(&self) -> &Value {
        &self.body
    }

    #[must_use]
    pub fn code(&self) -> u16 {
        self.code
    }

    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Generate the platform integration reply for this response.
    #[must_use]
    pub fn simplified(self) -> LambdaReply {
        let body = match serde_json::to_string(&self.body) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "Response body could not be serialized");
                return LambdaReply {
                    status_code: 500,
                    body: r#"{"message":"response body could not be serialized"}"#.to_string(),
                    headers: self.headers,
                };
            }
        };
        LambdaReply {
            status_code: self.code,
            body,
            headers: self.headers,
        }
    }
}

/// Reply shape consumed by API-gateway style integrations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LambdaReply {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// JSON-serialized response body
    pub body: String,
    pub headers: HashMap<String, String>,
}

//! Normalized request data and the [`Request`] view handed to actions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::accessor::KeyedLookup;
use crate::ids::RequestId;

/// The five normalized request fields produced by an
/// [`EventTransformer`](crate::transformer::EventTransformer).
///
/// Fields are private; once built the data is never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestData {
    path: String,
    method: String,
    headers: Map<String, Value>,
    body: Value,
    query: Map<String, Value>,
}

impl RequestData {
    #[must_use]
    pub fn new(
        path: String,
        method: String,
        headers: Map<String, Value>,
        body: Value,
        query: Map<String, Value>,
    ) -> Self {
        Self {
            path,
            method,
            headers,
            body,
            query,
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    #[must_use]
    pub fn headers(&self) -> &Map<String, Value> {
        &self.headers
    }

    #[must_use]
    pub fn body(&self) -> &Value {
        &self.body
    }

    #[must_use]
    pub fn query(&self) -> &Map<String, Value> {
        &self.query
    }
}

/// Request object provided to actions by the kernel.
///
/// Owns its [`RequestData`] for the lifetime of one invocation. Headers, body
/// and query are exposed through fresh [`KeyedLookup`] views on every call.
#[derive(Debug, Clone)]
pub struct Request {
    request_id: RequestId,
    data: RequestData,
}

impl Request {
    #[must_use]
    pub fn new(request_id: RequestId, data: RequestData) -> Self {
        Self { request_id, data }
    }

    /// Id assigned to this invocation for log correlation
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// The HTTP path requested
    #[must_use]
    pub fn path(&self) -> &str {
        self.data.path()
    }

    /// The HTTP request method
    #[must_use]
    pub fn method(&self) -> &str {
        self.data.method()
    }

    /// The HTTP request headers
    #[must_use]
    pub fn headers(&self) -> KeyedLookup<'_> {
        KeyedLookup::new(self.data.headers())
    }

    /// The parsed request body
    #[must_use]
    pub fn body(&self) -> KeyedLookup<'_> {
        KeyedLookup::from_value(self.data.body())
    }

    /// The query string parameters
    #[must_use]
    pub fn query(&self) -> KeyedLookup<'_> {
        KeyedLookup::new(self.data.query())
    }

    /// The parsed body as-is, including non-object bodies
    #[must_use]
    pub fn body_value(&self) -> &Value {
        self.data.body()
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.data
            .headers()
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .and_then(|(_, v)| v.as_str())
    }

    /// Borrow the underlying normalized data
    #[must_use]
    pub fn data(&self) -> &RequestData {
        &self.data
    }
}

//! Mapping of uncaught failures to responses.
//!
//! A failure can pick its status code by starting its message with a
//! bracketed three digit code followed by whitespace, e.g.
//! `"[404] pet not found"`. Everything else is a `500`. The body is always
//! `{"message": <full message>}`.

use std::any::Any;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

use crate::response::Response;

/// Status used when a failure carries no embedded code
pub const FALLBACK_STATUS: u16 = 500;

static STATUS_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[([0-9]{3})\]\s").expect("status prefix regex should be valid")
});

/// The embedded status code of a message, if it has one.
#[must_use]
pub fn embedded_status(message: &str) -> Option<u16> {
    STATUS_PREFIX
        .captures(message)
        .and_then(|caps| caps.get(1))
        .and_then(|code| code.as_str().parse().ok())
}

/// Build the response for a failure message.
#[must_use]
pub fn message_response(message: String) -> Response {
    let code = embedded_status(&message).unwrap_or(FALLBACK_STATUS);
    Response::new(json!({ "message": message })).with_status(code)
}

/// Build the response for an arbitrary failure.
///
/// Uses the outermost error message; context chains added with
/// `anyhow::Context` contribute only their top-level message.
#[must_use]
pub fn error_response(err: &anyhow::Error) -> Response {
    message_response(err.to_string())
}

/// Best-effort text of a panic payload
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

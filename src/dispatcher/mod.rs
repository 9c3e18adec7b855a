//! # Dispatcher Module
//!
//! The dispatcher runs one invocation from the platform event to the reply.
//!
//! ## Request Flow
//!
//! 1. The deployment stage is read from `requestContext.stage` and turned
//!    into an [`Env`](crate::Env); the action is checked
//! 2. The kernel's middleware and the call's middleware are merged (kernel
//!    first, call second)
//! 3. The [`EventTransformer`](crate::transformer::EventTransformer) builds
//!    the [`Request`](crate::Request)
//! 4. One middleware instance is built per middleware and its `create` step
//!    runs, in order, producing the context values
//! 5. The action runs with the request, the env and the context values
//! 6. The action's [`Outcome`] is reconciled: a response is used as-is, a
//!    [`Deferred`] value is waited on, anything else is an invalid result
//! 7. The response is serialized into a [`LambdaReply`](crate::LambdaReply)
//!    and handed to the host
//! 8. Every constructed middleware instance is destroyed exactly once
//!
//! ## Error Handling
//!
//! Nothing escapes a dispatch. Errors and panics raised in steps 1-6, and
//! failures of a deferred value, become a response via [`error_response`]:
//! a message starting with `[NNN] ` picks status `NNN`, everything else is a
//! `500`. The body is `{"message": <message>}`.
//!
//! ## Example
//!
//! ```rust
//! use lambda_kernel::dispatcher::{DispatchConfig, Kernel, Outcome};
//! use lambda_kernel::Response;
//! use serde_json::json;
//!
//! let kernel = Kernel::with_defaults().unwrap();
//! let call = DispatchConfig::new(|req, _env, _mw| {
//!     Ok(Outcome::from(Response::new(json!({ "path": req.path() })).with_status(201)))
//! });
//!
//! let reply = kernel.handle(
//!     &json!({
//!         "path": "/pets",
//!         "httpMethod": "GET",
//!         "headers": {},
//!         "queryStringParameters": null,
//!         "body": null,
//!         "requestContext": { "stage": "prod" }
//!     }),
//!     &call,
//! );
//! assert_eq!(reply.status_code, 201);
//! assert_eq!(reply.body, r#"{"path":"/pets"}"#);
//! ```

mod core;
mod deferred;
mod failure;

pub use self::core::{
    Action, DispatchConfig, Kernel, KernelBuilder, Outcome, REQUEST_ID_HEADER,
};
pub use self::deferred::{Deferred, Settlement, Settler};
pub use self::failure::{
    embedded_status, error_response, message_response, panic_message, FALLBACK_STATUS,
};

//! # lambda-kernel
//!
//! **lambda-kernel** is a small request/response kernel for serverless
//! functions. It turns a platform invocation event (API Gateway proxy shape)
//! into a uniform [`Request`], runs request-scoped middleware around a
//! handler, and turns whatever the handler produces, including failures,
//! into the `{statusCode, body, headers}` reply the platform expects.
//!
//! ## Architecture
//!
//! - **[`transformer`]** - Event normalization through the
//!   [`EventTransformer`](transformer::EventTransformer) contract and an
//!   injected body parser
//! - **[`request`]** / **[`accessor`]** - The immutable normalized request and
//!   read-only keyed lookups over its headers, body and query
//! - **[`response`]** - Handler responses and the platform reply shape
//! - **[`middleware`]** - Request-scoped middleware with a create/destroy
//!   lifecycle
//! - **[`dispatcher`]** - The [`Kernel`] that runs one invocation end to end,
//!   deferred results and failure mapping
//! - **[`runtime_config`]** / **[`logging`]** - `KERNEL_*` environment
//!   configuration and `tracing` setup
//! - **[`cli`]** - Local `invoke` and `config` commands
//!
//! ## Invocation Flow
//!
//! ```text
//! event ──► Env (stage, debug)
//!       ──► EventTransformer ──► RequestData ──► Request
//!       ──► middleware create (in order) ──► context values
//!       ──► action(Request, &Env, values)
//!       ──► Response | Deferred ──► LambdaReply ──► host
//!       ──► middleware destroy (exactly once each)
//! ```
//!
//! Any error or panic along the way becomes a reply: a message starting with
//! `[NNN] ` selects status `NNN`, anything else is a `500`, and the body is
//! `{"message": <message>}`.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use lambda_kernel::{DispatchConfig, Kernel, Outcome, Response};
//! use serde_json::json;
//!
//! let kernel = Arc::new(Kernel::with_defaults().unwrap());
//! let handler = kernel.bind(DispatchConfig::new(|req, env, _mw| {
//!     if req.query().has("fail") {
//!         anyhow::bail!("[418] short and stout");
//!     }
//!     Ok(Outcome::from(Response::new(json!({ "stage": env.stage }))))
//! }));
//!
//! let reply = handler(json!({
//!     "path": "/",
//!     "httpMethod": "GET",
//!     "headers": {},
//!     "queryStringParameters": { "fail": "1" },
//!     "body": null,
//!     "requestContext": { "stage": "dev" }
//! }));
//! assert_eq!(reply.status_code, 418);
//! assert_eq!(reply.body, r#"{"message":"[418] short and stout"}"#);
//! ```
//!
//! ## Hosting
//!
//! A kernel is built once per process and shared. `demos/hello_service`
//! shows it behind `lambda_runtime`, with each invocation dispatched on a
//! blocking task.

pub mod accessor;
pub mod cli;
pub mod dispatcher;
pub mod echo;
pub mod env;
pub mod error;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod request;
pub mod response;
pub mod runtime_config;
pub mod transformer;

pub use accessor::KeyedLookup;
pub use dispatcher::{Deferred, DispatchConfig, Kernel, Outcome};
pub use env::Env;
pub use error::KernelError;
pub use ids::RequestId;
pub use request::{Request, RequestData};
pub use response::{LambdaReply, Response};

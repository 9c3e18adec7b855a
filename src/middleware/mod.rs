//! # Middleware Module
//!
//! Request-scoped middleware for the kernel.
//!
//! A [`Middleware`] is registered once (on the kernel or on a single dispatch
//! configuration) and builds a fresh [`MiddlewareInstance`] for every
//! invocation. The instance's `create` step produces a context value that the
//! action receives by position; its `destroy` step runs exactly once after the
//! action settles.
//!
//! Any `Fn() -> I` where `I: MiddlewareInstance` is a middleware:
//!
//! ```rust
//! use lambda_kernel::middleware::{ContextValue, Middleware, MiddlewareInstance};
//! use lambda_kernel::{Env, Request};
//!
//! struct Counter(u32);
//!
//! impl MiddlewareInstance for Counter {
//!     fn create(&mut self, _req: &Request, _env: &Env) -> anyhow::Result<ContextValue> {
//!         self.0 += 1;
//!         Ok(Box::new(self.0))
//!     }
//! }
//!
//! let mw = || Counter(0);
//! let _instance = mw.instance();
//! ```

mod core;
mod metrics;
mod tracing;

pub use self::core::{
    ContextValue, Middleware, MiddlewareInstance, MiddlewareValues, MAX_INLINE_MIDDLEWARE,
};
pub use self::metrics::MetricsMiddleware;
pub use self::tracing::{RequestTrace, TracingMiddleware};

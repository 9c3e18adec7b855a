//! Dispatcher core module - one invocation from event to reply.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use smallvec::SmallVec;
use tracing::{debug, error, info, warn};

use super::deferred::Deferred;
use super::failure::{error_response, panic_message};
use crate::env::Env;
use crate::error::{KernelError, DEFERRED_NOT_A_RESPONSE, NOT_A_RESPONSE};
use crate::ids::RequestId;
use crate::middleware::{Middleware, MiddlewareInstance, MiddlewareValues, MAX_INLINE_MIDDLEWARE};
use crate::request::Request;
use crate::response::{LambdaReply, Response};
use crate::runtime_config::{KernelConfig, TeardownPolicy};
use crate::transformer::{body_parser_for, transformer_for, EventTransformer};

/// Header whose ULID value, when valid, is reused as the invocation's request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request-scoped middleware instances (stack-allocated for the common case)
type Instances = SmallVec<[Box<dyn MiddlewareInstance>; MAX_INLINE_MIDDLEWARE]>;

/// What an action hands back to the kernel
#[derive(Debug)]
pub enum Outcome {
    /// A finished response
    Respond(Response),
    /// A response that settles later
    Defer(Deferred),
    /// Any other value; always rejected as an invalid result
    Raw(Value),
}

impl From<Response> for Outcome {
    fn from(res: Response) -> Self {
        Outcome::Respond(res)
    }
}

impl From<Deferred> for Outcome {
    fn from(deferred: Deferred) -> Self {
        Outcome::Defer(deferred)
    }
}

impl From<Value> for Outcome {
    fn from(value: Value) -> Self {
        Outcome::Raw(value)
    }
}

/// Handler invoked with the request, the environment and the middleware
/// context values in middleware order
pub type Action =
    Arc<dyn Fn(Request, &Env, MiddlewareValues) -> anyhow::Result<Outcome> + Send + Sync>;

/// Per-call dispatch configuration: the action plus middleware appended
/// after the kernel's own for this call only.
#[derive(Clone, Default)]
pub struct DispatchConfig {
    action: Option<Action>,
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl DispatchConfig {
    pub fn new<F>(action: F) -> Self
    where
        F: Fn(Request, &Env, MiddlewareValues) -> anyhow::Result<Outcome> + Send + Sync + 'static,
    {
        Self {
            action: Some(Arc::new(action)),
            middlewares: Vec::new(),
        }
    }

    /// Use an action that is already shared
    #[must_use]
    pub fn from_action(action: Action) -> Self {
        Self {
            action: Some(action),
            middlewares: Vec::new(),
        }
    }

    /// Append middleware for this call only
    #[must_use]
    pub fn with_middleware(mut self, mw: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(mw);
        self
    }

    #[must_use]
    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }
}

/// Builder for [`Kernel`]
#[derive(Default)]
pub struct KernelBuilder {
    transformer: Option<Arc<dyn EventTransformer>>,
    middlewares: Vec<Arc<dyn Middleware>>,
    config: KernelConfig,
}

impl KernelBuilder {
    /// Use an explicit transformer instead of resolving one from the config
    #[must_use]
    pub fn transformer(mut self, transformer: Arc<dyn EventTransformer>) -> Self {
        self.transformer = Some(transformer);
        self
    }

    /// Register middleware run on every invocation, in registration order
    #[must_use]
    pub fn middleware(mut self, mw: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(mw);
        self
    }

    #[must_use]
    pub fn config(mut self, config: KernelConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the kernel.
    ///
    /// Without an explicit transformer, the configured transformer kind and
    /// body format are resolved; unknown names fail with
    /// [`KernelError::TypeMismatch`].
    pub fn build(self) -> Result<Kernel, KernelError> {
        let transformer = match self.transformer {
            Some(t) => t,
            None => {
                let parser = body_parser_for(&self.config.body_format)?;
                transformer_for(&self.config.transformer, parser)?
            }
        };

        info!(
            middleware_count = self.middlewares.len(),
            debug_stages = ?self.config.debug_stages,
            teardown = ?self.config.teardown,
            stack_size = self.config.stack_size,
            "Kernel built"
        );

        Ok(Kernel {
            transformer,
            middlewares: self.middlewares,
            config: self.config,
        })
    }
}

/// Long-lived request/response kernel.
///
/// Built once (e.g. at cold start) and shared; every invocation gets its own
/// request, middleware instances and response. Nothing on the kernel is
/// mutated while dispatching.
pub struct Kernel {
    transformer: Arc<dyn EventTransformer>,
    middlewares: Vec<Arc<dyn Middleware>>,
    config: KernelConfig,
}

enum Pending {
    Ready(Response),
    Waiting(Deferred),
}

impl Kernel {
    #[must_use]
    pub fn builder() -> KernelBuilder {
        KernelBuilder::default()
    }

    /// Kernel with the default serverless transformer, JSON bodies and no middleware
    pub fn with_defaults() -> Result<Self, KernelError> {
        Self::builder().build()
    }

    #[must_use]
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Bind a dispatch configuration, returning the function the host calls
    /// for each event.
    pub fn bind(
        self: Arc<Self>,
        call: DispatchConfig,
    ) -> impl Fn(Value) -> LambdaReply + Send + Sync + Clone + 'static {
        move |event| self.handle(&event, &call)
    }

    /// Dispatch one event and return the reply.
    pub fn handle(&self, event: &Value, call: &DispatchConfig) -> LambdaReply {
        let mut reply = None;
        self.dispatch_with(event, call, |r| reply = Some(r));
        reply.unwrap_or_else(|| {
            error_response(&anyhow::anyhow!("dispatch finished without a reply")).simplified()
        })
    }

    /// Dispatch one event, handing the reply to `complete` exactly once.
    ///
    /// Every failure is converted into a reply. Middleware instances are
    /// destroyed after `complete` returns, or, under
    /// [`TeardownPolicy::BeforeSettlement`], before a deferred result is
    /// waited on. A panic in `complete` still destroys them before it
    /// propagates to the caller.
    pub fn dispatch_with<C>(&self, event: &Value, call: &DispatchConfig, complete: C)
    where
        C: FnOnce(LambdaReply),
    {
        let request_id = RequestId::parse_or_new(request_id_header(event));
        let started = Instant::now();
        let mut scope = TeardownScope::new(request_id);

        let invoked = catch_unwind(AssertUnwindSafe(|| {
            self.invoke(event, call, request_id, &mut scope.instances)
        }));

        let pending = match invoked {
            Ok(Ok(pending)) => pending,
            Ok(Err(err)) => {
                warn!(
                    request_id = %request_id,
                    error = %err,
                    "Invocation failed"
                );
                Pending::Ready(error_response(&err))
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(
                    request_id = %request_id,
                    panic_message = %message,
                    "Invocation panicked"
                );
                Pending::Ready(error_response(&anyhow::Error::from(
                    KernelError::Panicked(message),
                )))
            }
        };

        let response = match pending {
            Pending::Ready(response) => response,
            Pending::Waiting(deferred) => {
                if self.config.teardown == TeardownPolicy::BeforeSettlement {
                    scope.run();
                }
                debug!(request_id = %request_id, "Waiting for deferred result");
                settle(request_id, deferred)
            }
        };

        let reply = response.simplified();
        info!(
            request_id = %request_id,
            status = reply.status_code,
            latency_ms = started.elapsed().as_millis() as u64,
            "Reply ready"
        );
        complete(reply);
        scope.run();
    }

    /// Everything up to and including the action call. Any error returned
    /// here becomes the reply.
    fn invoke(
        &self,
        event: &Value,
        call: &DispatchConfig,
        request_id: RequestId,
        instances: &mut Instances,
    ) -> anyhow::Result<Pending> {
        let env = Env::from_event(event, &self.config.debug_stages)?
            .with_stack_size(self.config.stack_size);
        let action = call.action.as_ref().ok_or(KernelError::InvalidAction)?;

        let middlewares: SmallVec<[&Arc<dyn Middleware>; MAX_INLINE_MIDDLEWARE]> =
            self.middlewares.iter().chain(call.middlewares.iter()).collect();

        debug!(
            request_id = %request_id,
            stage = %env.stage,
            debug = env.debug,
            middleware_count = middlewares.len(),
            "Event received"
        );

        let data = self.transformer.parse_from_event(event)?;
        let req = Request::new(request_id, data);

        instances.extend(middlewares.iter().map(|mw| mw.instance()));
        let mut values = MiddlewareValues::new();
        for (idx, instance) in instances.iter_mut().enumerate() {
            match instance.create(&req, &env) {
                Ok(value) => values.push(value),
                Err(err) => {
                    warn!(
                        request_id = %request_id,
                        middleware_idx = idx,
                        middleware_name = middlewares[idx].name(),
                        error = %err,
                        "Middleware create failed"
                    );
                    return Err(err);
                }
            }
        }

        info!(
            request_id = %request_id,
            method = %req.method(),
            path = %req.path(),
            "Invoking action"
        );

        match action(req, &env, values)? {
            Outcome::Respond(response) => Ok(Pending::Ready(response)),
            Outcome::Defer(deferred) => Ok(Pending::Waiting(deferred)),
            Outcome::Raw(_) => Err(KernelError::InvalidResult(NOT_A_RESPONSE).into()),
        }
    }
}

/// Caller-supplied `X-Request-Id`, read straight from the raw event
fn request_id_header(event: &Value) -> Option<&str> {
    event
        .get("headers")?
        .as_object()?
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(REQUEST_ID_HEADER))
        .and_then(|(_, value)| value.as_str())
}

/// Wait for a deferred result, following nested deferred values.
fn settle(request_id: RequestId, mut deferred: Deferred) -> Response {
    loop {
        match deferred.wait() {
            Ok(Outcome::Respond(response)) => return response,
            Ok(Outcome::Defer(next)) => deferred = next,
            Ok(Outcome::Raw(_)) => {
                warn!(request_id = %request_id, "Deferred result settled with a non-response");
                return error_response(&anyhow::Error::from(KernelError::InvalidResult(
                    DEFERRED_NOT_A_RESPONSE,
                )));
            }
            Err(err) => {
                warn!(
                    request_id = %request_id,
                    error = %err,
                    "Deferred result failed"
                );
                return error_response(&err);
            }
        }
    }
}

/// Owns an invocation's middleware instances and destroys them on drop,
/// so an unwinding host completion still tears down.
struct TeardownScope {
    request_id: RequestId,
    instances: Instances,
}

impl TeardownScope {
    fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            instances: Instances::new(),
        }
    }

    /// Destroy whatever has not been destroyed yet
    fn run(&mut self) {
        teardown(self.request_id, &mut self.instances);
    }
}

impl Drop for TeardownScope {
    fn drop(&mut self) {
        if std::thread::panicking() && !self.instances.is_empty() {
            warn!(request_id = %self.request_id, "Tearing down middleware while unwinding");
        }
        self.run();
    }
}

/// Destroy every constructed instance once, in middleware order.
fn teardown(request_id: RequestId, instances: &mut Instances) {
    if instances.is_empty() {
        return;
    }
    debug!(
        request_id = %request_id,
        middleware_count = instances.len(),
        "Middleware teardown"
    );
    for (idx, mut instance) in instances.drain(..).enumerate() {
        if let Err(panic) = catch_unwind(AssertUnwindSafe(|| instance.destroy())) {
            error!(
                request_id = %request_id,
                middleware_idx = idx,
                panic_message = %panic_message(panic.as_ref()),
                "Middleware destroy panicked"
            );
        }
    }
}

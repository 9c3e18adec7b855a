use std::time::Instant;

use tracing::{debug, info};

use super::{ContextValue, Middleware, MiddlewareInstance};
use crate::env::Env;
use crate::ids::RequestId;
use crate::request::Request;

/// Context value handed to the action by [`TracingMiddleware`]
#[derive(Debug, Clone)]
pub struct RequestTrace {
    pub request_id: RequestId,
    pub stage: String,
    pub started: Instant,
}

/// Logs the start and end of every invocation it is attached to.
pub struct TracingMiddleware;

struct TracingInstance {
    started: Option<(RequestId, Instant)>,
}

impl Middleware for TracingMiddleware {
    fn instance(&self) -> Box<dyn MiddlewareInstance> {
        Box::new(TracingInstance { started: None })
    }
}

impl MiddlewareInstance for TracingInstance {
    fn create(&mut self, req: &Request, env: &Env) -> anyhow::Result<ContextValue> {
        let started = Instant::now();
        info!(
            request_id = %req.request_id(),
            method = %req.method(),
            path = %req.path(),
            stage = %env.stage,
            debug = env.debug,
            "Request started"
        );
        self.started = Some((req.request_id(), started));
        Ok(Box::new(RequestTrace {
            request_id: req.request_id(),
            stage: env.stage.clone(),
            started,
        }))
    }

    fn destroy(&mut self) {
        match self.started.take() {
            Some((request_id, started)) => info!(
                request_id = %request_id,
                latency_ms = started.elapsed().as_millis() as u64,
                "Request finished"
            ),
            None => debug!("Tracing middleware torn down before create"),
        }
    }
}

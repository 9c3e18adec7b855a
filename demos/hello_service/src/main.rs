use std::sync::Arc;

use lambda_kernel::dispatcher::Deferred;
use lambda_kernel::logging::{init_logging, LogConfig};
use lambda_kernel::middleware::{
    ContextValue, MetricsMiddleware, MiddlewareInstance, MiddlewareValues, TracingMiddleware,
};
use lambda_kernel::runtime_config::KernelConfig;
use lambda_kernel::{DispatchConfig, Env, Kernel, LambdaReply, Outcome, Request, Response};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::{json, Value};
use tracing::{debug, info};

/// Caller identity resolved from the `X-User` header
#[derive(Debug, Clone)]
struct Caller {
    name: String,
}

#[derive(Default)]
struct CallerSession {
    name: Option<String>,
}

impl MiddlewareInstance for CallerSession {
    fn create(&mut self, req: &Request, env: &Env) -> anyhow::Result<ContextValue> {
        let name = match req.header("x-user") {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            Some(_) => anyhow::bail!("[400] X-User header must not be blank"),
            None if env.debug => "developer".to_string(),
            None => anyhow::bail!("[401] X-User header is required"),
        };
        self.name = Some(name.clone());
        Ok(Box::new(Caller { name }))
    }

    fn destroy(&mut self) {
        if let Some(name) = self.name.take() {
            debug!(caller = %name, "Caller session closed");
        }
    }
}

fn hello(req: Request, env: &Env, mut values: MiddlewareValues) -> anyhow::Result<Outcome> {
    // Kernel middleware: tracing (0), metrics (1); per-call: caller session (2)
    let caller = values
        .take::<Caller>(2)
        .ok_or_else(|| anyhow::anyhow!("caller session missing"))?;

    let greeting = req
        .query()
        .get_str("greeting")
        .unwrap_or("Hello")
        .to_string();

    if req.query().has("slow") {
        // Settles on a coroutine; the kernel waits for it before replying.
        let stage = env.stage.clone();
        return Ok(Deferred::spawn_with_stack(env.stack_size, move || {
            Ok(Response::new(json!({
                "message": format!("{}, {}!", greeting, caller.name),
                "stage": stage,
                "deferred": true,
            }))
            .into())
        })
        .into());
    }

    Ok(Response::new(json!({
        "message": format!("{}, {}!", greeting, caller.name),
        "stage": env.stage,
        "debug": env.debug,
    }))
    .into())
}

async fn handle_request(
    kernel: Arc<Kernel>,
    call: DispatchConfig,
    event: LambdaEvent<Value>,
) -> Result<LambdaReply, Error> {
    let reply =
        tokio::task::spawn_blocking(move || kernel.handle(&event.payload, &call)).await?;
    Ok(reply)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging(&LogConfig::from_env())?;

    let kernel = Arc::new(
        Kernel::builder()
            .config(KernelConfig::from_env())
            .middleware(Arc::new(TracingMiddleware))
            .middleware(Arc::new(MetricsMiddleware::new()))
            .build()?,
    );
    let call = DispatchConfig::new(hello).with_middleware(Arc::new(CallerSession::default));

    info!("hello_service ready");

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let kernel = Arc::clone(&kernel);
        let call = call.clone();
        handle_request(kernel, call, event)
    }))
    .await
}

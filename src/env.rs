use serde::Serialize;
use serde_json::Value;

use crate::error::KernelError;
use crate::runtime_config::DEFAULT_STACK_SIZE;

/// Per-invocation environment derived from the event's deployment stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Env {
    /// Deployment stage, uppercased
    pub stage: String,
    /// True when the stage is on the configured debug allow-list
    pub debug: bool,
    /// Coroutine stack size configured on the dispatching kernel, for
    /// [`Deferred::spawn_with_stack`](crate::dispatcher::Deferred::spawn_with_stack)
    #[serde(skip)]
    pub stack_size: usize,
}

impl Env {
    /// Build the environment for a stage name.
    ///
    /// `debug_stages` must already be uppercase.
    #[must_use]
    pub fn for_stage(stage: &str, debug_stages: &[String]) -> Self {
        let stage = stage.to_uppercase();
        let debug = debug_stages.iter().any(|s| *s == stage);
        Self {
            stage,
            debug,
            stack_size: DEFAULT_STACK_SIZE,
        }
    }

    #[must_use]
    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = stack_size;
        self
    }

    /// Read `requestContext.stage` from an event.
    pub fn from_event(event: &Value, debug_stages: &[String]) -> Result<Self, KernelError> {
        let stage = event
            .get("requestContext")
            .and_then(|ctx| ctx.get("stage"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                KernelError::TransformFailure(
                    "event is missing requestContext.stage".to_string(),
                )
            })?;
        Ok(Self::for_stage(stage, debug_stages))
    }
}

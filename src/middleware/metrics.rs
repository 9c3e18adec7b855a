use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{ContextValue, Middleware, MiddlewareInstance};
use crate::env::Env;
use crate::request::Request;

#[derive(Default)]
struct Counters {
    created: AtomicUsize,
    completed: AtomicUsize,
    destroyed: AtomicUsize,
    instances: AtomicUsize,
    total_latency_ns: AtomicU64,
}

/// Middleware for collecting invocation metrics
///
/// Counters are shared by every instance the middleware builds and use
/// relaxed atomics, so reads are eventually consistent.
///
/// Metrics collected:
/// - Instances built (one per invocation)
/// - `create` calls
/// - `destroy` calls
/// - Average latency between `create` and `destroy`
#[derive(Clone, Default)]
pub struct MetricsMiddleware {
    counters: Arc<Counters>,
}

impl MetricsMiddleware {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of invocations that reached this middleware's `create`
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.counters.created.load(Ordering::Relaxed)
    }

    /// Number of invocations whose `create` was followed by `destroy`
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.counters.completed.load(Ordering::Relaxed)
    }

    /// Number of `destroy` calls across all instances
    #[must_use]
    pub fn destroyed_count(&self) -> usize {
        self.counters.destroyed.load(Ordering::Relaxed)
    }

    /// Number of request-scoped instances built
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.counters.instances.load(Ordering::Relaxed)
    }

    /// Mean time between `create` and `destroy` over completed invocations;
    /// zero before the first one completes
    #[must_use]
    pub fn average_latency(&self) -> Duration {
        let count = self.completed_count() as u64;
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.counters.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }
}

struct MetricsInstance {
    counters: Arc<Counters>,
    started: Option<Instant>,
}

impl Middleware for MetricsMiddleware {
    fn instance(&self) -> Box<dyn MiddlewareInstance> {
        self.counters.instances.fetch_add(1, Ordering::Relaxed);
        Box::new(MetricsInstance {
            counters: Arc::clone(&self.counters),
            started: None,
        })
    }
}

impl MiddlewareInstance for MetricsInstance {
    fn create(&mut self, _req: &Request, _env: &Env) -> anyhow::Result<ContextValue> {
        self.counters.created.fetch_add(1, Ordering::Relaxed);
        self.started = Some(Instant::now());
        Ok(Box::new(()))
    }

    fn destroy(&mut self) {
        self.counters.destroyed.fetch_add(1, Ordering::Relaxed);
        if let Some(started) = self.started.take() {
            self.counters
                .total_latency_ns
                .fetch_add(started.elapsed().as_nanos() as u64, Ordering::Relaxed);
            self.counters.completed.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::RequestId;
    use crate::request::RequestData;
    use serde_json::{json, Map};

    fn request() -> Request {
        let data = RequestData::new(
            "/".to_string(),
            "GET".to_string(),
            Map::new(),
            json!(null),
            Map::new(),
        );
        Request::new(RequestId::new(), data)
    }

    #[test]
    fn zero_requests() {
        let metrics = MetricsMiddleware::new();
        assert_eq!(metrics.request_count(), 0);
        assert_eq!(metrics.average_latency(), Duration::from_nanos(0));
    }

    #[test]
    fn destroy_without_create_is_counted() {
        let metrics = MetricsMiddleware::new();
        let mut instance = metrics.instance();
        instance.destroy();
        assert_eq!(metrics.instance_count(), 1);
        assert_eq!(metrics.request_count(), 0);
        assert_eq!(metrics.destroyed_count(), 1);
    }

    #[test]
    fn average_ignores_in_flight_invocations() {
        let metrics = MetricsMiddleware::new();
        let req = request();
        let env = Env::for_stage("prod", &[]);

        let mut done = metrics.instance();
        done.create(&req, &env).unwrap();
        std::thread::sleep(Duration::from_millis(20));
        done.destroy();

        let mut in_flight = metrics.instance();
        in_flight.create(&req, &env).unwrap();

        assert_eq!(metrics.request_count(), 2);
        assert_eq!(metrics.completed_count(), 1);
        assert!(metrics.average_latency() >= Duration::from_millis(20));

        in_flight.destroy();
        assert_eq!(metrics.completed_count(), 2);
    }
}

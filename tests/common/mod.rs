#![allow(dead_code)]

pub mod events {
    use serde_json::{json, Value};

    /// API Gateway proxy event with the given stage, path and method
    pub fn proxy_event(stage: &str, method: &str, path: &str) -> Value {
        json!({
            "resource": "/{proxy+}",
            "path": path,
            "httpMethod": method,
            "headers": {
                "Accept": "application/json",
                "Content-Type": "application/json",
                "X-Request-Source": "tests"
            },
            "queryStringParameters": null,
            "pathParameters": { "proxy": path.trim_start_matches('/') },
            "body": null,
            "isBase64Encoded": false,
            "requestContext": {
                "stage": stage,
                "requestId": "c6af9ac6-7b61-11e6-9a41-93e8deadbeef",
                "httpMethod": method
            }
        })
    }

    /// `GET /pets` on the `prod` stage
    pub fn get_pets() -> Value {
        proxy_event("prod", "GET", "/pets")
    }

    /// `POST /pets` with a JSON body on the given stage
    pub fn post_pet(stage: &str, body: &Value) -> Value {
        let mut event = proxy_event(stage, "POST", "/pets");
        event["body"] = Value::String(body.to_string());
        event
    }
}

pub mod recording {
    use std::sync::{Arc, Mutex};

    use lambda_kernel::middleware::{ContextValue, Middleware, MiddlewareInstance};
    use lambda_kernel::{Env, Request};

    /// Shared, ordered log of middleware lifecycle calls
    #[derive(Clone, Default)]
    pub struct Journal(Arc<Mutex<Vec<String>>>);

    impl Journal {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn record(&self, entry: String) {
            self.0.lock().unwrap().push(entry);
        }

        pub fn entries(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }

        pub fn count(&self, prefix: &str) -> usize {
            self.entries()
                .iter()
                .filter(|e| e.starts_with(prefix))
                .count()
        }
    }

    #[derive(Clone, Copy, PartialEq, Eq)]
    pub enum Fault {
        None,
        FailCreate,
        PanicCreate,
        PanicDestroy,
    }

    /// Middleware whose context value is its own name, journaling
    /// `create:<name>` and `destroy:<name>`
    pub struct Recorder {
        name: &'static str,
        journal: Journal,
        fault: Fault,
    }

    impl Recorder {
        pub fn new(name: &'static str, journal: &Journal) -> Arc<Self> {
            Self::with_fault(name, journal, Fault::None)
        }

        pub fn with_fault(name: &'static str, journal: &Journal, fault: Fault) -> Arc<Self> {
            Arc::new(Self {
                name,
                journal: journal.clone(),
                fault,
            })
        }
    }

    struct RecorderInstance {
        name: &'static str,
        journal: Journal,
        fault: Fault,
    }

    impl Middleware for Recorder {
        fn instance(&self) -> Box<dyn MiddlewareInstance> {
            self.journal.record(format!("instance:{}", self.name));
            Box::new(RecorderInstance {
                name: self.name,
                journal: self.journal.clone(),
                fault: self.fault,
            })
        }
    }

    impl MiddlewareInstance for RecorderInstance {
        fn create(&mut self, req: &Request, env: &Env) -> anyhow::Result<ContextValue> {
            self.journal
                .record(format!("create:{}:{}:{}", self.name, env.stage, req.path()));
            match self.fault {
                Fault::FailCreate => anyhow::bail!("[503] {} unavailable", self.name),
                Fault::PanicCreate => panic!("{} exploded", self.name),
                _ => Ok(Box::new(self.name.to_string())),
            }
        }

        fn destroy(&mut self) {
            self.journal.record(format!("destroy:{}", self.name));
            if self.fault == Fault::PanicDestroy {
                panic!("{} failed to clean up", self.name);
            }
        }
    }
}

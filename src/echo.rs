use serde_json::json;

use crate::dispatcher::{DispatchConfig, Outcome};
use crate::env::Env;
use crate::middleware::MiddlewareValues;
use crate::request::Request;
use crate::response::Response;

/// Action that echoes the normalized request and env back as the body.
///
/// Used by the `invoke` command to show what an event turns into.
pub fn echo_action(
    req: Request,
    env: &Env,
    values: MiddlewareValues,
) -> anyhow::Result<Outcome> {
    let body = json!({
        "requestId": req.request_id().to_string(),
        "path": req.path(),
        "method": req.method(),
        "headers": req.headers().all(),
        "query": req.query().all(),
        "body": req.body_value(),
        "env": env,
        "middlewareValues": values.len(),
    });
    Ok(Response::new(body).into())
}

/// Dispatch configuration running [`echo_action`] with no extra middleware
#[must_use]
pub fn echo_config() -> DispatchConfig {
    DispatchConfig::new(echo_action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Kernel;

    #[test]
    fn echoes_request_and_env() {
        let kernel = Kernel::with_defaults().unwrap();
        let reply = kernel.handle(
            &json!({
                "path": "/echo",
                "httpMethod": "PUT",
                "headers": { "X-Trace": "abc" },
                "queryStringParameters": { "verbose": "1" },
                "body": "{\"a\":[1,2]}",
                "requestContext": { "stage": "dev" }
            }),
            &echo_config(),
        );
        assert_eq!(reply.status_code, 200);
        let body: serde_json::Value = serde_json::from_str(&reply.body).unwrap();
        assert_eq!(body["path"], "/echo");
        assert_eq!(body["method"], "PUT");
        assert_eq!(body["headers"]["X-Trace"], "abc");
        assert_eq!(body["query"]["verbose"], "1");
        assert_eq!(body["body"], json!({ "a": [1, 2] }));
        assert_eq!(body["env"], json!({ "stage": "DEV", "debug": true }));
        assert_eq!(body["middlewareValues"], 0);
    }
}

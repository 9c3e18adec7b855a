//! # Runtime Configuration Module
//!
//! Environment variable-based configuration for the kernel.
//!
//! ## Environment Variables
//!
//! ### `KERNEL_DEBUG_STAGES`
//!
//! Comma-separated deployment stages that set `env.debug`. Compared
//! case-insensitively. Default: `DEV,QA,TEST`.
//!
//! ### `KERNEL_TRANSFORMER`
//!
//! Event transformer kind. Default: `serverless`.
//!
//! ### `KERNEL_BODY_FORMAT`
//!
//! Body parser applied to the raw event body: `json` or `text`. Default: `json`.
//!
//! Unknown transformer kinds and body formats are kept as given and rejected
//! by [`KernelBuilder::build`](crate::dispatcher::KernelBuilder::build).
//!
//! ### `KERNEL_TEARDOWN`
//!
//! When middleware is torn down for actions that return a deferred value:
//! `after-settlement` (default) or `before-settlement`.
//!
//! ### `KERNEL_STACK_SIZE`
//!
//! Stack size for deferred coroutines. Each kernel passes its own value to
//! actions as [`Env::stack_size`](crate::Env) for
//! [`Deferred::spawn_with_stack`](crate::dispatcher::Deferred::spawn_with_stack);
//! the `may` runtime's global settings are never changed. Accepts decimal
//! (`65536`) or hexadecimal (`0x10000`). Default: `0x10000` (64 KB).
//!
//! ## Usage
//!
//! ```rust
//! use lambda_kernel::runtime_config::KernelConfig;
//!
//! let config = KernelConfig::from_env();
//! println!("Stack size: {} bytes", config.stack_size);
//! ```

use std::env;

use serde::Serialize;

/// Default coroutine stack size for deferred computations
pub const DEFAULT_STACK_SIZE: usize = 0x10000;

/// When request-scoped middleware is destroyed relative to a deferred result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TeardownPolicy {
    /// Destroy once the deferred value has settled and the reply is produced
    #[default]
    AfterSettlement,
    /// Destroy as soon as the action returns, before waiting on the deferred value
    BeforeSettlement,
}

impl TeardownPolicy {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "before-settlement" | "before_settlement" | "before" => {
                TeardownPolicy::BeforeSettlement
            }
            _ => TeardownPolicy::AfterSettlement,
        }
    }
}

/// Kernel configuration loaded from environment variables.
///
/// Treated as read-only once a kernel has been built from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KernelConfig {
    /// Uppercased stage names that enable `env.debug`
    pub debug_stages: Vec<String>,
    /// Transformer kind
    pub transformer: String,
    /// Body format
    pub body_format: String,
    /// Middleware teardown timing for deferred results
    pub teardown: TeardownPolicy,
    /// Stack size for deferred coroutines in bytes
    pub stack_size: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            debug_stages: vec!["DEV".into(), "QA".into(), "TEST".into()],
            transformer: "serverless".into(),
            body_format: "json".into(),
            teardown: TeardownPolicy::AfterSettlement,
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

/// Parse a decimal or `0x`-prefixed hexadecimal size.
pub fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    if let Some(hex) = val.strip_prefix("0x") {
        usize::from_str_radix(hex, 16).ok()
    } else {
        val.parse().ok()
    }
}

/// Split a comma-separated stage list, uppercasing and dropping blanks.
pub fn parse_stages(val: &str) -> Vec<String> {
    val.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_uppercase)
        .collect()
}

impl KernelConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            debug_stages: lookup("KERNEL_DEBUG_STAGES")
                .map(|v| parse_stages(&v))
                .unwrap_or(defaults.debug_stages),
            transformer: lookup("KERNEL_TRANSFORMER")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.transformer),
            body_format: lookup("KERNEL_BODY_FORMAT")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.body_format),
            teardown: lookup("KERNEL_TEARDOWN")
                .map(|v| TeardownPolicy::parse(&v))
                .unwrap_or(defaults.teardown),
            stack_size: lookup("KERNEL_STACK_SIZE")
                .and_then(|v| parse_size(&v))
                .unwrap_or(defaults.stack_size),
        }
    }
}

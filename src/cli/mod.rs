//! # CLI Module
//!
//! Local tooling for trying events against the kernel without a Lambda host.
//!
//! ## Commands
//!
//! ### `invoke`
//!
//! Dispatch an event file through the echo action and print the reply:
//!
//! ```bash
//! lambda-kernel invoke --event event.json --stage dev --pretty
//! ```
//!
//! `--stage` falls back to `KERNEL_STAGE` and replaces `requestContext.stage`.
//!
//! ### `config`
//!
//! Print the configuration read from `KERNEL_*` environment variables:
//!
//! ```bash
//! lambda-kernel config --pretty
//! ```

mod commands;


pub use commands::{invoke_event, load_event, run_cli, Cli, Commands};

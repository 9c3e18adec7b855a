use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;

use crate::dispatcher::Kernel;
use crate::echo::echo_config;
use crate::middleware::TracingMiddleware;
use crate::response::LambdaReply;
use crate::runtime_config::KernelConfig;

/// Command-line interface for the lambda kernel
#[derive(Parser, Debug)]
#[command(name = "lambda-kernel")]
#[command(about = "Run serverless events through the lambda kernel locally", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dispatch an event file through the echo action and print the reply
    Invoke {
        /// Path to the event JSON file
        #[arg(short, long)]
        event: PathBuf,

        /// Override `requestContext.stage`
        #[arg(short, long, env = "KERNEL_STAGE")]
        stage: Option<String>,

        /// Pretty-print the reply
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
    /// Print the effective kernel configuration
    Config {
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
}

/// Load an event file, applying a stage override when given.
pub fn load_event(path: &Path, stage: Option<&str>) -> anyhow::Result<Value> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read event file {}", path.display()))?;
    let mut event: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Event file {} is not valid JSON", path.display()))?;

    if let Some(stage) = stage {
        let obj = event
            .as_object_mut()
            .ok_or_else(|| anyhow::anyhow!("Event must be a JSON object"))?;
        let ctx = obj
            .entry("requestContext")
            .or_insert_with(|| Value::Object(Default::default()));
        match ctx.as_object_mut() {
            Some(ctx) => {
                ctx.insert("stage".to_string(), Value::String(stage.to_string()));
            }
            None => anyhow::bail!("requestContext must be a JSON object"),
        }
    }
    Ok(event)
}

/// Dispatch an event file through a kernel built from `config`.
pub fn invoke_event(
    config: KernelConfig,
    path: &Path,
    stage: Option<&str>,
) -> anyhow::Result<LambdaReply> {
    let event = load_event(path, stage)?;
    let kernel = Kernel::builder()
        .config(config)
        .middleware(Arc::new(TracingMiddleware))
        .build()?;
    Ok(kernel.handle(&event, &echo_config()))
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> anyhow::Result<String> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(out)
}

/// Run the parsed command, writing results to stdout.
pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Invoke {
            event,
            stage,
            pretty,
        } => {
            let reply = invoke_event(KernelConfig::from_env(), &event, stage.as_deref())?;
            println!("{}", to_json(&reply, pretty)?);
        }
        Commands::Config { pretty } => {
            println!("{}", to_json(&KernelConfig::from_env(), pretty)?);
        }
    }
    Ok(())
}

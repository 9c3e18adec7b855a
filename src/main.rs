use clap::Parser;
use lambda_kernel::cli::{run_cli, Cli};
use lambda_kernel::logging::{init_logging, LogConfig};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_env())?;
    run_cli(cli)
}

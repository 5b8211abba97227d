//! Karpor CLI main entry point

use anyhow::Result;
use clap::Parser;
use karpor_cli::{Cli, CommandExecutor};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = cli.format.clone();

    let executor = CommandExecutor::new(cli.provider_config());
    let result = executor.execute(cli.command).await?;
    for warning in &result.warnings {
        eprintln!("{}", warning);
    }

    if result.success {
        println!("{}", result.render(&format)?);
        std::process::exit(0);
    } else {
        eprintln!("{}", result.render(&format)?);
        std::process::exit(1);
    }
}

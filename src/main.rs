mod api;
mod cli;
mod config;
mod error;
mod export;
mod metrics;
mod model;
mod storage;
mod text_summary;
mod workflow;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let is_silent = args.silent;

    // RUST_LOG wins when set; otherwise stage transitions log at info.
    let default_filter = if is_silent { "error" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli::run(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            if is_silent {
                println!("{e:#}");
                std::process::exit(1);
            }
            Err(e)
        }
    }
}

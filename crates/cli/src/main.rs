use clap::Parser;
use gleaner_cache::CacheMode;
use gleaner_core::ENV_CACHE_MODE;
use std::env;

mod commands;

use commands::Commands;

#[derive(Parser)]
#[command(name = "gleaner")]
#[command(about = "Research-portfolio data-ingestion pipeline", long_about = None)]
#[command(version)]
struct Cli {
    /// Cache mode (off, read, read-write, write)
    #[arg(long, value_parser = ["off", "read", "read-write", "write"])]
    cache: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    // Make the flag visible to the cache stores before any is constructed
    if let Some(cache_mode) = cli.cache {
        if let Some(mode) = CacheMode::parse(&cache_mode) {
            env::set_var(ENV_CACHE_MODE, mode.to_string());
        }
    }

    cli.command.execute().await
}

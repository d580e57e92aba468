mod cli;
mod config;
mod http;
mod serve;

use clap::Parser;
use cli::{Cli, Commands};
use config::TripgenConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = TripgenConfig::load_or_default(&cli.config)?;
    if let Some(data_dir) = cli.data_dir {
        config.server.data_dir = data_dir;
    }
    if let Some(http_addr) = cli.http_addr {
        config.server.http_addr = http_addr;
    }

    match cli.command {
        Commands::Serve => serve::run(config).await,
        Commands::Generate(args) => cli::generate::run(args, &config).await,
        Commands::Prompt(args) => cli::generate::prompt(args),
        Commands::Trip(cmd) => cli::trip::run(cmd, &config).await,
        Commands::Config(cmd) => cli::config_cmd::run(cmd, &cli.config).await,
    }
}

use std::path::Path;

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod config;
mod env;
mod runner;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mailharvest=info".parse()?),
        )
        .init();

    env::load_env(cli.env.as_deref())?;

    match cli.command {
        Commands::Init => commands::cmd_init(Path::new(".")),
        Commands::Setup => {
            let config = config::load_config(&cli.config)?;
            commands::cmd_setup(config).await
        }
        Commands::Run { count, dry_run } => {
            let config = config::load_config(&cli.config)?;
            commands::cmd_run(config, count, dry_run).await
        }
        Commands::Status => {
            let config = config::load_config(&cli.config)?;
            commands::cmd_status(config).await
        }
    }
}

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod output;
mod settings;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ask(args) => commands::ask::run(&cli.global, args).await,
        Commands::Token(args) => commands::token::run(&cli.global, args).await,
        Commands::Context(args) => commands::context::run(&cli.global, args).await
    }
}

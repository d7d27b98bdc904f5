mod cli;
mod config;
mod server;
mod translate;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the environment and config file still apply.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("meditongue=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => server::run(args).await?,
        Commands::Translate(args) => translate::run(args).await?,
        Commands::Glossary(args) => translate::inspect_glossary(args)?,
        Commands::Config(args) => config::commands::run(args)?,
    }

    Ok(())
}

pub mod commands;

use clap::{Parser, Subcommand};

use crate::config::{AppConfig, StoreBackend};

#[derive(Parser)]
#[command(name = "myassistant-api")]
#[command(about = "Personal productivity API server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides PORT)")]
        port: Option<u16>,

        #[arg(long, help = "Store backend: postgres or memory (overrides STORE_BACKEND)")]
        store: Option<StoreBackend>,
    },

    #[command(about = "Create PostgreSQL collections and indexes, then exit")]
    Migrate,
}

pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve {
        port: None,
        store: None,
    }) {
        Commands::Serve { port, store } => commands::serve::handle(config, port, store).await,
        Commands::Migrate => commands::migrate::handle(config).await,
    }
}

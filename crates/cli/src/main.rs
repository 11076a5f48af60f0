//! SiteChat CLI — the main entry point.
//!
//! Commands:
//! - `serve`    — Start the HTTP server (chat widget + JSON API)
//! - `resolve`  — Show which knowledge a site resolves to and the prompt it yields
//! - `ask`      — Send one message through the chat pipeline
//! - `config`   — Print the effective configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "sitechat",
    about = "SiteChat — knowledge-grounded chat for websites",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config.toml (defaults to ~/.sitechat/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override the bind address
        #[arg(long)]
        host: Option<String>,
    },

    /// Show the knowledge source and system prompt for a site
    Resolve {
        /// Site to resolve (omit for the default knowledge)
        #[arg(short, long)]
        site: Option<String>,
    },

    /// Send a single message and print the reply
    Ask {
        /// The message to send
        message: String,

        /// Site whose knowledge grounds the answer
        #[arg(short, long)]
        site: Option<String>,
    },

    /// Print the effective configuration (API key redacted)
    Config {
        /// Print only the config file path
        #[arg(long)]
        path: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Serve { port, host } => commands::serve::run(config_path, port, host).await?,
        Commands::Resolve { site } => commands::resolve::run(config_path, site).await?,
        Commands::Ask { message, site } => commands::ask::run(config_path, message, site).await?,
        Commands::Config { path } => commands::config_cmd::run(config_path, path)?,
    }

    Ok(())
}

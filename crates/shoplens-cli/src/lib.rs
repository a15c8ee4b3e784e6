//! ShopLens command-line interface.

pub mod commands;

use clap::{Parser, Subcommand};

/// ShopLens - storefront analysis service
#[derive(Parser)]
#[command(name = "shoplens")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase logging verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Path to config file
    #[arg(short, long, global = true, env = "SHOPLENS_CONFIG")]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve(commands::serve::ServeArgs),

    /// Print a fresh encryption key
    Keygen,

    /// Configuration management
    Config(commands::config::ConfigArgs),

    /// Show version information
    Version,
}

/// Run the CLI with the given arguments.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Serve(args) => commands::serve::run(config_path, args).await,
        Commands::Keygen => commands::keygen::run(),
        Commands::Config(args) => commands::config::run(config_path, args),
        Commands::Version => {
            println!("shoplens {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

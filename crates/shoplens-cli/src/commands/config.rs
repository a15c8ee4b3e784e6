//! Configuration management commands.

use super::load_config;
use clap::Args;
use shoplens_core::Config;
use std::path::Path;

/// Config command arguments.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(clap::Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration, secrets redacted
    Show,

    /// Get a configuration value
    Get {
        /// Configuration key (dot-separated path)
        key: String,
    },

    /// Validate configuration
    Validate,
}

/// Run the config command.
pub fn run(path: Option<&Path>, args: ConfigArgs) -> anyhow::Result<()> {
    let config = load_config(path)?;

    match args.command {
        ConfigCommand::Show => {
            println!("{}", config.to_display_json()?);
        }

        ConfigCommand::Get { key } => match lookup(&config, &key)? {
            Some(value) => println!("{}", value),
            None => anyhow::bail!("Key not found: {}", key),
        },

        ConfigCommand::Validate => match config.validate() {
            Ok(()) => println!("Configuration is valid"),
            Err(e) => anyhow::bail!("Configuration error: {}", e),
        },
    }

    Ok(())
}

/// Pretty-printed value at a dot-separated path of the redacted config.
fn lookup(config: &Config, key: &str) -> anyhow::Result<Option<String>> {
    let json: serde_json::Value = serde_json::from_str(&config.to_display_json()?)?;
    let value = key
        .split('.')
        .try_fold(&json, |acc, k| acc.get(k));

    value
        .map(serde_json::to_string_pretty)
        .transpose()
        .map_err(Into::into)
}

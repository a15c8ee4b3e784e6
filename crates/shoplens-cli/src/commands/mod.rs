//! CLI command implementations.

pub mod config;
pub mod keygen;
pub mod serve;

use shoplens_core::{env, Config};
use std::path::Path;

/// Load `.env`, the optional config file, then environment overrides.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    env::load_dotenv().map_err(|e| anyhow::anyhow!("Failed to read .env: {}", e))?;
    Config::load_with_env(path).map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
}

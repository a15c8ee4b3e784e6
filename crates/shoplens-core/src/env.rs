//! Environment variable handling.

use std::env;

/// Get an environment variable, returning None if not set or blank.
pub fn get_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Interpret a string as a boolean flag.
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Get an environment variable as a boolean, if set.
pub fn get_bool(name: &str) -> Option<bool> {
    get_var(name).map(|v| parse_bool(&v))
}

/// Load variables from a `.env` file in the working directory.
///
/// Variables already present in the environment win over the file.
pub fn load_dotenv() -> Result<(), std::io::Error> {
    let path = std::path::Path::new(".env");
    if !path.exists() {
        return Ok(());
    }

    let content = std::fs::read_to_string(path)?;
    for (key, value) in parse_dotenv(&content) {
        if env::var(&key).is_err() {
            env::set_var(key, value);
        }
    }
    Ok(())
}

/// Parse `KEY=value` lines, skipping blanks and `#` comments.
fn parse_dotenv(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            (key.trim().to_string(), value.to_string())
        })
        .collect()
}

/// Environment variable names read by ShopLens.
pub mod vars {
    /// Cipher key for credentials at rest (hex or base64, 32 bytes).
    pub const ENCRYPTION_KEY: &str = "ENCRYPTION_KEY";

    /// Enables development conveniences such as ephemeral cipher keys.
    pub const SHOPLENS_DEV_MODE: &str = "SHOPLENS_DEV_MODE";

    /// Config file override.
    pub const SHOPLENS_CONFIG: &str = "SHOPLENS_CONFIG";

    /// Listen port.
    pub const SHOPLENS_PORT: &str = "SHOPLENS_PORT";

    /// Listen address.
    pub const SHOPLENS_BIND: &str = "SHOPLENS_BIND";

    /// Supabase project URL.
    pub const SUPABASE_URL: &str = "SUPABASE_URL";

    /// Supabase service role key.
    pub const SUPABASE_SERVICE_ROLE_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";

    /// Shared OpenAI key lent to users in their trial window.
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

    /// Model used for advice generation.
    pub const OPENAI_MODEL: &str = "OPENAI_MODEL";

    /// Operator Slack incoming webhook.
    pub const SLACK_WEBHOOK_URL: &str = "SLACK_WEBHOOK_URL";

    /// Path to the wkhtmltopdf binary.
    pub const WKHTMLTOPDF_PATH: &str = "WKHTMLTOPDF_PATH";
}

//! Configuration schema definitions.

use crate::secret::SecretString;
use serde::{Deserialize, Serialize};

/// Main ShopLens configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Backing store settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Credential encryption settings.
    #[serde(default)]
    pub crypto: CryptoConfig,

    /// Free-trial settings.
    #[serde(default)]
    pub trial: TrialConfig,

    /// Advice generation settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Outbound notification settings.
    #[serde(default)]
    pub notifications: NotificationsConfig,

    /// PDF report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable CORS.
    #[serde(default = "default_true")]
    pub cors: bool,

    /// Allowed CORS origins. Empty allows any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            cors: true,
            allowed_origins: Vec::new(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Which database backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    /// Process-local tables, lost on restart.
    #[default]
    Memory,
    /// Hosted Supabase project over its REST interface.
    Supabase,
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Backend selection.
    #[serde(default)]
    pub backend: DatabaseBackend,

    /// Supabase project URL, e.g. `https://abc.supabase.co`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supabase_url: Option<String>,

    /// Supabase service role key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_role_key: Option<SecretString>,

    /// Upper bound on a single store call.
    #[serde(default = "default_db_timeout")]
    pub timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: DatabaseBackend::Memory,
            supabase_url: None,
            service_role_key: None,
            timeout_secs: default_db_timeout(),
        }
    }
}

fn default_db_timeout() -> u64 {
    10
}

/// Credential encryption configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CryptoConfig {
    /// Cipher key, hex or base64 encoded 32 bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption_key: Option<SecretString>,

    /// Allow an ephemeral key when none is configured.
    #[serde(default)]
    pub dev_mode: bool,
}

/// Free-trial configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialConfig {
    /// Length of the trial window in days.
    #[serde(default = "default_trial_days")]
    pub period_days: u32,
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            period_days: default_trial_days(),
        }
    }
}

fn default_trial_days() -> u32 {
    30
}

/// OpenAI configuration for advice generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Operator key lent to users during their trial.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_api_key: Option<SecretString>,

    /// Chat model.
    #[serde(default = "default_model")]
    pub model: String,

    /// API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Request timeout.
    #[serde(default = "default_openai_timeout")]
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            fallback_api_key: None,
            model: default_model(),
            api_base: default_api_base(),
            timeout_secs: default_openai_timeout(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_timeout() -> u64 {
    60
}

/// Notification configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Slack incoming webhook for operator notifications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slack_webhook: Option<SecretString>,
}

/// PDF report configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// wkhtmltopdf executable.
    #[serde(default = "default_wkhtmltopdf")]
    pub wkhtmltopdf_path: String,

    /// Render timeout.
    #[serde(default = "default_render_timeout")]
    pub timeout_secs: u64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            wkhtmltopdf_path: default_wkhtmltopdf(),
            timeout_secs: default_render_timeout(),
        }
    }
}

fn default_wkhtmltopdf() -> String {
    "wkhtmltopdf".to_string()
}

fn default_render_timeout() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

//! Configuration loading, environment overrides, and validation.

use super::{Config, DatabaseBackend};
use crate::env::{self, vars};
use crate::error::ConfigError;
use crate::secret::SecretString;
use std::fs;
use std::path::Path;
use tracing::debug;

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a JSON5 string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Json5(e.to_string()))
    }

    /// Load the optional config file, then apply environment overrides.
    pub fn load_with_env(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                debug!(path = %path.display(), "loading config file");
                Self::load(path)?
            }
            None => Self::default(),
        };
        config.apply_env_from(env::get_var)?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production).
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(vars::ENCRYPTION_KEY) {
            self.crypto.encryption_key = Some(SecretString::new(key));
        }
        if let Some(flag) = lookup(vars::SHOPLENS_DEV_MODE) {
            self.crypto.dev_mode = env::parse_bool(&flag);
        }

        if let Some(bind) = lookup(vars::SHOPLENS_BIND) {
            self.server.bind = bind;
        }
        if let Some(port) = lookup(vars::SHOPLENS_PORT) {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: vars::SHOPLENS_PORT.to_string(),
                value: port.clone(),
            })?;
        }

        if let Some(url) = lookup(vars::SUPABASE_URL) {
            self.database.supabase_url = Some(url);
            self.database.backend = DatabaseBackend::Supabase;
        }
        if let Some(key) = lookup(vars::SUPABASE_SERVICE_ROLE_KEY) {
            self.database.service_role_key = Some(SecretString::new(key));
        }

        if let Some(key) = lookup(vars::OPENAI_API_KEY) {
            self.openai.fallback_api_key = Some(SecretString::new(key));
        }
        if let Some(model) = lookup(vars::OPENAI_MODEL) {
            self.openai.model = model;
        }

        if let Some(webhook) = lookup(vars::SLACK_WEBHOOK_URL) {
            self.notifications.slack_webhook = Some(SecretString::new(webhook));
        }
        if let Some(path) = lookup(vars::WKHTMLTOPDF_PATH) {
            self.report.wkhtmltopdf_path = path;
        }

        Ok(())
    }

    /// Serialize to a pretty JSON string with secrets redacted.
    pub fn to_display_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate the configuration, collecting all errors before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push("Server port cannot be 0".to_string());
        }

        if self.database.timeout_secs == 0 {
            errors.push("Database timeout must be greater than 0".to_string());
        }

        if self.database.backend == DatabaseBackend::Supabase {
            match self.database.supabase_url.as_deref() {
                None => errors.push("Supabase backend selected but supabase_url is not set".to_string()),
                Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                    errors.push(format!("Invalid supabase_url '{}', expected http(s) URL", url));
                }
                Some(_) => {}
            }
            if self.database.service_role_key.is_none() {
                errors.push(
                    "Supabase backend selected but service_role_key is not set".to_string(),
                );
            }
        }

        if self.crypto.encryption_key.is_none() && !self.crypto.dev_mode {
            errors.push(format!(
                "No encryption key configured; set {} or enable dev mode",
                vars::ENCRYPTION_KEY
            ));
        }

        if self.trial.period_days == 0 {
            errors.push("Trial period must be at least one day".to_string());
        }

        if self.openai.model.trim().is_empty() {
            errors.push("OpenAI model must not be empty".to_string());
        }

        if self.report.timeout_secs == 0 {
            errors.push("Report render timeout must be greater than 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }
}

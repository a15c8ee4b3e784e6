//! Serve command.

use super::load_config;
use clap::Args;
use shoplens_core::Config;
use shoplens_gateway::{
    AppState, Gateway, NullNotifier, Notifier, OpenAiAdvisor, SlackNotifier, WkhtmltopdfRenderer,
};
use shoplens_secrets::{resolve_master_key, CredentialCipher};
use shoplens_store::{db, HistoryStore, SettingsStore, TrialGate};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Serve command arguments.
#[derive(Args)]
pub struct ServeArgs {
    /// Listen address
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Listen port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Allow an ephemeral encryption key and in-memory defaults
    #[arg(long)]
    pub dev: bool,
}

/// Run the serve command.
pub async fn run(path: Option<&Path>, args: ServeArgs) -> anyhow::Result<()> {
    let mut config = load_config(path)?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.dev {
        config.crypto.dev_mode = true;
    }

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    let state = build_state(&config).await?;
    Gateway::new(config.server.clone(), state).run().await?;
    Ok(())
}

/// Resolve the master key and wire every service.
///
/// The key is settled here, before the server accepts a request.
pub async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let key = resolve_master_key(config.crypto.encryption_key.as_ref(), config.crypto.dev_mode)
        .map_err(|e| anyhow::anyhow!("Encryption key error: {}", e))?;
    let cipher = CredentialCipher::new(key);

    let db = db::connect(&config.database)?;
    match db.ping().await {
        Ok(()) => info!(backend = db.backend_name(), "database reachable"),
        Err(e) => warn!(backend = db.backend_name(), "database not reachable at startup: {}", e),
    }

    let trial = TrialGate::new(db.clone(), config.trial.period_days);
    let settings = SettingsStore::new(db.clone(), cipher, trial)
        .with_fallback_openai_key(config.openai.fallback_api_key.clone());
    if config.openai.fallback_api_key.is_none() {
        info!("no operator OpenAI key configured; trial users get no fallback key");
    }

    let notifier: Arc<dyn Notifier> = match &config.notifications.slack_webhook {
        Some(webhook) => Arc::new(SlackNotifier::new(webhook.clone())?),
        None => Arc::new(NullNotifier),
    };

    Ok(AppState {
        db: db.clone(),
        settings,
        history: HistoryStore::new(db),
        advisor: Arc::new(OpenAiAdvisor::new(&config.openai)?),
        notifier,
        renderer: Arc::new(WkhtmltopdfRenderer::new(&config.report)),
    })
}

//! Per-user third-party credentials.
//!
//! Secrets are encrypted before they reach the database and are only ever
//! decrypted by [`SettingsStore::resolve_secret`]. Reads return a presence
//! marker instead of the value.

use crate::db::Database;
use crate::error::StoreError;
use crate::model::{CredentialKind, SettingsPatch, SettingsRow};
use crate::trial::{TrialGate, TrialOutcome};
use crate::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shoplens_core::SecretString;
use shoplens_secrets::CredentialCipher;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Returned in place of a secret that is set.
pub const SECRET_SET_MARKER: &str = "API_KEY_SET";

/// Settings as submitted by a client. Every credential field is optional;
/// an absent or empty field leaves the stored value unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserSettings {
    pub user_id: String,
    #[serde(default)]
    pub openai_key: Option<SecretString>,
    #[serde(default)]
    pub notion_token: Option<SecretString>,
    #[serde(default)]
    pub notion_database_id: Option<String>,
    #[serde(default)]
    pub slack_webhook: Option<SecretString>,
}

/// Settings as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct MaskedSettings {
    pub openai_key: String,
    pub notion_token: String,
    pub notion_database_id: String,
    pub slack_webhook: String,
    pub trial_days_left: u32,
    pub is_trial_active: bool,

    /// Full trial outcome, including whether it was a permissive default.
    #[serde(skip)]
    pub trial: TrialOutcome,
}

/// Outcome of a settings write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The row was written.
    Persisted,
    /// The write was accepted but not stored.
    Degraded { reason: String },
}

impl WriteOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

/// Reads, writes and resolves per-user credentials.
#[derive(Clone)]
pub struct SettingsStore {
    db: Arc<dyn Database>,
    cipher: CredentialCipher,
    trial: TrialGate,
    fallback_openai_key: Option<SecretString>,
}

impl SettingsStore {
    pub fn new(db: Arc<dyn Database>, cipher: CredentialCipher, trial: TrialGate) -> Self {
        Self {
            db,
            cipher,
            trial,
            fallback_openai_key: None,
        }
    }

    /// Set the operator key lent to users during their trial.
    pub fn with_fallback_openai_key(mut self, key: Option<SecretString>) -> Self {
        self.fallback_openai_key = key.filter(|k| !k.is_empty());
        self
    }

    pub fn trial_gate(&self) -> &TrialGate {
        &self.trial
    }

    /// Masked settings plus trial state.
    pub async fn read(&self, user_id: &str) -> Result<MaskedSettings> {
        validate_user_id(user_id)?;

        let trial = self.trial.check(user_id).await;
        let row = self.db.get_settings(user_id).await?.unwrap_or_default();

        let mask = |kind: CredentialKind| {
            row.field(kind)
                .map(|_| SECRET_SET_MARKER.to_string())
                .unwrap_or_default()
        };

        let info = trial.info();
        Ok(MaskedSettings {
            openai_key: mask(CredentialKind::OpenAiKey),
            notion_token: mask(CredentialKind::NotionToken),
            notion_database_id: row
                .field(CredentialKind::NotionDatabaseId)
                .unwrap_or_default()
                .to_string(),
            slack_webhook: mask(CredentialKind::SlackWebhook),
            trial_days_left: info.trial_days_left,
            is_trial_active: info.is_trial_active,
            trial,
        })
    }

    /// Encrypt and upsert the provided fields.
    ///
    /// Only an invalid `user_id` is an error. Encryption or store failures
    /// come back as [`WriteOutcome::Degraded`].
    pub async fn write(&self, settings: UserSettings) -> Result<WriteOutcome> {
        validate_user_id(&settings.user_id)?;

        let patch = match self.build_patch(&settings) {
            Ok(patch) => patch,
            Err(e) => return Ok(degraded(&settings.user_id, e)),
        };

        let exists = match self.db.get_settings(&settings.user_id).await {
            Ok(row) => row.is_some(),
            Err(e) => {
                warn!(user_id = %settings.user_id, "could not check existing settings: {e}");
                false
            }
        };

        let result = if exists {
            self.db.update_settings(&settings.user_id, &patch).await
        } else {
            self.db
                .insert_settings(patch.into_row(&settings.user_id))
                .await
        };

        match result {
            Ok(()) => {
                info!(user_id = %settings.user_id, updated = exists, "settings saved");
                Ok(WriteOutcome::Persisted)
            }
            Err(e) => Ok(degraded(&settings.user_id, e)),
        }
    }

    fn build_patch(&self, settings: &UserSettings) -> Result<SettingsPatch> {
        let seal = |value: &Option<SecretString>| -> Result<Option<String>> {
            match value.as_ref().filter(|v| !v.is_empty()) {
                Some(secret) => Ok(Some(self.cipher.encrypt(secret.expose_secret())?)),
                None => Ok(None),
            }
        };

        Ok(SettingsPatch {
            openai_key: seal(&settings.openai_key)?,
            notion_token: seal(&settings.notion_token)?,
            notion_database_id: settings
                .notion_database_id
                .clone()
                .filter(|v| !v.is_empty()),
            slack_webhook: seal(&settings.slack_webhook)?,
            updated_at: Utc::now(),
        })
    }

    /// Plaintext value of a stored field, for outbound use.
    ///
    /// For `openai_key`, a user with no usable key of their own borrows the
    /// operator key while their trial is active.
    pub async fn resolve_secret(
        &self,
        user_id: &str,
        kind: CredentialKind,
    ) -> Result<Option<SecretString>> {
        validate_user_id(user_id)?;

        let row = self.db.get_settings(user_id).await?;
        let stored = row.as_ref().and_then(|r| r.field(kind));

        let personal = match stored {
            Some(value) if kind.is_secret() => self.cipher.decrypt(value),
            Some(value) => Some(SecretString::new(value)),
            None => None,
        };
        if personal.is_some() {
            debug!(user_id, %kind, "resolved personal credential");
            return Ok(personal);
        }
        if stored.is_some() {
            warn!(user_id, %kind, "stored credential could not be decrypted");
        }

        if kind != CredentialKind::OpenAiKey {
            return Ok(None);
        }
        let Some(fallback) = &self.fallback_openai_key else {
            return Ok(None);
        };

        let trial = self.trial.check(user_id).await;
        if trial.is_active() {
            debug!(user_id, degraded = trial.is_degraded(), "lending shared OpenAI key to trial user");
            Ok(Some(fallback.clone()))
        } else {
            Ok(None)
        }
    }
}

fn validate_user_id(user_id: &str) -> Result<()> {
    if user_id.trim().is_empty() {
        return Err(StoreError::Validation("user_id must not be empty".to_string()));
    }
    Ok(())
}

fn degraded(user_id: &str, error: StoreError) -> WriteOutcome {
    warn!(user_id, "settings not persisted, continuing in degraded mode: {error}");
    WriteOutcome::Degraded {
        reason: error.to_string(),
    }
}

//! Row types for the hosted tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;

/// A row of the `users` table, reduced to what the trial gate reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,

    /// Account creation time as stored. Kept as text so that unparseable
    /// values reach the trial gate instead of failing deserialization.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// The per-user settings fields a client may set or read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKind {
    OpenAiKey,
    NotionToken,
    NotionDatabaseId,
    SlackWebhook,
}

impl CredentialKind {
    pub const ALL: [CredentialKind; 4] = [
        Self::OpenAiKey,
        Self::NotionToken,
        Self::NotionDatabaseId,
        Self::SlackWebhook,
    ];

    /// Column name, also used as the `key_type` path segment.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAiKey => "openai_key",
            Self::NotionToken => "notion_token",
            Self::NotionDatabaseId => "notion_database_id",
            Self::SlackWebhook => "slack_webhook",
        }
    }

    /// Whether the field is encrypted at rest and masked on read.
    pub fn is_secret(&self) -> bool {
        !matches!(self, Self::NotionDatabaseId)
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CredentialKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| StoreError::Validation(format!("unknown key type: {s}")))
    }
}

/// A `user_settings` row as persisted. Secret columns hold ciphertext.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsRow {
    pub user_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notion_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notion_database_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack_webhook: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SettingsRow {
    /// The stored value of one column, ignoring empty strings.
    pub fn field(&self, kind: CredentialKind) -> Option<&str> {
        let value = match kind {
            CredentialKind::OpenAiKey => &self.openai_key,
            CredentialKind::NotionToken => &self.notion_token,
            CredentialKind::NotionDatabaseId => &self.notion_database_id,
            CredentialKind::SlackWebhook => &self.slack_webhook,
        };
        value.as_deref().filter(|v| !v.is_empty())
    }

    /// Overwrite the columns present in `patch`.
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(v) = &patch.openai_key {
            self.openai_key = Some(v.clone());
        }
        if let Some(v) = &patch.notion_token {
            self.notion_token = Some(v.clone());
        }
        if let Some(v) = &patch.notion_database_id {
            self.notion_database_id = Some(v.clone());
        }
        if let Some(v) = &patch.slack_webhook {
            self.slack_webhook = Some(v.clone());
        }
        self.updated_at = Some(patch.updated_at);
    }
}

/// A partial update of a `user_settings` row. Absent columns are left as
/// they are.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notion_token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notion_database_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub slack_webhook: Option<String>,

    pub updated_at: DateTime<Utc>,
}

impl SettingsPatch {
    /// Turn the patch into a fresh row created at `updated_at`.
    pub fn into_row(self, user_id: &str) -> SettingsRow {
        SettingsRow {
            user_id: user_id.to_string(),
            openai_key: self.openai_key,
            notion_token: self.notion_token,
            notion_database_id: self.notion_database_id,
            slack_webhook: self.slack_webhook,
            created_at: Some(self.updated_at),
            updated_at: Some(self.updated_at),
        }
    }
}

/// Five-axis storefront diagnosis, each on a 0 to 100 scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticScores {
    #[serde(default)]
    pub sns_score: f64,
    #[serde(default)]
    pub structure_score: f64,
    #[serde(default)]
    pub ux_score: f64,
    #[serde(default)]
    pub app_score: f64,
    #[serde(default)]
    pub theme_score: f64,
}

/// A saved analysis, as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisHistoryItem {
    pub id: String,
    pub url: String,
    pub analyzed_at: DateTime<Utc>,
    #[serde(default)]
    pub product_count: u32,
    #[serde(default)]
    pub category_count: u32,
    #[serde(default)]
    pub price_count: u32,
    #[serde(default)]
    pub has_advice: bool,
    #[serde(default)]
    pub advice_summary: Option<String>,
    #[serde(default)]
    pub notion_page_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub summary_json: serde_json::Value,
    #[serde(default)]
    pub diagnostic_scores: Option<DiagnosticScores>,
}

/// An `analysis_history` row: the item plus its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub user_email: String,
    #[serde(flatten)]
    pub item: AnalysisHistoryItem,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_kind_parse() {
        assert_eq!(
            "openai_key".parse::<CredentialKind>().unwrap(),
            CredentialKind::OpenAiKey
        );
        assert_eq!(
            "notion_database_id".parse::<CredentialKind>().unwrap(),
            CredentialKind::NotionDatabaseId
        );
        assert!("password".parse::<CredentialKind>().is_err());
    }

    #[test]
    fn test_only_database_id_is_plaintext() {
        let plain: Vec<_> = CredentialKind::ALL
            .into_iter()
            .filter(|k| !k.is_secret())
            .collect();
        assert_eq!(plain, vec![CredentialKind::NotionDatabaseId]);
    }

    #[test]
    fn test_patch_serializes_only_present_fields() {
        let patch = SettingsPatch {
            openai_key: None,
            notion_token: None,
            notion_database_id: None,
            slack_webhook: Some("cipher".into()),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&patch).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("slack_webhook"));
        assert!(obj.contains_key("updated_at"));
        assert!(!obj.contains_key("openai_key"));
    }

    #[test]
    fn test_apply_keeps_untouched_fields() {
        let mut row = SettingsRow {
            user_id: "u1".into(),
            openai_key: Some("old-cipher".into()),
            ..Default::default()
        };
        row.apply(&SettingsPatch {
            openai_key: None,
            notion_token: None,
            notion_database_id: Some("db-1".into()),
            slack_webhook: None,
            updated_at: Utc::now(),
        });
        assert_eq!(row.field(CredentialKind::OpenAiKey), Some("old-cipher"));
        assert_eq!(row.field(CredentialKind::NotionDatabaseId), Some("db-1"));
        assert_eq!(row.field(CredentialKind::SlackWebhook), None);
    }

    #[test]
    fn test_history_record_flattens_item() {
        let record = HistoryRecord {
            user_email: "a@example.com".into(),
            item: AnalysisHistoryItem {
                id: "h1".into(),
                url: "https://shop.example.com".into(),
                analyzed_at: Utc::now(),
                product_count: 2,
                category_count: 1,
                price_count: 2,
                has_advice: false,
                advice_summary: None,
                notion_page_url: None,
                tags: vec!["EC分析".into()],
                summary_json: serde_json::json!({}),
                diagnostic_scores: None,
            },
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["user_email"], "a@example.com");
        assert_eq!(json["product_count"], 2);

        let back: HistoryRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}

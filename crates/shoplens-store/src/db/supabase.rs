//! Supabase backend over the PostgREST interface.

use super::Database;
use crate::error::StoreError;
use crate::model::{HistoryRecord, SettingsPatch, SettingsRow, UserRecord};
use crate::Result;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shoplens_core::SecretString;
use tracing::debug;

const USERS: &str = "users";
const USER_SETTINGS: &str = "user_settings";
const ANALYSIS_HISTORY: &str = "analysis_history";

/// Database backed by a hosted Supabase project.
///
/// Authenticates with the service role key, so row-level security does not
/// apply; callers are trusted.
pub struct SupabaseDatabase {
    client: Client,
    rest_base: String,
    service_key: SecretString,
}

impl SupabaseDatabase {
    /// Create a client for the project at `project_url`.
    pub fn new(project_url: &str, service_key: SecretString) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| StoreError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            rest_base: format!("{}/rest/v1", project_url.trim_end_matches('/')),
            service_key,
        })
    }

    fn table(&self, table: &str) -> String {
        format!("{}/{}", self.rest_base, table)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let key = self.service_key.expose_secret();
        request
            .header("apikey", key)
            .header("Authorization", format!("Bearer {}", key))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(StoreError::Backend {
            status: status.as_u16(),
            message,
        })
    }

    async fn fetch_rows<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Vec<T>> {
        let body = self.send(request).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Render tags as a PostgREST array literal for the `cs` operator.
fn array_literal(tags: &[String]) -> String {
    let quoted: Vec<String> = tags
        .iter()
        .map(|t| format!("\"{}\"", t.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect();
    format!("{{{}}}", quoted.join(","))
}

#[async_trait]
impl Database for SupabaseDatabase {
    fn backend_name(&self) -> &'static str {
        "supabase"
    }

    async fn ping(&self) -> Result<()> {
        let request = self
            .client
            .get(self.table(USERS))
            .query(&[("select", "id"), ("limit", "1")]);
        self.send(request).await.map(|_| ())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>> {
        debug!(user_id, "fetching account");
        let request = self.client.get(self.table(USERS)).query(&[
            ("select", "id,created_at".to_string()),
            ("id", format!("eq.{}", user_id)),
        ]);
        let rows: Vec<UserRecord> = self.fetch_rows(request).await?;
        Ok(rows.into_iter().next())
    }

    async fn get_settings(&self, user_id: &str) -> Result<Option<SettingsRow>> {
        debug!(user_id, "fetching settings");
        let request = self.client.get(self.table(USER_SETTINGS)).query(&[
            ("select", "*".to_string()),
            ("user_id", format!("eq.{}", user_id)),
        ]);
        let rows: Vec<SettingsRow> = self.fetch_rows(request).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_settings(&self, row: SettingsRow) -> Result<()> {
        debug!(user_id = %row.user_id, "inserting settings");
        let request = self
            .client
            .post(self.table(USER_SETTINGS))
            .header("Prefer", "return=representation")
            .json(&row);
        self.send(request).await.map(|_| ())
    }

    async fn update_settings(&self, user_id: &str, patch: &SettingsPatch) -> Result<()> {
        debug!(user_id, "updating settings");
        let request = self
            .client
            .patch(self.table(USER_SETTINGS))
            .query(&[("user_id", format!("eq.{}", user_id))])
            .header("Prefer", "return=representation")
            .json(patch);
        self.send(request).await.map(|_| ())
    }

    async fn insert_history(&self, record: HistoryRecord) -> Result<()> {
        debug!(id = %record.item.id, "inserting history");
        let request = self
            .client
            .post(self.table(ANALYSIS_HISTORY))
            .header("Prefer", "return=representation")
            .json(&record);
        self.send(request).await.map(|_| ())
    }

    async fn list_history(&self, user_email: &str, tags: &[String]) -> Result<Vec<HistoryRecord>> {
        let mut query = vec![
            ("select", "*".to_string()),
            ("user_email", format!("eq.{}", user_email)),
            ("order", "analyzed_at.desc".to_string()),
        ];
        if !tags.is_empty() {
            query.push(("tags", format!("cs.{}", array_literal(tags))));
        }

        let request = self.client.get(self.table(ANALYSIS_HISTORY)).query(&query);
        self.fetch_rows(request).await
    }
}

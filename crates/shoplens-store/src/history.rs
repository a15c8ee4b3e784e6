//! Append-only analysis history.

use crate::analysis::{advice_summary, AnalysisResult};
use crate::db::Database;
use crate::error::StoreError;
use crate::model::{AnalysisHistoryItem, HistoryRecord};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Body of a save request.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveHistoryRequest {
    pub url: String,
    pub analysis_result: Value,
    #[serde(default)]
    pub user_email: Option<String>,
}

/// Saves and lists analysis summaries per owner.
#[derive(Clone)]
pub struct HistoryStore {
    db: Arc<dyn Database>,
}

impl HistoryStore {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Derive the summary fields and append a row. Returns the stored item.
    pub async fn save(&self, request: SaveHistoryRequest) -> Result<AnalysisHistoryItem> {
        self.save_at(request, Utc::now()).await
    }

    pub async fn save_at(
        &self,
        request: SaveHistoryRequest,
        analyzed_at: DateTime<Utc>,
    ) -> Result<AnalysisHistoryItem> {
        let user_email = request
            .user_email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| StoreError::Validation("user_email is required".to_string()))?
            .to_string();
        let url = request.url.trim();
        if url.is_empty() {
            return Err(StoreError::Validation("url must not be empty".to_string()));
        }
        if !request.analysis_result.is_object() {
            return Err(StoreError::Validation(
                "analysis_result must be an object".to_string(),
            ));
        }

        let item = summarize(url, request.analysis_result, analyzed_at);
        debug!(id = %item.id, tags = item.tags.len(), "saving analysis");

        self.db
            .insert_history(HistoryRecord {
                user_email,
                item: item.clone(),
            })
            .await?;

        info!(id = %item.id, url = %item.url, "analysis saved");
        Ok(item)
    }

    /// Items for `user_email` carrying every tag in `tags`, newest first.
    pub async fn list(&self, user_email: &str, tags: &[String]) -> Result<Vec<AnalysisHistoryItem>> {
        let user_email = user_email.trim();
        if user_email.is_empty() {
            return Err(StoreError::Validation("user_email is required".to_string()));
        }

        let tags: Vec<String> = tags
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        let records = self.db.list_history(user_email, &tags).await?;
        Ok(records.into_iter().map(|r| r.item).collect())
    }
}

/// Build the stored item for one analysis.
fn summarize(url: &str, raw: Value, analyzed_at: DateTime<Utc>) -> AnalysisHistoryItem {
    let analysis = AnalysisResult::from_value(&raw);
    let advice = analysis.advice();

    AnalysisHistoryItem {
        id: Uuid::new_v4().to_string(),
        url: url.to_string(),
        analyzed_at,
        product_count: analysis.product_names.len() as u32,
        category_count: analysis.category_links.len() as u32,
        price_count: analysis.prices.len() as u32,
        has_advice: advice.is_some(),
        advice_summary: advice.map(advice_summary),
        notion_page_url: analysis.notion_page_url.clone().filter(|u| !u.is_empty()),
        tags: analysis.tags_or_generated(url),
        diagnostic_scores: Some(analysis.scores_or_computed()),
        summary_json: raw,
    }
}

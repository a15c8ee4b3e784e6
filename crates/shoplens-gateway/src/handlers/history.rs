use super::json_body;
use crate::error::GatewayError;
use crate::notify::saved_analysis_message;
use crate::server::AppState;
use crate::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use shoplens_store::SaveHistoryRequest;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub user_email: Option<String>,
    /// Comma-separated tag filter.
    #[serde(default)]
    pub tags: Option<String>,
}

pub async fn save_history(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<SaveHistoryRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let request = json_body(payload)?;
    let item = state.history.save(request).await?;

    let notifier = state.notifier.clone();
    let text = saved_analysis_message(&item);
    tokio::spawn(async move {
        if let Err(e) = notifier.notify(&text).await {
            warn!("saved-analysis notification failed: {e}");
        }
    });

    Ok(Json(json!({ "id": item.id, "status": "success" })))
}

pub async fn list_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Value>> {
    let user_email = query
        .user_email
        .ok_or_else(|| GatewayError::InvalidRequest("user_email is required".to_string()))?;
    let tags: Vec<String> = query
        .tags
        .as_deref()
        .map(|t| t.split(',').map(str::to_string).collect())
        .unwrap_or_default();

    let items = state.history.list(&user_email, &tags).await?;
    Ok(Json(json!({ "items": items, "status": "success" })))
}

use super::json_body;
use crate::advice::ADVICE_UNAVAILABLE;
use crate::error::GatewayError;
use crate::report::{render_html, report_filename};
use crate::server::AppState;
use crate::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, Value};
use shoplens_store::analysis::AnalysisResult;
use shoplens_store::CredentialKind;
use std::sync::Arc;
use tracing::{info, warn};

/// An analysis result plus the report's subject and requester.
#[derive(Debug, Deserialize)]
pub struct GeneratePdfRequest {
    pub url: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(flatten)]
    pub analysis: Map<String, Value>,
}

pub async fn generate_pdf(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<GeneratePdfRequest>, JsonRejection>,
) -> Result<Response> {
    let request = json_body(payload)?;
    let url = request.url.trim();
    if url.is_empty() {
        return Err(GatewayError::InvalidRequest("url must not be empty".to_string()));
    }

    let analysis = AnalysisResult::from_value(&Value::Object(request.analysis));
    let advice = match analysis.advice() {
        Some(advice) => advice.to_string(),
        None => generate_advice(&state, request.user_id.as_deref(), url, &analysis).await,
    };

    let now = Utc::now();
    let html = render_html(url, &analysis, &advice, now).into_string();
    let pdf = state
        .renderer
        .render(&html)
        .await
        .map_err(|e| GatewayError::Render(e.to_string()))?;

    let filename = report_filename(now);
    info!(url, bytes = pdf.len(), "report generated");

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={filename}"),
            ),
        ],
        pdf,
    )
        .into_response())
}

/// Advice from the user's resolved OpenAI key, or the placeholder.
async fn generate_advice(
    state: &AppState,
    user_id: Option<&str>,
    url: &str,
    analysis: &AnalysisResult,
) -> String {
    let Some(user_id) = user_id.filter(|u| !u.trim().is_empty()) else {
        return ADVICE_UNAVAILABLE.to_string();
    };

    let key = match state
        .settings
        .resolve_secret(user_id, CredentialKind::OpenAiKey)
        .await
    {
        Ok(Some(key)) => key,
        Ok(None) => {
            warn!(user_id, "no OpenAI key available for advice");
            return ADVICE_UNAVAILABLE.to_string();
        }
        Err(e) => {
            warn!(user_id, "could not resolve OpenAI key: {e}");
            return ADVICE_UNAVAILABLE.to_string();
        }
    };

    match state.advisor.generate(&key, url, analysis).await {
        Ok(advice) => advice,
        Err(e) => {
            warn!(user_id, "advice generation failed: {e}");
            ADVICE_UNAVAILABLE.to_string()
        }
    }
}

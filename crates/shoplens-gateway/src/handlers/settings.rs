use super::json_body;
use crate::error::GatewayError;
use crate::server::AppState;
use crate::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};
use shoplens_store::{CredentialKind, MaskedSettings, UserSettings, WriteOutcome};
use std::sync::Arc;

pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<MaskedSettings>> {
    Ok(Json(state.settings.read(&user_id).await?))
}

pub async fn save_settings(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<UserSettings>, JsonRejection>,
) -> Result<Json<Value>> {
    let settings = json_body(payload)?;

    let body = match state.settings.write(settings).await? {
        WriteOutcome::Persisted => json!({ "success": true }),
        WriteOutcome::Degraded { .. } => json!({ "success": true, "dev_mode": true }),
    };
    Ok(Json(body))
}

/// Plaintext credential for outbound use by the caller.
pub async fn get_api_key(
    State(state): State<Arc<AppState>>,
    Path((user_id, key_type)): Path<(String, String)>,
) -> Result<Json<Value>> {
    let kind: CredentialKind = key_type.parse()?;

    match state.settings.resolve_secret(&user_id, kind).await? {
        Some(secret) => Ok(Json(json!({ "key": secret.expose_secret() }))),
        None => Err(GatewayError::NotFound(format!("{kind} is not set"))),
    }
}

use crate::server::AppState;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Welcome to the ShopLens API",
        "status": "operational",
    }))
}

/// Liveness plus a database reachability probe.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let database = match state.db.ping().await {
        Ok(()) => "ok",
        Err(e) => {
            warn!("health check could not reach the database: {e}");
            "unreachable"
        }
    };

    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "database": {
            "backend": state.db.backend_name(),
            "status": database,
        },
    }))
}

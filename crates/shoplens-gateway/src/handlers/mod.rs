//! HTTP request handlers.

mod health;
mod history;
mod pdf;
mod settings;

pub use health::{health, root};
pub use history::{list_history, save_history};
pub use pdf::generate_pdf;
pub use settings::{get_api_key, get_settings, save_settings};

use crate::error::GatewayError;
use crate::Result;
use axum::extract::rejection::JsonRejection;
use axum::Json;

/// Unwrap a JSON body, turning extractor rejections into `400`s with the
/// usual error shape.
pub(crate) fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| GatewayError::InvalidRequest(e.body_text()))
}

//! Gateway error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use shoplens_store::StoreError;
use thiserror::Error;
use tracing::{error, warn};

/// Errors that can occur in the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Not found error.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Store error.
    #[error(transparent)]
    Store(StoreError),

    /// The PDF renderer failed.
    #[error("Report rendering failed: {0}")]
    Render(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for GatewayError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Validation(msg) => Self::InvalidRequest(msg),
            other => Self::Store(other),
        }
    }
}

impl GatewayError {
    /// HTTP status for the error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(
                StoreError::Http(_) | StoreError::Backend { .. } | StoreError::Timeout(_),
            ) => StatusCode::BAD_GATEWAY,
            Self::Render(_) => StatusCode::BAD_GATEWAY,
            Self::Io(_) | Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::NotFound(_) => "not_found",
            Self::Store(
                StoreError::Http(_) | StoreError::Backend { .. } | StoreError::Timeout(_),
            ) => "store_unavailable",
            Self::Store(_) => "store_error",
            Self::Render(_) => "render_failed",
            Self::Io(_) | Self::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = self.code(), "request failed: {self}");
        } else {
            warn!(code = self.code(), "request rejected: {self}");
        }

        let body = Json(serde_json::json!({
            "error": self.to_string(),
            "code": self.code(),
        }));
        (status, body).into_response()
    }
}

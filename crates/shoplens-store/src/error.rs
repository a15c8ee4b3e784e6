//! Store error types.

use thiserror::Error;

/// Errors that can occur while talking to the backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backend answered with a non-success status.
    #[error("Backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    /// The call did not finish within the configured bound.
    #[error("Store call timed out after {0}s")]
    Timeout(u64),

    /// Malformed caller input.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Encryption error.
    #[error("Encryption error: {0}")]
    Encryption(#[from] shoplens_secrets::SecretError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Whether the error came from the caller rather than the store.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

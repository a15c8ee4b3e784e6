//! Error types for credential encryption.

use thiserror::Error;

/// Errors that can occur during key resolution or encryption.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("No encryption key configured and dev mode is disabled")]
    MissingKey,
}

/// Convenience result alias for secret operations.
pub type Result<T> = std::result::Result<T, SecretError>;

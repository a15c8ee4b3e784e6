//! Credential encryption for ShopLens.
//!
//! Third-party credentials (OpenAI keys, Notion tokens, Slack webhooks) are
//! encrypted at rest with AES-256-GCM. The master key is resolved once at
//! startup through a [`KeySource`] and shared by every request afterwards.

pub mod cipher;
pub mod crypto;
pub mod error;
pub mod keysource;

pub use cipher::CredentialCipher;
pub use error::{Result, SecretError};
pub use keysource::{resolve_master_key, ConfiguredKey, EphemeralKey, KeySource, MasterKey};

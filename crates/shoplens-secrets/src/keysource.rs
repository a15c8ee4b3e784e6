//! Master key resolution.
//!
//! The cipher key is resolved exactly once, at startup, through a
//! [`KeySource`]:
//!
//! 1. [`ConfiguredKey`]: the operator-provided `ENCRYPTION_KEY` (hex or
//!    base64 encoding of 32 bytes). Use the same value on every instance.
//! 2. [`EphemeralKey`]: a random key that lives only as long as the process.
//!    Only permitted in dev mode, because everything encrypted under it
//!    becomes unreadable after a restart.

use std::fmt;

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use shoplens_core::SecretString;
use tracing::{debug, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::{self, KEY_SIZE};
use crate::error::{Result, SecretError};

/// A validated 256-bit master key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey([u8; KEY_SIZE]);

impl MasterKey {
    /// Wrap raw key bytes after checking they can drive the cipher.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        crypto::validate_master_key(bytes)?;
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    /// Generate a fresh random key.
    pub fn generate() -> Self {
        Self(crypto::generate_master_key())
    }

    /// Decode a hex or base64 (standard or URL-safe) key string.
    pub fn decode(encoded: &str) -> Result<Self> {
        let encoded = encoded.trim();
        if encoded.is_empty() {
            return Err(SecretError::InvalidKey("key is empty".to_string()));
        }

        if encoded.len() == KEY_SIZE * 2 {
            if let Ok(bytes) = hex::decode(encoded) {
                return Self::from_bytes(&bytes);
            }
        }

        let decoded = [STANDARD, URL_SAFE, STANDARD_NO_PAD, URL_SAFE_NO_PAD]
            .iter()
            .find_map(|engine| engine.decode(encoded).ok())
            .ok_or_else(|| {
                SecretError::InvalidKey("key is neither hex nor base64".to_string())
            })?;
        Self::from_bytes(&decoded)
    }

    /// Hex encoding, suitable for `ENCRYPTION_KEY`.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey([REDACTED])")
    }
}

/// Somewhere a master key can be obtained from.
pub trait KeySource: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    /// Produce the key.
    fn load(&self) -> Result<MasterKey>;
}

/// A key supplied through configuration.
pub struct ConfiguredKey {
    encoded: SecretString,
}

impl ConfiguredKey {
    pub fn new(encoded: SecretString) -> Self {
        Self { encoded }
    }
}

impl KeySource for ConfiguredKey {
    fn name(&self) -> &'static str {
        "configured"
    }

    fn load(&self) -> Result<MasterKey> {
        MasterKey::decode(self.encoded.expose_secret())
    }
}

/// A random key that is never written anywhere.
pub struct EphemeralKey;

impl KeySource for EphemeralKey {
    fn name(&self) -> &'static str {
        "ephemeral"
    }

    fn load(&self) -> Result<MasterKey> {
        Ok(MasterKey::generate())
    }
}

/// Resolve the process master key.
///
/// A configured key that fails to decode is replaced by an ephemeral one only
/// in dev mode; otherwise the error is returned and startup should abort.
pub fn resolve_master_key(configured: Option<&SecretString>, dev_mode: bool) -> Result<MasterKey> {
    if let Some(encoded) = configured {
        let source = ConfiguredKey::new(encoded.clone());
        match source.load() {
            Ok(key) => {
                debug!(source = source.name(), "master key loaded");
                return Ok(key);
            }
            Err(e) if dev_mode => {
                warn!("configured encryption key is unusable ({e}); falling back to an ephemeral key");
            }
            Err(e) => return Err(e),
        }
    } else if !dev_mode {
        return Err(SecretError::MissingKey);
    }

    let source = EphemeralKey;
    warn!("========================================");
    warn!("  DEV MODE: using an ephemeral encryption key.");
    warn!("  Stored credentials become unreadable after restart");
    warn!("  and are not shared with other instances.");
    warn!("  Set ENCRYPTION_KEY (see `shoplens keygen`) for production.");
    warn!("========================================");
    source.load()
}

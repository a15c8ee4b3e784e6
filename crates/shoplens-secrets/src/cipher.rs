//! String-level credential cipher used by the settings store.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use shoplens_core::SecretString;
use tracing::debug;

use crate::crypto;
use crate::error::Result;
use crate::keysource::MasterKey;

/// Encrypts credentials into base64 strings and back.
///
/// Cloning is cheap; all clones share the same master key.
#[derive(Clone, Debug)]
pub struct CredentialCipher {
    key: Arc<MasterKey>,
}

impl CredentialCipher {
    pub fn new(key: MasterKey) -> Self {
        Self { key: Arc::new(key) }
    }

    /// Encrypt a plaintext credential.
    ///
    /// Two calls with the same input produce different ciphertexts.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let blob = crypto::encrypt(self.key.as_bytes(), plaintext.as_bytes())?;
        Ok(STANDARD.encode(blob))
    }

    /// Decrypt a stored credential.
    ///
    /// Returns `None` for empty input, malformed ciphertext, or ciphertext
    /// written under a different key. Never fails outward.
    pub fn decrypt(&self, ciphertext: &str) -> Option<SecretString> {
        if ciphertext.is_empty() {
            return None;
        }

        let blob = match STANDARD.decode(ciphertext.trim()) {
            Ok(blob) => blob,
            Err(e) => {
                debug!("stored credential is not valid base64: {e}");
                return None;
            }
        };

        let plaintext = match crypto::decrypt(self.key.as_bytes(), &blob) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                debug!("stored credential could not be decrypted: {e}");
                return None;
            }
        };

        String::from_utf8(plaintext).ok().map(SecretString::new)
    }
}

//! AES-256-GCM encryption with HKDF-SHA256 key derivation.
//!
//! Every value gets its own random salt and nonce, and the master key is
//! never used directly as a cipher key. Output layout is
//! `salt (32) || nonce (12) || ciphertext_with_tag`.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::error::{Result, SecretError};

pub(crate) const NONCE_SIZE: usize = 12;
pub(crate) const SALT_SIZE: usize = 32;
pub(crate) const KEY_SIZE: usize = 32;

/// AES-GCM authentication tag length.
const TAG_SIZE: usize = 16;

/// HKDF info string used to domain-separate derived keys.
const HKDF_INFO: &[u8] = b"shoplens-credential-v1";

/// Build a cipher for `salt` from a key derived off `master_key`.
fn derive_cipher(master_key: &[u8], salt: &[u8]) -> Result<Aes256Gcm> {
    let hk = Hkdf::<Sha256>::new(Some(salt), master_key);
    let mut okm = [0u8; KEY_SIZE];
    hk.expand(HKDF_INFO, &mut okm)
        .map_err(|e| SecretError::InvalidKey(format!("key derivation failed: {e}")))?;

    let cipher = Aes256Gcm::new_from_slice(&okm)
        .map_err(|e| SecretError::InvalidKey(e.to_string()));
    okm.zeroize();
    cipher
}

/// Check that `master_key` can drive the cipher at all.
pub fn validate_master_key(master_key: &[u8]) -> Result<()> {
    if master_key.len() != KEY_SIZE {
        return Err(SecretError::InvalidKey(format!(
            "expected {KEY_SIZE} bytes, got {}",
            master_key.len()
        )));
    }
    Aes256Gcm::new_from_slice(master_key)
        .map(|_| ())
        .map_err(|e| SecretError::InvalidKey(e.to_string()))
}

/// Encrypt `plaintext` under a fresh salt and nonce.
pub fn encrypt(master_key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut salt = [0u8; SALT_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);

    let cipher = derive_cipher(master_key, &salt)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| SecretError::EncryptionFailed(e.to_string()))?;

    let mut out = Vec::with_capacity(SALT_SIZE + NONCE_SIZE + ciphertext.len());
    out.extend_from_slice(&salt);
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypt a blob produced by [`encrypt`].
pub fn decrypt(master_key: &[u8], blob: &[u8]) -> Result<Vec<u8>> {
    if blob.len() < SALT_SIZE + NONCE_SIZE + TAG_SIZE {
        return Err(SecretError::DecryptionFailed(
            "ciphertext too short".to_string(),
        ));
    }

    let (salt, rest) = blob.split_at(SALT_SIZE);
    let (nonce_bytes, ciphertext) = rest.split_at(NONCE_SIZE);

    let cipher = derive_cipher(master_key, salt)?;
    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|e| SecretError::DecryptionFailed(e.to_string()))
}

/// Generate a new random 256-bit master key.
pub fn generate_master_key() -> [u8; KEY_SIZE] {
    let mut key = [0u8; KEY_SIZE];
    rand::thread_rng().fill_bytes(&mut key);
    key
}

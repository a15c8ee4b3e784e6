//! Encryption key generation.

use shoplens_secrets::MasterKey;

/// Print a fresh hex-encoded key suitable for `ENCRYPTION_KEY`.
pub fn run() -> anyhow::Result<()> {
    println!("{}", MasterKey::generate().to_hex());
    Ok(())
}

//! Master-account loading and ephemeral account generation. Generated key
//! material lives only in process memory and dies with the run.

use std::path::Path;

use alloy::signers::local::PrivateKeySigner;

use crate::Result;

/// Decrypts an encrypted JSON keystore with `password`.
pub fn load_keystore(path: impl AsRef<Path>, password: &str) -> Result<PrivateKeySigner> {
    Ok(PrivateKeySigner::decrypt_keystore(path, password)?)
}

/// Parses a raw hex-encoded private key. The `0x` prefix is optional.
pub fn from_hex_key(key: &str) -> Result<PrivateKeySigner> {
    Ok(key.trim().parse::<PrivateKeySigner>()?)
}

/// Generates `count` fresh accounts with random keys.
pub fn generate_accounts(count: u64) -> Vec<PrivateKeySigner> {
    (0..count).map(|_| PrivateKeySigner::random()).collect()
}

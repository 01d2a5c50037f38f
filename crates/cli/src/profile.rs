//! TOML run profiles. Anything settable by flag can instead come from a
//! profile file; flags always win when both are present.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CliError;

/// Schema for `--profile` files. Every field is optional; unset values fall
/// back to flags or built-in defaults.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct RunProfile {
    pub rpc_urls: Option<Vec<String>>,
    pub keystore: Option<String>,
    pub password: Option<String>,
    pub private_key: Option<String>,
    pub to: Option<String>,
    pub txs_per_account: Option<u64>,
    pub accounts: Option<u64>,
    pub block_timeout: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    /// Wei per gas. u64 keeps the value a native TOML integer; it is widened
    /// when the run config is resolved.
    pub gas_price: Option<u64>,
    pub gas_limit: Option<u64>,
}

impl RunProfile {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CliError> {
        let contents = std::fs::read_to_string(path)?;
        let profile: RunProfile = toml::from_str(&contents)?;
        Ok(profile)
    }

    pub fn encode_toml(&self) -> Result<String, CliError> {
        let encoded = toml::to_string(self)?;
        Ok(encoded)
    }

    pub fn save_toml(&self, path: impl AsRef<Path>) -> Result<(), CliError> {
        std::fs::write(path, self.encode_toml()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_profiles() {
        let profile: RunProfile = toml::from_str(
            r#"
rpc_urls = ["http://node0:8545", "http://node1:8545"]
to = "0x7ed667adc76d558691fc43bd5f011cd0cafe7ed6"
txs_per_account = 250
accounts = 8
"#,
        )
        .unwrap();

        assert_eq!(profile.rpc_urls.as_ref().unwrap().len(), 2);
        assert_eq!(profile.txs_per_account, Some(250));
        assert_eq!(profile.accounts, Some(8));
        assert_eq!(profile.gas_price, None);
        assert_eq!(profile.block_timeout, None);
    }

    #[test]
    fn file_round_trip() {
        let profile = RunProfile {
            rpc_urls: Some(vec!["http://localhost:8545".to_owned()]),
            txs_per_account: Some(100),
            accounts: Some(4),
            block_timeout: Some(20),
            gas_price: Some(1_000_000_000),
            ..Default::default()
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.toml");
        profile.save_toml(&path).unwrap();

        let loaded = RunProfile::from_file(&path).unwrap();
        assert_eq!(loaded, profile);
    }

    #[test]
    fn rejects_malformed_profiles() {
        let res: Result<RunProfile, _> = toml::from_str("txs_per_account = \"lots\"");
        assert!(res.is_err());
    }
}

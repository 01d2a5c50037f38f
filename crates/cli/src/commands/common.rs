//! Shared CLI argument definitions and the wiring that turns them into live
//! harness components.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use floodgate_core::error::Error;
use floodgate_core::ledger::RunLedger;
use floodgate_core::poller::{self, PollerConfig};
use floodgate_core::pool::{EndpointPool, FirstOnly, RoundRobin};
use floodgate_core::report::RunReport;
use floodgate_core::wallet;
use nu_ansi_term::Style;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url::Url;

use crate::error::CliError;
use crate::profile::RunProfile;

pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";
pub const DEFAULT_TXS_PER_ACCOUNT: u64 = 100;
pub const DEFAULT_ACCOUNTS: u64 = 10;

#[derive(Clone, Debug, clap::Args)]
pub struct ProviderArgs {
    /// JSON-RPC endpoint(s) to send requests to.
    #[arg(
        env = "FLOODGATE_RPC_URL",
        short = 'r',
        long = "rpc-url",
        long_help = "JSON-RPC endpoint to send requests to.
Pass the flag multiple times to spread load round-robin across several nodes.",
        visible_aliases = ["rpc"]
    )]
    pub rpc_urls: Vec<Url>,

    /// Pin all traffic to the first endpoint instead of rotating.
    #[arg(
        long,
        long_help = "Disable round-robin endpoint selection and send every request to the first endpoint."
    )]
    pub first_endpoint_only: bool,
}

#[derive(Clone, Debug, clap::Args)]
pub struct WalletArgs {
    /// Path to the master account's encrypted JSON keystore.
    #[arg(
        env = "FLOODGATE_KEYSTORE",
        short = 'k',
        long,
        visible_aliases = ["wallet"]
    )]
    pub keystore: Option<PathBuf>,

    /// Password for the keystore.
    #[arg(env = "FLOODGATE_KEYSTORE_PASSWORD", short = 'p', long)]
    pub password: Option<String>,

    /// Raw hex private key for the master account; alternative to --keystore.
    #[arg(
        env = "FLOODGATE_PRIVATE_KEY",
        long = "private-key",
        conflicts_with = "keystore",
        long_help = "Raw hex private key for the master account. Handy for throwaway devnets; prefer --keystore elsewhere."
    )]
    pub private_key: Option<String>,
}

impl WalletArgs {
    /// Loads the master account from whichever source was configured, flags
    /// first, then the profile.
    pub fn master_signer(&self, profile: &RunProfile) -> Result<PrivateKeySigner, CliError> {
        if let Some(key) = &self.private_key {
            return Ok(wallet::from_hex_key(key)?);
        }
        if let Some(path) = &self.keystore {
            let password = self
                .password
                .as_ref()
                .or(profile.password.as_ref())
                .ok_or_else(|| {
                    Error::Config("--password is required with --keystore".to_owned())
                })?;
            return Ok(wallet::load_keystore(path, password)?);
        }
        if let Some(key) = &profile.private_key {
            return Ok(wallet::from_hex_key(key)?);
        }
        match (&profile.keystore, &profile.password) {
            (Some(path), Some(password)) => Ok(wallet::load_keystore(path, password)?),
            (Some(_), None) => {
                Err(Error::Config("profile sets a keystore but no password".to_owned()).into())
            }
            _ => Err(Error::Config(
                "no master account configured; provide --keystore/--password or --private-key"
                    .to_owned(),
            )
            .into()),
        }
    }
}

#[derive(Clone, Debug, clap::Args)]
pub struct RunArgs {
    /// Destination address for the generated transfers.
    #[arg(
        short = 't',
        long = "to",
        visible_aliases = ["dest"]
    )]
    pub to: Option<Address>,

    /// Transactions to send from each account.
    #[arg(
        short = 'n',
        long = "txs",
        long_help = "Transactions to send from each account. Every account signs its batch with strictly sequential nonces.",
        visible_aliases = ["tx-count"]
    )]
    pub txs_per_account: Option<u64>,

    /// Blocks to let pass before declaring the run stuck.
    #[arg(
        short = 'w',
        long,
        long_help = "Blocks to let pass while waiting for the txpool to drain. Exceeding it fails the run; sent transactions stay in the pool.",
        visible_aliases = ["wait"]
    )]
    pub block_timeout: Option<u64>,

    /// Milliseconds between txpool polls.
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Gas price in wei. Defaults to the node's eth_gasPrice answer.
    #[arg(long)]
    pub gas_price: Option<u128>,

    /// Gas limit per transfer.
    #[arg(long)]
    pub gas_limit: Option<u64>,

    /// TOML run profile supplying defaults for any flag not set.
    #[arg(long, visible_aliases = ["config"])]
    pub profile: Option<PathBuf>,

    /// Print the final report as JSON on stdout.
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    pub fn load_profile(&self) -> Result<RunProfile, CliError> {
        match &self.profile {
            Some(path) => RunProfile::from_file(path),
            None => Ok(RunProfile::default()),
        }
    }
}

/// Fully-resolved run settings: flags override profile values, profile
/// values override built-in defaults.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub rpc_urls: Vec<Url>,
    pub to: Address,
    pub txs_per_account: u64,
    pub block_timeout: u64,
    pub poll_interval: Duration,
    /// `None` means ask the node at startup.
    pub gas_price: Option<u128>,
    pub gas_limit: u64,
    pub first_endpoint_only: bool,
    pub json: bool,
}

impl RunConfig {
    pub fn resolve(
        provider: &ProviderArgs,
        run: &RunArgs,
        profile: &RunProfile,
    ) -> Result<Self, CliError> {
        let rpc_urls = if !provider.rpc_urls.is_empty() {
            provider.rpc_urls.to_owned()
        } else if let Some(urls) = &profile.rpc_urls {
            urls.iter()
                .map(|u| {
                    u.parse::<Url>()
                        .map_err(|e| Error::Config(format!("invalid rpc url {u}: {e}")))
                })
                .collect::<Result<Vec<_>, _>>()?
        } else {
            vec![DEFAULT_RPC_URL.parse().expect("default RPC URL parses")]
        };

        let to = match (run.to, &profile.to) {
            (Some(to), _) => to,
            (None, Some(to)) => to
                .parse::<Address>()
                .map_err(|e| Error::Config(format!("invalid destination address {to}: {e}")))?,
            (None, None) => {
                return Err(Error::Config(
                    "destination address is required; pass --to or set it in the profile"
                        .to_owned(),
                )
                .into())
            }
        };

        let poller_defaults = PollerConfig::default();
        let poll_interval = run
            .poll_interval_ms
            .or(profile.poll_interval_ms)
            .map(Duration::from_millis)
            .unwrap_or(poller_defaults.poll_interval);

        Ok(Self {
            rpc_urls,
            to,
            txs_per_account: run
                .txs_per_account
                .or(profile.txs_per_account)
                .unwrap_or(DEFAULT_TXS_PER_ACCOUNT),
            block_timeout: run
                .block_timeout
                .or(profile.block_timeout)
                .unwrap_or(poller_defaults.block_timeout),
            poll_interval,
            gas_price: run.gas_price.or(profile.gas_price.map(u128::from)),
            gas_limit: run
                .gas_limit
                .or(profile.gas_limit)
                .unwrap_or(floodgate_core::builder::GAS_PLAIN_TRANSFER),
            first_endpoint_only: provider.first_endpoint_only,
            json: run.json,
        })
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            poll_interval: self.poll_interval,
            block_timeout: self.block_timeout,
        }
    }
}

/// Connects the endpoint pool with the configured selection policy.
pub async fn connect_pool(config: &RunConfig) -> Result<Arc<EndpointPool>, CliError> {
    let pool = if config.first_endpoint_only {
        EndpointPool::connect(&config.rpc_urls, FirstOnly).await?
    } else {
        EndpointPool::connect(&config.rpc_urls, RoundRobin::default()).await?
    };
    Ok(Arc::new(pool))
}

/// Logs what we're talking to before anything is signed.
pub async fn startup_banner(pool: &EndpointPool) -> Result<(), CliError> {
    for endpoint in pool.endpoints() {
        let version = endpoint.client_version().await?;
        let block = endpoint.block_number().await?;
        info!(
            url = %endpoint.url(),
            chain_id = endpoint.chain_id(),
            block,
            client = %version,
            "connected"
        );
    }
    Ok(())
}

/// Flag value if set, otherwise whatever the node is asking right now.
pub async fn resolve_gas_price(config: &RunConfig, pool: &EndpointPool) -> Result<u128, CliError> {
    if let Some(gas_price) = config.gas_price {
        return Ok(gas_price);
    }
    Ok(pool.select().gas_price().await?)
}

/// Shared tail of every run: wait for the pools to drain, count what
/// actually confirmed, print the report, and fail if any account fell short.
pub async fn finish_run(
    ledger: &RunLedger,
    pool: &EndpointPool,
    config: &RunConfig,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    let completed_at = poller::wait_all(pool.endpoints(), &config.poller_config(), cancel).await?;
    let confirmed = ledger.count_confirmed(pool.select()).await?;

    let report = RunReport::new(ledger.total_sent(), confirmed, ledger.started_at, completed_at);
    if config.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", bold(report.to_string()));
    }

    let failed = ledger.failed_accounts();
    for (address, error) in &failed {
        warn!(%address, "account fell short: {error}");
    }
    if !failed.is_empty() {
        return Err(CliError::FailedAccounts(failed.len(), ledger.accounts.len()));
    }
    Ok(())
}

pub fn bold(msg: impl AsRef<str>) -> String {
    Style::new().bold().paint(msg.as_ref().to_owned()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_provider_args() -> ProviderArgs {
        ProviderArgs {
            rpc_urls: vec![],
            first_endpoint_only: false,
        }
    }

    fn empty_run_args() -> RunArgs {
        RunArgs {
            to: None,
            txs_per_account: None,
            block_timeout: None,
            poll_interval_ms: None,
            gas_price: None,
            gas_limit: None,
            profile: None,
            json: false,
        }
    }

    #[test]
    fn flags_override_profile_values() {
        let run = RunArgs {
            to: Some(Address::repeat_byte(1)),
            txs_per_account: Some(5),
            ..empty_run_args()
        };
        let profile = RunProfile {
            to: Some(format!("{}", Address::repeat_byte(2))),
            txs_per_account: Some(9),
            block_timeout: Some(30),
            ..Default::default()
        };

        let config = RunConfig::resolve(&empty_provider_args(), &run, &profile).unwrap();
        assert_eq!(config.to, Address::repeat_byte(1));
        assert_eq!(config.txs_per_account, 5);
        // untouched by flags, so the profile wins
        assert_eq!(config.block_timeout, 30);
    }

    #[test]
    fn profile_fills_unset_flags_and_defaults_cover_the_rest() {
        let profile = RunProfile {
            rpc_urls: Some(vec!["http://node7:8545".to_owned()]),
            to: Some(format!("{}", Address::repeat_byte(2))),
            ..Default::default()
        };

        let config =
            RunConfig::resolve(&empty_provider_args(), &empty_run_args(), &profile).unwrap();
        assert_eq!(config.rpc_urls[0].host_str().unwrap(), "node7");
        assert_eq!(config.to, Address::repeat_byte(2));
        assert_eq!(config.txs_per_account, DEFAULT_TXS_PER_ACCOUNT);
        assert_eq!(config.block_timeout, PollerConfig::default().block_timeout);
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert_eq!(config.gas_price, None);
    }

    #[test]
    fn missing_destination_is_an_error() {
        let res = RunConfig::resolve(
            &empty_provider_args(),
            &empty_run_args(),
            &RunProfile::default(),
        );
        assert!(matches!(res, Err(CliError::Core(Error::Config(_)))));
    }

    #[test]
    fn flag_private_key_beats_profile_keystore() {
        let wallet_args = WalletArgs {
            keystore: None,
            password: None,
            private_key: Some(
                "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80".to_owned(),
            ),
        };
        let profile = RunProfile {
            keystore: Some("/nonexistent/keystore.json".to_owned()),
            password: Some("hunter2".to_owned()),
            ..Default::default()
        };

        let signer = wallet_args.master_signer(&profile).unwrap();
        assert_eq!(
            format!("{}", signer.address()).to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn no_master_account_is_an_error() {
        let wallet_args = WalletArgs {
            keystore: None,
            password: None,
            private_key: None,
        };
        let res = wallet_args.master_signer(&RunProfile::default());
        assert!(matches!(res, Err(CliError::Core(Error::Config(_)))));
    }
}

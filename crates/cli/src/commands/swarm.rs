//! The many-account flow: fund a swarm of ephemeral accounts from the
//! master, let each submit its own batch, then wait for the pools to drain.

use floodgate_core::funding::{self, FundingPlan};
use floodgate_core::load::LoadStage;
use floodgate_core::poller;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::commands::common::{self, ProviderArgs, RunArgs, WalletArgs, DEFAULT_ACCOUNTS};
use crate::error::CliError;

#[derive(Clone, Debug, clap::Args)]
pub struct SwarmCommandArgs {
    #[command(flatten)]
    pub provider: ProviderArgs,

    #[command(flatten)]
    pub wallet: WalletArgs,

    #[command(flatten)]
    pub run: RunArgs,

    /// Number of ephemeral accounts to fund and send from.
    #[arg(
        short = 'a',
        long,
        long_help = "Number of ephemeral accounts to fund and send from. Each account runs independently with its own nonce sequence.",
        visible_aliases = ["account-count"]
    )]
    pub accounts: Option<u64>,
}

pub async fn swarm(args: SwarmCommandArgs, cancel: CancellationToken) -> Result<(), CliError> {
    let profile = args.run.load_profile()?;
    let config = common::RunConfig::resolve(&args.provider, &args.run, &profile)?;
    let master = args.wallet.master_signer(&profile)?;
    let account_count = args.accounts.or(profile.accounts).unwrap_or(DEFAULT_ACCOUNTS);

    let pool = common::connect_pool(&config).await?;
    common::startup_banner(&pool).await?;
    let gas_price = common::resolve_gas_price(&config, &pool).await?;

    let plan = FundingPlan {
        gas_price,
        gas_limit: config.gas_limit,
        txs_per_account: config.txs_per_account,
        account_count,
    };
    let accounts = funding::fund_accounts(&pool, &master, &plan).await?;

    // the funding transfers have to land before the swarm can spend them
    poller::wait_all(pool.endpoints(), &config.poller_config(), &cancel).await?;
    info!(accounts = accounts.len(), "funding confirmed, opening the floodgate");

    let stage = LoadStage {
        pool: pool.clone(),
        destination: config.to,
        txs_per_account: config.txs_per_account,
        gas_price,
        gas_limit: config.gas_limit,
    };
    let ledger = stage.run(accounts).await?;

    common::finish_run(&ledger, &pool, &config, &cancel).await
}

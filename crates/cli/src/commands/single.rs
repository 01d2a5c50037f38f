//! The one-account flow: the master account signs and submits the whole
//! batch itself, no funding round needed.

use alloy::primitives::U256;
use floodgate_core::{cost, funding, load::LoadStage};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::commands::common::{self, ProviderArgs, RunArgs, WalletArgs};
use crate::error::CliError;

#[derive(Clone, Debug, clap::Args)]
pub struct SingleCommandArgs {
    #[command(flatten)]
    pub provider: ProviderArgs,

    #[command(flatten)]
    pub wallet: WalletArgs,

    #[command(flatten)]
    pub run: RunArgs,
}

pub async fn single(args: SingleCommandArgs, cancel: CancellationToken) -> Result<(), CliError> {
    let profile = args.run.load_profile()?;
    let config = common::RunConfig::resolve(&args.provider, &args.run, &profile)?;
    let master = args.wallet.master_signer(&profile)?;

    let pool = common::connect_pool(&config).await?;
    common::startup_banner(&pool).await?;
    let gas_price = common::resolve_gas_price(&config, &pool).await?;

    // the master pays for its own batch; bail before signing if it can't
    let balance = pool.select().balance_of(master.address()).await?;
    let batch_cost = cost::estimate(gas_price, config.gas_limit, config.txs_per_account);
    funding::ensure_funds(balance, batch_cost, 1, U256::ZERO)?;

    info!(
        master = %master.address(),
        txs = config.txs_per_account,
        gas_price,
        "sending batch from the master account"
    );
    let stage = LoadStage {
        pool: pool.clone(),
        destination: config.to,
        txs_per_account: config.txs_per_account,
        gas_price,
        gas_limit: config.gas_limit,
    };
    let ledger = stage.run(vec![master]).await?;

    common::finish_run(&ledger, &pool, &config, &cancel).await
}

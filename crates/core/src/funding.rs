//! Generates ephemeral accounts and seeds them from the master account.

use alloy::{
    primitives::{utils::format_ether, U256},
    signers::local::PrivateKeySigner,
};
use tracing::{debug, info};

use crate::{
    builder::{self, TxParams},
    cost,
    error::Error,
    pool::EndpointPool,
    wallet, Result,
};

/// Sizing for one funding round: how many accounts, and how much work each
/// one is expected to pay for.
#[derive(Clone, Copy, Debug)]
pub struct FundingPlan {
    pub gas_price: u128,
    pub gas_limit: u64,
    pub txs_per_account: u64,
    pub account_count: u64,
}

impl FundingPlan {
    /// Wei each ephemeral account needs to submit its whole batch.
    pub fn cost_per_account(&self) -> U256 {
        cost::estimate(self.gas_price, self.gas_limit, self.txs_per_account)
    }

    /// Wei the master burns on the funding transfers themselves.
    pub fn distribution_cost(&self) -> U256 {
        cost::estimate(
            self.gas_price,
            builder::GAS_PLAIN_TRANSFER,
            self.account_count,
        )
    }
}

/// Pre-flight balance check. Fails with [`Error::InsufficientFunds`] before
/// anything is submitted; a run that cannot finish should not start.
pub fn ensure_funds(
    balance: U256,
    cost_per_account: U256,
    account_count: u64,
    distribution_cost: U256,
) -> Result<()> {
    let needed = cost_per_account
        .saturating_mul(U256::from(account_count))
        .saturating_add(distribution_cost);
    if needed > balance {
        return Err(Error::InsufficientFunds {
            needed,
            available: balance,
        });
    }
    Ok(())
}

/// Generates `plan.account_count` fresh accounts and submits one funding
/// transfer to each, spending the master's nonces in order. Returns the
/// funded signers without waiting for inclusion; run the poller before
/// spending from them.
pub async fn fund_accounts(
    pool: &EndpointPool,
    master: &PrivateKeySigner,
    plan: &FundingPlan,
) -> Result<Vec<PrivateKeySigner>> {
    let endpoint = pool.select();
    let balance = endpoint.balance_of(master.address()).await?;
    let cost_per_account = plan.cost_per_account();
    ensure_funds(
        balance,
        cost_per_account,
        plan.account_count,
        plan.distribution_cost(),
    )?;

    info!(
        accounts = plan.account_count,
        cost_per_account = %format_ether(cost_per_account),
        "generating accounts and distributing funds"
    );
    let accounts = wallet::generate_accounts(plan.account_count);
    let master_nonce = endpoint.transaction_count(master.address()).await?;

    for (idx, account) in accounts.iter().enumerate() {
        let params = TxParams::transfer(
            master_nonce + idx as u64,
            plan.gas_price,
            pool.chain_id(),
            account.address(),
        )
        .with_value(cost_per_account);
        let signed = builder::build(&params, master)?;
        let tx_hash = pool.select().send_raw(&signed.raw).await?;
        debug!(recipient = %account.address(), %tx_hash, "funding tx accepted");
    }

    Ok(accounts)
}

//! Fans submission out across accounts. Every funded account runs as its own
//! task, owns its own nonce sequence, and submits strictly in order; the
//! only thing tasks share is the endpoint pool.

use std::{sync::Arc, time::SystemTime};

use alloy::{primitives::Address, signers::local::PrivateKeySigner};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    builder::{self, SignedTx, TxParams},
    error::Error,
    ledger::{AccountRecord, RunLedger},
    pool::EndpointPool,
    Result,
};

/// One load stage run: `txs_per_account` transfers to `destination` from
/// every account handed to [`run`](Self::run).
pub struct LoadStage {
    pub pool: Arc<EndpointPool>,
    pub destination: Address,
    pub txs_per_account: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
}

/// The per-account slice of the stage config, copied into each task.
#[derive(Clone, Copy)]
struct AccountJob {
    destination: Address,
    txs_per_account: u64,
    gas_price: u128,
    gas_limit: u64,
}

impl LoadStage {
    /// Runs every account as its own task and collects the results into a
    /// fresh ledger. A failing account is recorded, not propagated; its
    /// siblings keep sending.
    pub async fn run(&self, accounts: Vec<PrivateKeySigner>) -> Result<RunLedger> {
        info!(
            accounts = accounts.len(),
            txs_per_account = self.txs_per_account,
            "starting load stage"
        );
        let mut ledger = RunLedger::new(SystemTime::now());

        let job = AccountJob {
            destination: self.destination,
            txs_per_account: self.txs_per_account,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
        };
        let handles: Vec<JoinHandle<(Address, AccountRecord)>> = accounts
            .into_iter()
            .map(|signer| tokio::task::spawn(run_account(self.pool.clone(), signer, job)))
            .collect();

        for handle in handles {
            let (address, record) = handle.await?;
            ledger.record(address, record);
        }
        Ok(ledger)
    }
}

/// One account's unit of work. Never returns an error; failures are folded
/// into the record so sibling accounts are unaffected.
async fn run_account(
    pool: Arc<EndpointPool>,
    signer: PrivateKeySigner,
    job: AccountJob,
) -> (Address, AccountRecord) {
    let address = signer.address();
    let mut record = AccountRecord::default();
    if let Err(source) = submit_batch(&pool, &signer, &job, &mut record).await {
        let err = Error::AccountRun {
            address,
            sent: record.txs_sent,
            planned: job.txs_per_account,
            source: source.into(),
        };
        warn!("{err}");
        record.error = Some(err.to_string());
    }
    (address, record)
}

/// Signs the account's whole batch up front, then submits it in nonce order,
/// one acknowledgment at a time. `txs_sent` only moves after an endpoint
/// accepts a tx, so the count never overstates what reached a node.
async fn submit_batch(
    pool: &EndpointPool,
    signer: &PrivateKeySigner,
    job: &AccountJob,
    record: &mut AccountRecord,
) -> Result<()> {
    let address = signer.address();
    record.initial_nonce = pool.select().transaction_count(address).await?;
    debug!(
        %address,
        start_nonce = record.initial_nonce,
        count = job.txs_per_account,
        "building batch"
    );

    let batch = build_batch(signer, record.initial_nonce, pool.chain_id(), job)?;
    for signed in &batch {
        pool.select().send_raw(&signed.raw).await?;
        record.txs_sent += 1;
    }
    Ok(())
}

/// Builds the signed batch for one account: transfers with nonces
/// `start_nonce..start_nonce + txs_per_account`, in that order.
fn build_batch(
    signer: &PrivateKeySigner,
    start_nonce: u64,
    chain_id: u64,
    job: &AccountJob,
) -> Result<Vec<SignedTx>> {
    let mut batch = Vec::with_capacity(job.txs_per_account as usize);
    for nonce in start_nonce..start_nonce + job.txs_per_account {
        let params = TxParams::transfer(nonce, job.gas_price, chain_id, job.destination)
            .with_gas_limit(job.gas_limit);
        batch.push(builder::build(&params, signer)?);
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Endpoint, RoundRobin};
    use alloy::{
        consensus::TxEnvelope,
        eips::eip2718::Decodable2718,
        primitives::{B256, U64},
        providers::{mock::Asserter, DynProvider, ProviderBuilder},
    };

    fn job(txs_per_account: u64) -> AccountJob {
        AccountJob {
            destination: Address::repeat_byte(9),
            txs_per_account,
            gas_price: 1_000_000_000,
            gas_limit: 21_000,
        }
    }

    async fn mock_pool(asserter: &Asserter) -> Arc<EndpointPool> {
        let provider =
            DynProvider::new(ProviderBuilder::new().connect_mocked_client(asserter.clone()));
        asserter.push_success(&U64::from(1)); // chain id probe
        let endpoint = Endpoint::with_provider("http://localhost:8545".parse().unwrap(), provider)
            .await
            .unwrap();
        Arc::new(EndpointPool::from_endpoints(vec![endpoint], RoundRobin::default()).unwrap())
    }

    #[test]
    fn batch_nonces_are_sequential() {
        let signer = PrivateKeySigner::random();
        let batch = build_batch(&signer, 7, 1, &job(3)).unwrap();

        let nonces: Vec<u64> = batch
            .iter()
            .map(|signed| {
                let envelope = TxEnvelope::decode_2718(&mut signed.raw.as_ref()).unwrap();
                let TxEnvelope::Legacy(tx) = envelope else {
                    panic!("expected a legacy envelope");
                };
                tx.tx().nonce
            })
            .collect();
        assert_eq!(nonces, [7, 8, 9]);
    }

    #[tokio::test]
    async fn records_acknowledged_sends() {
        let asserter = Asserter::new();
        let pool = mock_pool(&asserter).await;
        asserter.push_success(&U64::from(7)); // starting nonce
        for i in 0..3u8 {
            asserter.push_success(&B256::repeat_byte(i + 1));
        }

        let stage = LoadStage {
            pool,
            destination: Address::repeat_byte(9),
            txs_per_account: 3,
            gas_price: 1_000_000_000,
            gas_limit: 21_000,
        };
        let ledger = stage.run(vec![PrivateKeySigner::random()]).await.unwrap();

        assert_eq!(ledger.accounts.len(), 1);
        let record = ledger.accounts.values().next().unwrap();
        assert_eq!(record.initial_nonce, 7);
        assert_eq!(record.txs_sent, 3);
        assert!(record.error.is_none());
        assert_eq!(ledger.total_sent(), 3);
    }

    #[tokio::test]
    async fn failure_mid_batch_is_recorded_not_propagated() {
        let asserter = Asserter::new();
        let pool = mock_pool(&asserter).await;
        asserter.push_success(&U64::from(0)); // starting nonce
        asserter.push_success(&B256::repeat_byte(1)); // first send lands
        asserter.push_failure_msg("nonce too low"); // second is rejected

        let signer = PrivateKeySigner::random();
        let address = signer.address();
        let stage = LoadStage {
            pool,
            destination: Address::repeat_byte(9),
            txs_per_account: 3,
            gas_price: 1_000_000_000,
            gas_limit: 21_000,
        };
        let ledger = stage.run(vec![signer]).await.unwrap();

        let record = &ledger.accounts[&address];
        assert_eq!(record.txs_sent, 1, "only the acknowledged send counts");
        let error = record.error.as_deref().unwrap();
        assert!(
            error.contains("after sending 1 of 3"),
            "unexpected error: {error}"
        );
        assert_eq!(ledger.failed_accounts().len(), 1);
    }
}

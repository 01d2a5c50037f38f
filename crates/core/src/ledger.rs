//! Per-run bookkeeping. The ledger is written once by the load stage, then
//! read to compute completion and throughput after the fact.

use std::{collections::HashMap, time::SystemTime};

use alloy::primitives::Address;
use serde::Serialize;

use crate::{pool::Endpoint, Result};

/// What one account did during the load stage.
#[derive(Clone, Debug, Default, Serialize)]
pub struct AccountRecord {
    /// The account's confirmed transaction count when its batch started.
    pub initial_nonce: u64,
    /// Submissions acknowledged by an endpoint. Never counts attempts.
    pub txs_sent: u64,
    /// Set when the account's submission sequence failed part-way.
    pub error: Option<String>,
}

/// Created when the load stage starts, consumed by the reporter.
#[derive(Clone, Debug, Serialize)]
pub struct RunLedger {
    pub started_at: SystemTime,
    pub accounts: HashMap<Address, AccountRecord>,
}

impl RunLedger {
    pub fn new(started_at: SystemTime) -> Self {
        Self {
            started_at,
            accounts: HashMap::new(),
        }
    }

    pub fn record(&mut self, address: Address, record: AccountRecord) {
        self.accounts.insert(address, record);
    }

    /// Total submissions acknowledged across all accounts.
    pub fn total_sent(&self) -> u64 {
        self.accounts.values().map(|r| r.txs_sent).sum()
    }

    /// Accounts whose submission sequence failed, with the recorded reason,
    /// in address order.
    pub fn failed_accounts(&self) -> Vec<(Address, &str)> {
        let mut failed: Vec<_> = self
            .accounts
            .iter()
            .filter_map(|(address, r)| r.error.as_deref().map(|e| (*address, e)))
            .collect();
        failed.sort_by_key(|(address, _)| *address);
        failed
    }

    /// Transactions confirmed on chain since the run started, measured as
    /// the growth of each account's transaction count past its starting
    /// nonce.
    pub async fn count_confirmed(&self, endpoint: &Endpoint) -> Result<u64> {
        let mut confirmed = 0;
        for (address, record) in &self.accounts {
            let nonce = endpoint.transaction_count(*address).await?;
            confirmed += nonce.saturating_sub(record.initial_nonce);
        }
        Ok(confirmed)
    }
}

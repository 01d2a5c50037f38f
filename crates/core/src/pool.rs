//! Endpoint handles and the selection policy that spreads traffic across
//! them.

use std::sync::atomic::{AtomicUsize, Ordering};

use alloy::{
    primitives::{Address, TxHash, U256},
    providers::{ext::TxPoolApi, DynProvider, Provider, ProviderBuilder},
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::{
    error::Error,
    poller::{MempoolStatus, NodeStatus},
    Result,
};
use url::Url;

/// One live JSON-RPC endpoint. Wraps the provider behind exactly the call
/// surface the harness needs, so callers never reach into the client.
#[derive(Clone, Debug)]
pub struct Endpoint {
    url: Url,
    provider: DynProvider,
    chain_id: u64,
}

impl Endpoint {
    /// Connects over HTTP and probes the node with `eth_chainId`.
    pub async fn connect(url: Url) -> Result<Self> {
        let provider = DynProvider::new(ProviderBuilder::new().connect_http(url.to_owned()));
        Self::with_provider(url, provider).await
    }

    /// Wraps an existing provider. Still probes for the chain id; an
    /// endpoint that cannot answer that is not worth keeping.
    pub async fn with_provider(url: Url, provider: DynProvider) -> Result<Self> {
        let chain_id = provider
            .get_chain_id()
            .await
            .map_err(|source| Error::EndpointUnavailable {
                url: url.to_owned(),
                source,
            })?;
        debug!(%url, chain_id, "connected to endpoint");
        Ok(Self {
            url,
            provider,
            chain_id,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub async fn block_number(&self) -> Result<u64> {
        Ok(self.provider.get_block_number().await?)
    }

    pub async fn gas_price(&self) -> Result<u128> {
        Ok(self.provider.get_gas_price().await?)
    }

    pub async fn balance_of(&self, address: Address) -> Result<U256> {
        Ok(self.provider.get_balance(address).await?)
    }

    /// Confirmed transaction count, i.e. the next valid nonce.
    pub async fn transaction_count(&self, address: Address) -> Result<u64> {
        Ok(self.provider.get_transaction_count(address).await?)
    }

    pub async fn mempool_status(&self) -> Result<MempoolStatus> {
        let status = self.provider.txpool_status().await?;
        Ok(MempoolStatus {
            pending: status.pending,
            queued: status.queued,
        })
    }

    /// Submits a raw signed transaction, returning its hash once the node
    /// accepts it.
    pub async fn send_raw(&self, raw: &[u8]) -> Result<TxHash> {
        Ok(*self.provider.send_raw_transaction(raw).await?.tx_hash())
    }

    pub async fn client_version(&self) -> Result<String> {
        Ok(self.provider.get_client_version().await?)
    }
}

#[async_trait]
impl NodeStatus for Endpoint {
    async fn block_number(&self) -> Result<u64> {
        Endpoint::block_number(self).await
    }

    async fn mempool_status(&self) -> Result<MempoolStatus> {
        Endpoint::mempool_status(self).await
    }
}

/// Replaceable policy deciding which endpoint serves the next call.
pub trait SelectEndpoint: Send + Sync {
    fn next_index(&self, pool_size: usize) -> usize;
}

/// Cycles through endpoints in construction order. The cursor only moves
/// forward; concurrent callers each claim a distinct slot.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl SelectEndpoint for RoundRobin {
    fn next_index(&self, pool_size: usize) -> usize {
        self.cursor.fetch_add(1, Ordering::Relaxed) % pool_size
    }
}

/// Pins every call to the first endpoint.
#[derive(Debug, Default)]
pub struct FirstOnly;

impl SelectEndpoint for FirstOnly {
    fn next_index(&self, _pool_size: usize) -> usize {
        0
    }
}

/// An ordered set of live endpoints behind a selection policy.
pub struct EndpointPool {
    endpoints: Vec<Endpoint>,
    policy: Box<dyn SelectEndpoint>,
}

impl EndpointPool {
    /// Connects to every URL, skipping the ones that fail their probe. An
    /// unreachable endpoint costs a warning, not the run; an empty pool is
    /// fatal.
    pub async fn connect(urls: &[Url], policy: impl SelectEndpoint + 'static) -> Result<Self> {
        let mut endpoints = Vec::with_capacity(urls.len());
        for url in urls {
            match Endpoint::connect(url.to_owned()).await {
                Ok(endpoint) => endpoints.push(endpoint),
                Err(e) => warn!("{e}; dropping it from the pool"),
            }
        }
        Self::from_endpoints(endpoints, policy)
    }

    /// Builds a pool from already-connected endpoints. Every endpoint must
    /// agree on the chain id.
    pub fn from_endpoints(
        endpoints: Vec<Endpoint>,
        policy: impl SelectEndpoint + 'static,
    ) -> Result<Self> {
        let chain_id = endpoints.first().ok_or(Error::NoEndpoints)?.chain_id();
        for endpoint in &endpoints {
            if endpoint.chain_id() != chain_id {
                return Err(Error::ChainIdMismatch(chain_id, endpoint.chain_id()));
            }
        }
        Ok(Self {
            endpoints,
            policy: Box::new(policy),
        })
    }

    /// Picks the endpoint for the next call.
    pub fn select(&self) -> &Endpoint {
        &self.endpoints[self.policy.next_index(self.endpoints.len())]
    }

    /// All endpoints, in construction order.
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Chain id shared by every endpoint in the pool.
    pub fn chain_id(&self) -> u64 {
        self.endpoints[0].chain_id()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

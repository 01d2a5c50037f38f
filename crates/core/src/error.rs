use alloy::{
    primitives::{utils::format_ether, Address, U256},
    signers,
    signers::local::LocalSignerError,
    transports::{RpcError, TransportErrorKind},
};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "insufficient funds: needed {} ETH, have {} ETH",
        format_ether(*needed),
        format_ether(*available)
    )]
    InsufficientFunds { needed: U256, available: U256 },

    #[error("failed to load keystore")]
    Keystore(#[from] LocalSignerError),

    #[error("rpc error: {0}")]
    Rpc(#[from] RpcError<TransportErrorKind>),

    #[error("account {address} failed after sending {sent} of {planned} txs: {source}")]
    AccountRun {
        address: Address,
        sent: u64,
        planned: u64,
        source: Box<Error>,
    },

    #[error("txpool still not drained after {blocks_waited} blocks")]
    Timeout { blocks_waited: u64 },

    #[error("endpoint {url} is unreachable")]
    EndpointUnavailable {
        url: Url,
        source: RpcError<TransportErrorKind>,
    },

    #[error("no usable endpoints in the pool")]
    NoEndpoints,

    #[error("chain_id mismatch. pool chain id: {0}, endpoint chain id: {1}. chain_id must be consistent across all endpoints")]
    ChainIdMismatch(u64, u64),

    #[error("failed to build transaction: {0}")]
    TxBuild(String),

    #[error("signer failed to sign transaction")]
    Signer(#[from] signers::Error),

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("run canceled")]
    Canceled,
}

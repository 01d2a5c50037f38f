//! Polls node state until the transaction pool drains or a block-count
//! timeout fires. Wall-clock time is only recorded, never used to decide
//! completion; timeouts are measured in blocks mined.

use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use futures::future::try_join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{error::Error, Result};

/// Pending and queued transaction counts reported by a node's txpool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MempoolStatus {
    pub pending: u64,
    pub queued: u64,
}

impl MempoolStatus {
    /// True when the node has nothing left to mine.
    pub fn is_drained(&self) -> bool {
        self.pending == 0 && self.queued == 0
    }
}

/// The slice of node state the poller reads. Implemented by
/// [`Endpoint`](crate::pool::Endpoint) and by scripted mocks in tests.
#[async_trait]
pub trait NodeStatus: Send + Sync {
    async fn block_number(&self) -> Result<u64>;
    async fn mempool_status(&self) -> Result<MempoolStatus>;
}

/// Where a drain wait stands. `Waiting` transitions to exactly one of the
/// two terminal states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollState {
    Waiting,
    Drained,
    TimedOut,
}

#[derive(Clone, Copy, Debug)]
pub struct PollerConfig {
    /// Time between txpool reads.
    pub poll_interval: Duration,
    /// Blocks allowed to pass without drainage before the wait gives up.
    pub block_timeout: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            block_timeout: 12,
        }
    }
}

/// One poller step against a fresh read of node state. The block-timeout
/// check runs before the txpool read, so a run that drains after the budget
/// is spent still times out. Returns the new state and the blocks passed
/// since `starting_block`.
pub async fn poll_once(
    node: &(impl NodeStatus + ?Sized),
    starting_block: u64,
    block_timeout: u64,
) -> Result<(PollState, u64)> {
    let blocks_passed = node.block_number().await?.saturating_sub(starting_block);
    if blocks_passed > block_timeout {
        return Ok((PollState::TimedOut, blocks_passed));
    }

    let status = node.mempool_status().await?;
    debug!(
        blocks_passed,
        pending = status.pending,
        queued = status.queued,
        "txpool status"
    );
    let state = if status.is_drained() {
        PollState::Drained
    } else {
        PollState::Waiting
    };
    Ok((state, blocks_passed))
}

/// Polls `node` until its txpool drains, more than `block_timeout` blocks
/// pass, or `cancel` fires, whichever comes first. Returns the completion
/// timestamp on drainage.
pub async fn wait_drained(
    node: &(impl NodeStatus + ?Sized),
    config: &PollerConfig,
    cancel: &CancellationToken,
) -> Result<SystemTime> {
    let starting_block = node.block_number().await?;
    info!(starting_block, "waiting for txpool to drain");

    let mut ticker = tokio::time::interval(config.poll_interval);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Canceled),
            _ = ticker.tick() => {}
        }

        match poll_once(node, starting_block, config.block_timeout).await? {
            (PollState::Drained, _) => return Ok(SystemTime::now()),
            (PollState::TimedOut, blocks_waited) => {
                return Err(Error::Timeout { blocks_waited })
            }
            (PollState::Waiting, _) => {}
        }
    }
}

/// Waits for every node to drain. The aggregate completes at the latest
/// individual completion; a single timeout fails the whole wait.
pub async fn wait_all<N: NodeStatus>(
    nodes: &[N],
    config: &PollerConfig,
    cancel: &CancellationToken,
) -> Result<SystemTime> {
    let completions =
        try_join_all(nodes.iter().map(|node| wait_drained(node, config, cancel))).await?;
    completions.into_iter().max().ok_or(Error::NoEndpoints)
}

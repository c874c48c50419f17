//! Swarm formation state machine
//!
//! A node starts in `LearningInformed`, collects liveness announcements,
//! elects a block compiler and moves to `Connected` or `Join` once the
//! second block arrives.

mod chain;
mod connected;
mod informed;
mod join;

pub use chain::BlockChain;
pub use connected::StateSwarmConnected;
pub use informed::{InformedStatus, StateSwarmInformed};
pub use join::StateSwarmJoin;

use crate::{ConsensusResult, SwarmConfig};
use std::sync::Arc;
use swarm_core::{Block, Transaction};

/// Current state of a node in its swarm
#[derive(Debug, Clone)]
pub enum SwarmState {
    LearningInformed(StateSwarmInformed),
    Connected(StateSwarmConnected),
    Join(StateSwarmJoin),
}

impl SwarmState {
    /// Initial state. Must be called inside a tokio runtime.
    pub fn start(chain: Arc<BlockChain>, config: SwarmConfig) -> Self {
        SwarmState::LearningInformed(StateSwarmInformed::new(chain, config))
    }

    pub fn name(&self) -> &'static str {
        match self {
            SwarmState::LearningInformed(_) => "LearningInformed",
            SwarmState::Connected(_) => "Connected",
            SwarmState::Join(_) => "Join",
        }
    }

    pub fn chain(&self) -> &Arc<BlockChain> {
        match self {
            SwarmState::LearningInformed(s) => s.chain(),
            SwarmState::Connected(s) => s.chain(),
            SwarmState::Join(s) => s.chain(),
        }
    }

    pub fn handle_transaction(&self, transaction: Transaction) -> ConsensusResult<()> {
        match self {
            SwarmState::LearningInformed(s) => s.handle_transaction(transaction),
            SwarmState::Connected(s) => s.handle_transaction(transaction),
            SwarmState::Join(s) => s.handle_transaction(transaction),
        }
    }

    /// Hand a block to the state, returning the state to continue with
    pub async fn handle_block(&self, block: Block) -> ConsensusResult<SwarmState> {
        match self {
            SwarmState::LearningInformed(s) => s.handle_block(block).await,
            SwarmState::Connected(s) => Ok(s.handle_block(block)),
            SwarmState::Join(s) => Ok(s.handle_block(block)),
        }
    }

    /// Inject a round tick. Only the formation state has rounds.
    pub fn tick(&self) -> ConsensusResult<()> {
        match self {
            SwarmState::LearningInformed(s) => s.tick(),
            _ => Ok(()),
        }
    }

    /// Wait until the state has handled everything sent to it
    pub async fn sync(&self) -> ConsensusResult<()> {
        match self {
            SwarmState::LearningInformed(s) => s.sync().await,
            _ => Ok(()),
        }
    }
}

//! State of a node left out of the storage mapping

use super::{BlockChain, SwarmState};
use crate::ConsensusResult;
use std::sync::Arc;
use swarm_core::{Block, Host, Transaction};
use tracing::debug;

/// The node has to join the swarm through a member before taking part
#[derive(Debug, Clone)]
pub struct StateSwarmJoin {
    chain: Arc<BlockChain>,
}

impl StateSwarmJoin {
    pub fn new(chain: Arc<BlockChain>) -> Self {
        Self { chain }
    }

    pub fn chain(&self) -> &Arc<BlockChain> {
        &self.chain
    }

    /// Members of the swarm according to the latest block
    pub fn members(&self) -> Vec<Host> {
        self.chain
            .head()
            .map(|b| b.storage_mapping.into_keys().collect())
            .unwrap_or_default()
    }

    pub fn handle_transaction(&self, transaction: Transaction) -> ConsensusResult<()> {
        debug!(
            "STATE: joining node ignores transaction from {}",
            transaction.sender()
        );
        Ok(())
    }

    pub fn handle_block(&self, block: Block) -> SwarmState {
        debug!("STATE: joining node ignores block {}", block.id);
        SwarmState::Join(self.clone())
    }
}

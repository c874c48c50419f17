//! Steady state of a swarm member

use super::{BlockChain, SwarmState};
use crate::ConsensusResult;
use std::sync::Arc;
use swarm_core::{Block, Transaction};
use tracing::{debug, warn};

/// The node is a mapped member of a formed swarm
#[derive(Debug, Clone)]
pub struct StateSwarmConnected {
    chain: Arc<BlockChain>,
}

impl StateSwarmConnected {
    pub fn new(chain: Arc<BlockChain>) -> Self {
        Self { chain }
    }

    pub fn chain(&self) -> &Arc<BlockChain> {
        &self.chain
    }

    pub fn handle_transaction(&self, transaction: Transaction) -> ConsensusResult<()> {
        debug!(
            "STATE: connected node ignores transaction from {}",
            transaction.sender()
        );
        Ok(())
    }

    /// Append blocks of this swarm that are not in the history yet
    pub fn handle_block(&self, block: Block) -> SwarmState {
        if block.chain_id != self.chain.id() {
            warn!("STATE: block {} belongs to swarm {}", block.id, block.chain_id);
        } else if self.chain.contains_block(&block.id) {
            debug!("STATE: duplicate block {} ignored", block.id);
        } else {
            self.chain.add_block(block);
        }
        SwarmState::Connected(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appends_new_blocks_only() {
        let (chain, _rx) = BlockChain::channel("10.0.0.1:9988", "swarm-a");
        let state = StateSwarmConnected::new(chain);

        let block = Block::new("blk1", "swarm-a", "10.0.0.2:9988");
        let next = state.handle_block(block.clone());
        assert_eq!(next.name(), "Connected");
        assert_eq!(state.chain().history_len(), 1);

        state.handle_block(block);
        state.handle_block(Block::new("blk2", "swarm-b", "10.0.0.2:9988"));
        assert_eq!(state.chain().history_len(), 1);
    }
}

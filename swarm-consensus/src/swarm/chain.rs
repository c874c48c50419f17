//! Per-node block history and outgoing queue

use parking_lot::RwLock;
use std::sync::Arc;
use swarm_core::{Block, Host, NetworkObject};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// The node's view of one swarm: its block history plus the queue the
/// transport drains for broadcast
#[derive(Debug)]
pub struct BlockChain {
    host: Host,
    id: String,
    history: RwLock<Vec<Block>>,
    outgoing: mpsc::UnboundedSender<NetworkObject>,
}

impl BlockChain {
    pub fn new(
        host: impl Into<Host>,
        id: impl Into<String>,
        outgoing: mpsc::UnboundedSender<NetworkObject>,
    ) -> Self {
        Self {
            host: host.into(),
            id: id.into(),
            history: RwLock::new(Vec::new()),
            outgoing,
        }
    }

    /// Chain plus the receiving end of its outgoing queue
    pub fn channel(
        host: impl Into<Host>,
        id: impl Into<String>,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<NetworkObject>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self::new(host, id, tx)), rx)
    }

    /// Local host as announced to the swarm
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Swarm (chain) id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Copy of the block history
    pub fn block_history(&self) -> Vec<Block> {
        self.history.read().clone()
    }

    pub fn history_len(&self) -> usize {
        self.history.read().len()
    }

    pub fn first_block(&self) -> Option<Block> {
        self.history.read().first().cloned()
    }

    pub fn head(&self) -> Option<Block> {
        self.history.read().last().cloned()
    }

    /// Id of the latest block
    pub fn head_id(&self) -> Option<String> {
        self.history.read().last().map(|b| b.id.clone())
    }

    pub fn contains_block(&self, id: &str) -> bool {
        self.history.read().iter().any(|b| b.id == id)
    }

    pub fn add_block(&self, block: Block) {
        debug!("CHAIN: block {} appended by {}", block.id, self.host);
        self.history.write().push(block);
    }

    /// Hand an object to the transport
    pub fn enqueue_outgoing(&self, object: NetworkObject) {
        if self.outgoing.send(object).is_err() {
            warn!("CHAIN: outgoing queue of {} is closed", self.host);
        }
    }
}

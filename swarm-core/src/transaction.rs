//! Swarm transactions and outbound network objects

use crate::{Block, Host};
use serde::{Deserialize, Serialize};

/// Liveness announcement broadcast while a swarm is forming
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAlive {
    /// Announcing host
    pub node: Host,
    /// Swarm (chain) the host is announcing for
    pub swarm: String,
}

impl NodeAlive {
    pub fn new(node: impl Into<Host>, swarm: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            swarm: swarm.into(),
        }
    }
}

/// Proof-of-participation for the block `prev_block`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartBeatTransaction {
    /// Swarm (chain) id
    pub swarm: String,
    /// Sending host
    pub host: Host,
    /// Id of the block this heartbeat answers
    pub prev_block: String,
    /// Committed hash of the host's secret
    pub stage1: String,
    /// Revealed secret, empty until the reveal round
    pub stage2: String,
}

impl HeartBeatTransaction {
    /// Build a heartbeat answering `prev`
    pub fn new(
        prev: &Block,
        host: impl Into<Host>,
        stage1: impl Into<String>,
        stage2: impl Into<String>,
    ) -> Self {
        Self {
            swarm: prev.chain_id.clone(),
            host: host.into(),
            prev_block: prev.id.clone(),
            stage1: stage1.into(),
            stage2: stage2.into(),
        }
    }
}

/// Transactions understood by the swarm state machines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transaction {
    NodeAlive(NodeAlive),
    HeartBeat(HeartBeatTransaction),
}

impl Transaction {
    /// Swarm the transaction belongs to
    pub fn swarm_id(&self) -> &str {
        match self {
            Transaction::NodeAlive(n) => &n.swarm,
            Transaction::HeartBeat(h) => &h.swarm,
        }
    }

    /// Host that produced the transaction
    pub fn sender(&self) -> &str {
        match self {
            Transaction::NodeAlive(n) => &n.node,
            Transaction::HeartBeat(h) => &h.host,
        }
    }
}

impl From<NodeAlive> for Transaction {
    fn from(n: NodeAlive) -> Self {
        Transaction::NodeAlive(n)
    }
}

impl From<HeartBeatTransaction> for Transaction {
    fn from(h: HeartBeatTransaction) -> Self {
        Transaction::HeartBeat(h)
    }
}

/// Anything a node can hand to the transport for broadcast
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkObject {
    Transaction(Transaction),
    Block(Box<Block>),
}

impl From<Transaction> for NetworkObject {
    fn from(t: Transaction) -> Self {
        NetworkObject::Transaction(t)
    }
}

impl From<Block> for NetworkObject {
    fn from(b: Block) -> Self {
        NetworkObject::Block(Box::new(b))
    }
}

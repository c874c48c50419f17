//! In-process swarm
//!
//! Every node's chain feeds one outgoing queue. The router drains it and
//! broadcasts each object to every node, replacing a node's state whenever a
//! block moves it on. Ticks are driven by the router, so a run is a sequence
//! of tick-then-settle rounds.

use crate::{NodeResult, SimulationConfig};
use futures::future::join_all;
use std::time::Duration;
use swarm_consensus::{BlockChain, InformedStatus, SwarmConfig, SwarmState};
use swarm_core::{Block, Host, NetworkObject, Transaction};
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, info};

/// Outcome of a node after a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeReport {
    pub host: Host,
    pub state: &'static str,
    /// Ids of the blocks in the node's history
    pub blocks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationReport {
    pub rounds: usize,
    pub delivered: usize,
    pub nodes: Vec<NodeReport>,
}

impl SimulationReport {
    pub fn count(&self, state: &str) -> usize {
        self.nodes.iter().filter(|n| n.state == state).count()
    }

    /// Every node holds the same block history
    pub fn agreed(&self) -> bool {
        self.nodes.windows(2).all(|w| w[0].blocks == w[1].blocks)
    }
}

pub struct LocalSwarm {
    nodes: Vec<SwarmState>,
    outgoing: mpsc::UnboundedReceiver<NetworkObject>,
    broadcast_wait: Duration,
    delivered: usize,
    rounds: usize,
}

impl LocalSwarm {
    /// Start one node per host. Ticks are always driven by the swarm, so the
    /// tick interval of `config` is ignored. Must be called inside a tokio
    /// runtime.
    pub fn new(chain_id: &str, hosts: &[Host], config: SwarmConfig) -> Self {
        let config = config.with_tick_interval_ms(0);
        let broadcast_wait = config
            .block_broadcast_delay()
            .max(config.final_block_broadcast_delay());

        let (tx, outgoing) = mpsc::unbounded_channel();
        let nodes = hosts
            .iter()
            .map(|host| {
                let chain = BlockChain::new(host.as_str(), chain_id, tx.clone());
                SwarmState::start(chain.into(), config.clone())
            })
            .collect();

        info!("SIM: {} nodes started on swarm {}", hosts.len(), chain_id);
        Self {
            nodes,
            outgoing,
            broadcast_wait,
            delivered: 0,
            rounds: 0,
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(&config.chain_id, &config.hosts(), config.swarm.clone())
    }

    pub fn states(&self) -> &[SwarmState] {
        &self.nodes
    }

    /// True once no node is still forming the swarm
    pub fn is_settled(&self) -> bool {
        self.nodes
            .iter()
            .all(|n| !matches!(n, SwarmState::LearningInformed(_)))
    }

    /// Formation status of every node still forming the swarm
    pub async fn statuses(&self) -> NodeResult<Vec<(Host, InformedStatus)>> {
        let mut statuses = Vec::new();
        for node in &self.nodes {
            if let SwarmState::LearningInformed(state) = node {
                statuses.push((state.chain().host().to_string(), state.status().await?));
            }
        }
        Ok(statuses)
    }

    /// Tick every node, then deliver everything the round produced
    pub async fn tick(&mut self) -> NodeResult<usize> {
        self.rounds += 1;
        debug!("SIM: round {}", self.rounds);
        for node in &self.nodes {
            node.tick()?;
        }
        self.settle().await
    }

    /// Deliver pending traffic until nothing is in flight, including blocks
    /// held back by a broadcast delay
    pub async fn settle(&mut self) -> NodeResult<usize> {
        let mut delivered = self.deliver_pending().await?;
        if self.broadcast_wait.is_zero() {
            return Ok(delivered);
        }

        while let Ok(Some(object)) = time::timeout(self.broadcast_wait * 2, self.outgoing.recv()).await
        {
            self.broadcast(object).await?;
            delivered += 1 + self.deliver_pending().await?;
        }
        Ok(delivered)
    }

    /// Deliver queued objects until every node is idle and the queue is empty
    pub async fn deliver_pending(&mut self) -> NodeResult<usize> {
        let mut delivered = 0;
        loop {
            self.sync_all().await?;

            let mut batch = Vec::new();
            while let Ok(object) = self.outgoing.try_recv() {
                batch.push(object);
            }
            if batch.is_empty() {
                return Ok(delivered);
            }

            for object in batch {
                self.broadcast(object).await?;
                delivered += 1;
            }
        }
    }

    /// Settle the initial announcements, then tick until every node has left
    /// formation or `max_rounds` ticks have passed
    pub async fn run(&mut self, max_rounds: usize) -> NodeResult<SimulationReport> {
        self.settle().await?;
        while !self.is_settled() && self.rounds < max_rounds {
            self.tick().await?;
        }
        Ok(self.report())
    }

    pub fn report(&self) -> SimulationReport {
        SimulationReport {
            rounds: self.rounds,
            delivered: self.delivered,
            nodes: self
                .nodes
                .iter()
                .map(|n| NodeReport {
                    host: n.chain().host().to_string(),
                    state: n.name(),
                    blocks: n.chain().block_history().into_iter().map(|b| b.id).collect(),
                })
                .collect(),
        }
    }

    async fn sync_all(&self) -> NodeResult<()> {
        for result in join_all(self.nodes.iter().map(|n| n.sync())).await {
            result?;
        }
        Ok(())
    }

    async fn broadcast(&mut self, object: NetworkObject) -> NodeResult<()> {
        self.delivered += 1;
        match object {
            NetworkObject::Transaction(transaction) => self.broadcast_transaction(transaction),
            NetworkObject::Block(block) => self.broadcast_block(*block).await,
        }
    }

    fn broadcast_transaction(&self, transaction: Transaction) -> NodeResult<()> {
        for node in &self.nodes {
            node.handle_transaction(transaction.clone())?;
        }
        Ok(())
    }

    async fn broadcast_block(&mut self, block: Block) -> NodeResult<()> {
        let results = join_all(self.nodes.iter().map(|n| n.handle_block(block.clone()))).await;

        for (node, result) in self.nodes.iter_mut().zip(results) {
            let next = result?;
            if next.name() != node.name() {
                info!(
                    "SIM: {} moved from {} to {}",
                    node.chain().host(),
                    node.name(),
                    next.name()
                );
            }
            *node = next;
        }
        Ok(())
    }
}

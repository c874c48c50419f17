//! Swarm formation ("learning informed") state
//!
//! The state runs as a single actor task that owns all mutable state. The
//! handle talks to it over a mailbox; blocks carry a reply channel so the
//! caller learns which state comes next.

use super::{BlockChain, StateSwarmConnected, StateSwarmJoin, SwarmState};
use crate::elector::elect_compiler;
use crate::{ConsensusError, ConsensusResult, SwarmConfig};
use std::collections::{BTreeMap, HashMap};
use std::future;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use swarm_core::{
    hashed_random_data, random_string, Block, HeartBeatTransaction, Host, NetworkObject,
    NodeAlive, Transaction,
};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Length of generated block ids
const BLOCK_ID_LEN: usize = 8;

enum Command {
    Transaction(Transaction),
    Block {
        block: Block,
        reply: oneshot::Sender<Transition>,
    },
    Tick,
    Sync(oneshot::Sender<()>),
    Status(oneshot::Sender<InformedStatus>),
}

/// Outcome of handling a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    Stay,
    Connected,
    Join,
}

/// Snapshot of the formation state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InformedStatus {
    pub learning: bool,
    /// Known hosts and how many rounds each skipped as compiler
    pub hosts_seen: BTreeMap<Host, u32>,
    pub broadcast_count: u32,
    pub buffered_heartbeats: usize,
    /// A stage-two secret is held for a later reveal
    pub pending_reveal: bool,
    /// Compiler elected on the last round tick
    pub compiler: Option<Host>,
}

/// Handle to the formation state of one node
#[derive(Debug, Clone)]
pub struct StateSwarmInformed {
    tx: mpsc::UnboundedSender<Command>,
    chain: Arc<BlockChain>,
    config: SwarmConfig,
}

impl StateSwarmInformed {
    /// Start the state. Announces liveness once, then runs until a block
    /// moves the node to another state. Must be called inside a tokio
    /// runtime.
    pub fn new(chain: Arc<BlockChain>, config: SwarmConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let actor = InformedActor::new(Arc::clone(&chain), config.clone());
        tokio::spawn(actor.run(rx));

        info!("STATE: {} learning swarm {}", chain.host(), chain.id());
        Self { tx, chain, config }
    }

    pub fn chain(&self) -> &Arc<BlockChain> {
        &self.chain
    }

    pub fn handle_transaction(&self, transaction: Transaction) -> ConsensusResult<()> {
        self.send(Command::Transaction(transaction))
    }

    /// Hand a block to the state and return the state the node is in
    /// afterwards
    pub async fn handle_block(&self, block: Block) -> ConsensusResult<SwarmState> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Block { block, reply })?;
        let transition = rx
            .await
            .map_err(|e| ConsensusError::ChannelClosed(e.to_string()))?;

        Ok(match transition {
            Transition::Stay => SwarmState::LearningInformed(self.clone()),
            Transition::Connected => {
                SwarmState::Connected(StateSwarmConnected::new(Arc::clone(&self.chain)))
            }
            Transition::Join => {
                SwarmState::Join(StateSwarmJoin::new(Arc::clone(&self.chain)))
            }
        })
    }

    /// Inject a round tick
    pub fn tick(&self) -> ConsensusResult<()> {
        self.send(Command::Tick)
    }

    /// Wait until every command sent so far has been handled
    pub async fn sync(&self) -> ConsensusResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Sync(reply))?;
        rx.await
            .map_err(|e| ConsensusError::ChannelClosed(e.to_string()))
    }

    pub async fn status(&self) -> ConsensusResult<InformedStatus> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Status(reply))?;
        rx.await
            .map_err(|e| ConsensusError::ChannelClosed(e.to_string()))
    }

    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    fn send(&self, command: Command) -> ConsensusResult<()> {
        self.tx
            .send(command)
            .map_err(|_| ConsensusError::ChannelClosed("formation state has stopped".to_string()))
    }
}

struct InformedActor {
    chain: Arc<BlockChain>,
    config: SwarmConfig,
    hosts_seen: HashMap<Host, u32>,
    broadcast_count: u32,
    learning: bool,
    heartbeats: Vec<HeartBeatTransaction>,
    compiler: Option<Host>,
    /// Revealed in a later round
    stage2: Option<String>,
}

impl InformedActor {
    fn new(chain: Arc<BlockChain>, config: SwarmConfig) -> Self {
        Self {
            chain,
            config,
            hosts_seen: HashMap::new(),
            broadcast_count: 0,
            learning: true,
            heartbeats: Vec::new(),
            compiler: None,
            stage2: None,
        }
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        self.broadcast_life();

        let mut ticker = self.config.tick_interval().map(|period| {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        loop {
            let command = tokio::select! {
                command = rx.recv() => match command {
                    Some(command) => command,
                    None => break,
                },
                _ = next_tick(&mut ticker) => Command::Tick,
            };

            if self.handle_command(command).is_break() {
                break;
            }
        }

        debug!("STATE: formation state of {} stopped", self.chain.host());
    }

    fn handle_command(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::Transaction(transaction) => self.handle_transaction(transaction),
            Command::Block { block, reply } => {
                let transition = self.handle_block(block);
                let _ = reply.send(transition);
                if transition != Transition::Stay {
                    return ControlFlow::Break(());
                }
            }
            Command::Tick => self.on_tick(),
            Command::Sync(reply) => {
                let _ = reply.send(());
            }
            Command::Status(reply) => {
                let _ = reply.send(self.status());
            }
        }
        ControlFlow::Continue(())
    }

    fn broadcast_life(&mut self) {
        self.broadcast_count += 1;
        let alive = NodeAlive::new(self.chain.host(), self.chain.id());
        self.chain
            .enqueue_outgoing(Transaction::from(alive).into());
        debug!(
            "STATE: {} announced liveness ({} of {})",
            self.chain.host(),
            self.broadcast_count,
            self.config.max_liveness_broadcasts
        );
    }

    fn handle_transaction(&mut self, transaction: Transaction) {
        match transaction {
            Transaction::NodeAlive(alive) => {
                if !self.learning {
                    debug!("STATE: late liveness from {} ignored", alive.node);
                    return;
                }
                debug!("STATE: node {} added", alive.node);
                self.hosts_seen.insert(alive.node, 0);

                if self.hosts_seen.len() > self.config.liveness_resend_threshold
                    && self.broadcast_count < self.config.max_liveness_broadcasts
                {
                    self.broadcast_life();
                }
            }
            Transaction::HeartBeat(heartbeat) => {
                if self.learning {
                    debug!("STATE: heartbeat from {} while learning", heartbeat.host);
                    return;
                }
                if self.block_compiler().as_deref() != Some(self.chain.host()) {
                    return;
                }
                match self.chain.head_id() {
                    Some(head) if head == heartbeat.prev_block => {
                        debug!("STATE: heartbeat from {} buffered", heartbeat.host);
                        self.heartbeats.push(heartbeat);
                    }
                    _ => debug!(
                        "STATE: stale heartbeat from {} for block {}",
                        heartbeat.host, heartbeat.prev_block
                    ),
                }
            }
        }
    }

    fn on_tick(&mut self) {
        if self.learning {
            self.learning = false;
            info!(
                "STATE: {} stopped learning with {} hosts",
                self.chain.host(),
                self.hosts_seen.len()
            );
            return;
        }

        if self.chain.history_len() == 0 {
            if let Some(compiler) = &self.compiler {
                if let Some(skipped) = self.hosts_seen.get_mut(compiler) {
                    *skipped += 1;
                    warn!("STATE: compiler {} skipped its block", compiler);
                }
            }
        }

        if self.hosts_seen.len() <= self.config.majority_threshold() {
            debug!(
                "STATE: {} hosts known, need more than {}",
                self.hosts_seen.len(),
                self.config.majority_threshold()
            );
            return;
        }

        self.compiler = self.block_compiler();
        let is_compiler = self.compiler.as_deref() == Some(self.chain.host());
        debug!("STATE: compiler for this round is {:?}", self.compiler);

        match self.chain.history_len() {
            0 if is_compiler => self.generate_first_block(),
            1 if self.heartbeats.len() > self.config.min_heartbeats => {
                self.generate_final_block()
            }
            _ => {}
        }
    }

    fn handle_block(&mut self, block: Block) -> Transition {
        if self.learning {
            info!("STATE: block {} rejected while learning", block.id);
            return Transition::Stay;
        }

        let expected = self.block_compiler();
        if expected.as_deref() != Some(block.compiler.as_str()) {
            warn!(
                "STATE: block {} from {} rejected, expected compiler {:?}",
                block.id, block.compiler, expected
            );
            return Transition::Stay;
        }

        let host = self.chain.host().to_string();
        match self.chain.history_len() {
            0 => {
                let (stage1, stage2) = hashed_random_data(self.config.secret_len);
                self.stage2 = Some(stage2);

                if block.maps_host(&host) {
                    let heartbeat = HeartBeatTransaction::new(&block, host.as_str(), stage1, "");
                    self.chain
                        .enqueue_outgoing(Transaction::from(heartbeat).into());
                }
                info!("STATE: first block {} accepted", block.id);
                self.chain.add_block(block);
                Transition::Stay
            }
            1 => {
                let mapped = block.maps_host(&host);
                info!("STATE: second block {} accepted, mapped: {}", block.id, mapped);
                self.chain.add_block(block);
                if mapped {
                    Transition::Connected
                } else {
                    Transition::Join
                }
            }
            n => {
                debug!("STATE: block {} ignored with {} blocks in history", block.id, n);
                Transition::Stay
            }
        }
    }

    /// Compiler elected among hosts that never skipped a round
    fn block_compiler(&self) -> Option<Host> {
        let eligible = self
            .hosts_seen
            .iter()
            .filter(|(_, skipped)| **skipped == 0)
            .map(|(host, _)| host);
        elect_compiler(eligible, self.chain.id().as_bytes())
    }

    fn generate_first_block(&mut self) {
        let mut block = Block::new(random_string(BLOCK_ID_LEN), self.chain.id(), self.chain.host());
        for host in self.hosts_seen.keys() {
            block.storage_mapping.insert(host.clone(), None);
        }
        self.heartbeats.clear();

        info!(
            "STATE: generating first block {} mapping {} hosts",
            block.id,
            block.storage_mapping.len()
        );
        self.dispatch(block.into(), self.config.block_broadcast_delay());
    }

    fn generate_final_block(&mut self) {
        let Some(first) = self.chain.first_block() else {
            return;
        };

        let mut block = Block::new(random_string(BLOCK_ID_LEN), self.chain.id(), self.chain.host());
        block.storage_mapping = first.storage_mapping;
        for heartbeat in &self.heartbeats {
            block
                .entropy_stage1
                .insert(heartbeat.host.clone(), heartbeat.stage1.clone());
            block
                .heartbeats
                .insert(heartbeat.host.clone(), heartbeat.clone());
        }

        info!(
            "STATE: generating block {} with {} heartbeats",
            block.id,
            block.heartbeats.len()
        );
        self.dispatch(block.into(), self.config.final_block_broadcast_delay());
    }

    fn dispatch(&self, object: NetworkObject, delay: Duration) {
        if delay.is_zero() {
            self.chain.enqueue_outgoing(object);
            return;
        }

        let chain = Arc::clone(&self.chain);
        tokio::spawn(async move {
            time::sleep(delay).await;
            chain.enqueue_outgoing(object);
        });
    }

    fn status(&self) -> InformedStatus {
        InformedStatus {
            learning: self.learning,
            hosts_seen: self
                .hosts_seen
                .iter()
                .map(|(h, s)| (h.clone(), *s))
                .collect(),
            broadcast_count: self.broadcast_count,
            buffered_heartbeats: self.heartbeats.len(),
            pending_reveal: self.stage2.is_some(),
            compiler: self.compiler.clone(),
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => future::pending::<()>().await,
    }
}

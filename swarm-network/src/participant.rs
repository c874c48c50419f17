//! Quorum participant and the bootstrap join flow
//!
//! A participant without a bootstrap address founds a quorum by claiming
//! slot 0. Any other participant asks the bootstrap to be admitted; the
//! request travels as a hopeful to every member, is folded in on the next
//! round and the admitted sibling receives the quorum.

use crate::{NetworkError, NetworkResult, RemoteCall, Transport};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use swarm_consensus::{Heartbeat, Quorum, QuorumRegistry, Sibling, SwarmConfig};
use swarm_core::{random_entropy, Address, Keypair};
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

pub struct Participant {
    transport: Arc<dyn Transport>,
    config: SwarmConfig,
    keypair: Keypair,
    self_sibling: RwLock<Sibling>,
    quorum: QuorumRegistry,
    hopefuls: Mutex<Vec<Sibling>>,
    ticking: AtomicBool,
}

impl Participant {
    /// Create a participant at `address`. Without `bootstrap` it founds a new
    /// quorum; with one it sends a join request there.
    pub fn create(
        transport: Arc<dyn Transport>,
        address: Address,
        bootstrap: Option<&Address>,
        config: SwarmConfig,
    ) -> NetworkResult<Arc<Self>> {
        config
            .validate()
            .map_err(|e| NetworkError::Config(e.to_string()))?;

        let keypair = Keypair::generate()?;
        let sibling = Sibling::new(address, keypair.public_key());
        let participant = Arc::new(Self {
            transport,
            quorum: QuorumRegistry::new(config.quorum_size),
            config,
            keypair,
            self_sibling: RwLock::new(sibling.clone()),
            hopefuls: Mutex::new(Vec::new()),
            ticking: AtomicBool::new(false),
        });

        match bootstrap {
            None => {
                let founder = sibling.at_index(0);
                participant.quorum.write().insert(founder.clone())?;
                *participant.self_sibling.write() = founder;
                info!("PARTICIPANT: {} founded a quorum", sibling.address());
                participant.start_ticking();
            }
            Some(bootstrap) => {
                info!(
                    "PARTICIPANT: {} asking {} to join",
                    sibling.address(),
                    bootstrap
                );
                participant
                    .transport
                    .deliver(bootstrap, RemoteCall::JoinSwarm(sibling))?;
            }
        }

        Ok(participant)
    }

    pub fn self_sibling(&self) -> Sibling {
        self.self_sibling.read().clone()
    }

    /// Own slot, `UNASSIGNED_INDEX` until admitted
    pub fn index(&self) -> u8 {
        self.self_sibling.read().index()
    }

    pub fn public_key(&self) -> swarm_core::PublicKey {
        self.keypair.public_key()
    }

    pub fn quorum(&self) -> &QuorumRegistry {
        &self.quorum
    }

    pub fn is_ticking(&self) -> bool {
        self.ticking.load(Ordering::SeqCst)
    }

    /// Hopefuls waiting for the next round
    pub fn pending_hopefuls(&self) -> usize {
        self.hopefuls.lock().len()
    }

    /// Dispatch an incoming call
    pub fn handle_call(self: &Arc<Self>, call: RemoteCall) -> NetworkResult<()> {
        match call {
            RemoteCall::JoinSwarm(sibling) => self.join_swarm(sibling),
            RemoteCall::AddHopeful(sibling) => self.add_hopeful(sibling),
            RemoteCall::TransferQuorum(bytes) => self.transfer_quorum(&bytes),
        }
    }

    /// A hopeful asked to join: announce it to every member
    pub fn join_swarm(&self, sibling: Sibling) -> NetworkResult<()> {
        let members: Vec<Address> = self
            .quorum
            .read()
            .siblings()
            .map(|s| s.address().clone())
            .collect();

        debug!(
            "PARTICIPANT: announcing hopeful {} to {} members",
            sibling.address(),
            members.len()
        );
        for member in members {
            self.transport
                .deliver(&member, RemoteCall::AddHopeful(sibling.clone()))?;
        }
        Ok(())
    }

    /// Buffer a hopeful for the next round
    pub fn add_hopeful(&self, sibling: Sibling) -> NetworkResult<()> {
        if self.quorum.read().find(&sibling).is_some() {
            debug!("PARTICIPANT: {} is already a member", sibling.address());
            return Ok(());
        }

        let mut hopefuls = self.hopefuls.lock();
        if hopefuls.iter().any(|h| h.same_identity(&sibling)) {
            return Ok(());
        }
        debug!("PARTICIPANT: hopeful {} buffered", sibling.address());
        hopefuls.push(sibling);
        Ok(())
    }

    /// Compile one round from the local heartbeat and hand the quorum to
    /// every sibling admitted by it
    pub fn tick(&self) -> NetworkResult<Vec<Sibling>> {
        let me = self.self_sibling();
        if !self.is_ticking() || !me.is_assigned() {
            return Err(NetworkError::NotBootstrapped(me.address().to_string()));
        }

        let hopefuls = mem::take(&mut *self.hopefuls.lock());
        let mut heartbeats = BTreeMap::new();
        heartbeats.insert(me.index(), Heartbeat::new(hopefuls, random_entropy()));

        let admitted = self.quorum.compile_round(&heartbeats)?;
        for sibling in &admitted {
            if let Err(e) = self.send_quorum(sibling) {
                warn!(
                    "PARTICIPANT: quorum transfer to {} failed: {}",
                    sibling.address(),
                    e
                );
            }
        }
        Ok(admitted)
    }

    /// Place an admitted sibling in its slot and send it the quorum
    pub fn add_new_sibling(&self, sibling: Sibling) -> NetworkResult<()> {
        self.quorum.write().insert(sibling.clone())?;
        info!(
            "PARTICIPANT: sibling {} added in slot {}",
            sibling.address(),
            sibling.index()
        );
        self.send_quorum(&sibling)
    }

    /// Adopt a quorum received from a member, take the slot it assigns to
    /// this participant and start ticking
    pub fn transfer_quorum(self: &Arc<Self>, bytes: &[u8]) -> NetworkResult<()> {
        let quorum = Quorum::decode(bytes, self.config.quorum_size)?;
        let me = self.self_sibling();
        let assigned = quorum
            .find(&me)
            .cloned()
            .ok_or_else(|| NetworkError::NotBootstrapped(me.address().to_string()))?;

        info!(
            "PARTICIPANT: {} received quorum, slot {}",
            me.address(),
            assigned.index()
        );
        *self.self_sibling.write() = assigned;
        self.quorum.replace(quorum);
        self.start_ticking();
        Ok(())
    }

    fn send_quorum(&self, to: &Sibling) -> NetworkResult<()> {
        let bytes = self.quorum.encode()?;
        self.transport
            .deliver(to.address(), RemoteCall::TransferQuorum(bytes))
    }

    /// Mark the participant as ticking. With a tick interval configured and a
    /// runtime available, rounds are compiled on a timer; otherwise the
    /// caller drives `tick`.
    fn start_ticking(self: &Arc<Self>) {
        if self.ticking.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!("PARTICIPANT: {} started ticking", self.self_sibling.read().address());

        let Some(period) = self.config.tick_interval() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("PARTICIPANT: no runtime, rounds must be ticked by hand");
            return;
        };

        let participant = Arc::downgrade(self);
        runtime.spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                let Some(participant) = participant.upgrade() else {
                    break;
                };
                if let Err(e) = participant.tick() {
                    warn!("PARTICIPANT: round failed: {}", e);
                }
            }
        });
    }
}

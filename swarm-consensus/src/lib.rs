//! Swarm consensus engine
//!
//! This crate provides the quorum registry with its entropy chain, the
//! deterministic block compiler election, and the swarm formation state
//! machine.

pub mod config;
pub mod elector;
pub mod error;
pub mod quorum;
pub mod swarm;

pub use config::{SwarmConfig, MAX_QUORUM_SIZE};
pub use elector::{elect_compiler, rendezvous_score};
pub use error::{ConsensusError, ConsensusResult};
pub use quorum::{Heartbeat, Quorum, QuorumRegistry, Sibling};
pub use swarm::{
    BlockChain, InformedStatus, StateSwarmConnected, StateSwarmInformed, StateSwarmJoin,
    SwarmState,
};

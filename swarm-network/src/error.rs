//! Network error types

use swarm_consensus::ConsensusError;
use swarm_core::CoreError;
use thiserror::Error;

pub type NetworkResult<T> = Result<T, NetworkError>;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Consensus error: {0}")]
    Consensus(#[from] ConsensusError),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Unknown procedure: {0}")]
    UnknownProcedure(String),

    #[error("Delivery to {destination} failed: {reason}")]
    Delivery { destination: String, reason: String },

    #[error("Participant {0} has not joined a quorum")]
    NotBootstrapped(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

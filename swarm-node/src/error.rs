//! Simulation error types

use swarm_consensus::ConsensusError;
use thiserror::Error;

pub type NodeResult<T> = Result<T, NodeError>;

#[derive(Error, Debug)]
pub enum NodeError {
    #[error("Consensus error: {0}")]
    Consensus(#[from] ConsensusError),

    #[error("Configuration error: {0}")]
    Config(String),
}

//! Consensus error types

use swarm_core::CoreError;
use thiserror::Error;

/// Consensus error type
#[derive(Error, Debug, Clone)]
pub enum ConsensusError {
    /// Entropy draw over an empty range
    #[error("Invalid range: low {low} and high {high} leave nothing to draw")]
    InvalidRange { low: usize, high: usize },

    /// Value cannot be put on the wire
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Wire data is truncated or malformed
    #[error("Decode error: {0}")]
    Decode(String),

    /// No free slot left for a hopeful
    #[error("Quorum full: all {capacity} slots are occupied")]
    QuorumFull { capacity: usize },

    /// Slot index outside the quorum or already taken
    #[error("Invalid slot {index}: {reason}")]
    InvalidSlot { index: u8, reason: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The state machine's event loop is gone
    #[error("State machine channel closed: {0}")]
    ChannelClosed(String),

    /// Error bubbled up from the core crate
    #[error("Core error: {0}")]
    Core(String),

    /// Other error
    #[error("Consensus error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for ConsensusError {
    fn from(err: serde_json::Error) -> Self {
        ConsensusError::Serialization(err.to_string())
    }
}

impl From<CoreError> for ConsensusError {
    fn from(err: CoreError) -> Self {
        ConsensusError::Core(err.to_string())
    }
}

impl From<bincode::error::EncodeError> for ConsensusError {
    fn from(err: bincode::error::EncodeError) -> Self {
        ConsensusError::Encoding(err.to_string())
    }
}

impl From<bincode::error::DecodeError> for ConsensusError {
    fn from(err: bincode::error::DecodeError) -> Self {
        ConsensusError::Decode(err.to_string())
    }
}

/// Result type for consensus operations
pub type ConsensusResult<T> = Result<T, ConsensusError>;

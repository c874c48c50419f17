//! Swarm consensus configuration

use crate::{ConsensusError, ConsensusResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Largest quorum the one-byte slot index can address
pub const MAX_QUORUM_SIZE: usize = 255;

/// Swarm consensus configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    /// Number of sibling slots in a quorum
    pub quorum_size: usize,
    /// Expected number of hosts in a swarm
    pub swarm_size: usize,
    /// Block generation tick in milliseconds, 0 when ticks are injected by the caller
    pub tick_interval_ms: u64,
    /// Delay before the first block of a round is broadcast
    pub block_broadcast_delay_ms: u64,
    /// Delay before the heartbeat-carrying block is broadcast
    pub final_block_broadcast_delay_ms: u64,
    /// Known hosts needed before liveness is announced again
    pub liveness_resend_threshold: usize,
    /// Upper bound on liveness announcements per node
    pub max_liveness_broadcasts: u32,
    /// Buffered heartbeats needed (strictly more than) before the final block
    pub min_heartbeats: usize,
    /// Length in bytes of the stage-two entropy secret
    pub secret_len: usize,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            quorum_size: 4,
            swarm_size: 4,
            tick_interval_ms: 1000,
            block_broadcast_delay_ms: 100,
            final_block_broadcast_delay_ms: 500,
            liveness_resend_threshold: 2,
            max_liveness_broadcasts: 2,
            min_heartbeats: 2,
            secret_len: 8,
        }
    }
}

impl SwarmConfig {
    /// Configuration with ticks driven by the caller and no broadcast delays
    pub fn manual() -> Self {
        Self {
            tick_interval_ms: 0,
            block_broadcast_delay_ms: 0,
            final_block_broadcast_delay_ms: 0,
            ..Self::default()
        }
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ConsensusResult<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| ConsensusError::Config(format!("Failed to read config file: {}", e)))?;

        let config: SwarmConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> ConsensusResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), content)
            .map_err(|e| ConsensusError::Config(format!("Failed to write config file: {}", e)))?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConsensusResult<()> {
        if self.quorum_size == 0 || self.quorum_size > MAX_QUORUM_SIZE {
            return Err(ConsensusError::Config(format!(
                "Quorum size must be between 1 and {}, got {}",
                MAX_QUORUM_SIZE, self.quorum_size
            )));
        }

        if self.swarm_size == 0 {
            return Err(ConsensusError::Config(
                "Swarm size must be greater than 0".to_string(),
            ));
        }

        if self.max_liveness_broadcasts == 0 {
            return Err(ConsensusError::Config(
                "At least one liveness broadcast is required".to_string(),
            ));
        }

        if self.secret_len == 0 {
            return Err(ConsensusError::Config(
                "Secret length must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Hosts at or below this count are not enough to elect a compiler
    pub fn majority_threshold(&self) -> usize {
        self.swarm_size / 2
    }

    /// Tick period, `None` when ticks are injected externally
    pub fn tick_interval(&self) -> Option<Duration> {
        (self.tick_interval_ms > 0).then(|| Duration::from_millis(self.tick_interval_ms))
    }

    pub fn block_broadcast_delay(&self) -> Duration {
        Duration::from_millis(self.block_broadcast_delay_ms)
    }

    pub fn final_block_broadcast_delay(&self) -> Duration {
        Duration::from_millis(self.final_block_broadcast_delay_ms)
    }

    /// Set quorum size
    pub fn with_quorum_size(mut self, size: usize) -> Self {
        self.quorum_size = size;
        self
    }

    /// Set swarm size
    pub fn with_swarm_size(mut self, size: usize) -> Self {
        self.swarm_size = size;
        self
    }

    /// Set tick interval
    pub fn with_tick_interval_ms(mut self, ms: u64) -> Self {
        self.tick_interval_ms = ms;
        self
    }
}

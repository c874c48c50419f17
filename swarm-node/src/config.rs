//! Simulation configuration

use crate::{NodeError, NodeResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use swarm_consensus::SwarmConfig;
use swarm_core::Host;

/// Local swarm simulation settings. `swarm` holds the consensus parameters
/// every simulated node runs with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub chain_id: String,
    pub nodes: usize,
    /// Upper bound on ticks before the simulation gives up
    pub rounds: usize,
    pub base_port: u16,
    pub swarm: SwarmConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            chain_id: "swarm-sim".to_string(),
            nodes: 4,
            rounds: 8,
            base_port: 9988,
            swarm: SwarmConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Load configuration from a TOML file
    pub fn load_from_toml<P: AsRef<Path>>(path: P) -> NodeResult<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| NodeError::Config(format!("Failed to read config file: {}", e)))?;
        let config: SimulationConfig = toml::from_str(&content)
            .map_err(|e| NodeError::Config(format!("Invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> NodeResult<()> {
        if self.nodes == 0 {
            return Err(NodeError::Config("At least one node is required".to_string()));
        }
        if self.chain_id.is_empty() {
            return Err(NodeError::Config("Chain id must not be empty".to_string()));
        }
        self.swarm.validate()?;
        Ok(())
    }

    /// Hosts of the simulated nodes
    pub fn hosts(&self) -> Vec<Host> {
        (1..=self.nodes)
            .map(|i| format!("10.0.{}.{}:{}", i / 256, i % 256, self.base_port))
            .collect()
    }
}

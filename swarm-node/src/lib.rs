//! Local swarm simulation
//!
//! Runs a whole swarm inside one process: every node gets its own state
//! machine and chain, and a router broadcasts their traffic to each other.

pub mod config;
pub mod error;
pub mod simulation;

pub use config::SimulationConfig;
pub use error::{NodeError, NodeResult};
pub use simulation::{LocalSwarm, NodeReport, SimulationReport};

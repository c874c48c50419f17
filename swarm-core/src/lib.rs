//! Core swarm data structures
//!
//! This crate provides the building blocks shared by the consensus and
//! networking crates:
//! - Basic types (Entropy, Address, PublicKey, Host)
//! - Swarm transactions and blocks
//! - Hashing and key utilities

pub mod block;
pub mod crypto;
pub mod error;
pub mod transaction;
pub mod types;

// Re-export commonly used types
pub use block::*;
pub use crypto::*;
pub use error::*;
pub use transaction::*;
pub use types::*;

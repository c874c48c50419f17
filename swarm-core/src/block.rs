//! Swarm block data structure

use crate::{CoreResult, HeartBeatTransaction, Host};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a host is assigned to store. `None` means the host is a member of
/// the swarm without an assignment yet.
pub type StorageAssignment = Option<String>;

/// A block produced by the round's elected compiler
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Block {
    /// Block id
    pub id: String,
    /// Swarm (chain) id
    pub chain_id: String,
    /// Host that compiled the block
    pub compiler: Host,
    /// Heartbeats folded into this block, keyed by sending host
    pub heartbeats: BTreeMap<Host, HeartBeatTransaction>,
    /// Mapping of hosts to what they store
    pub storage_mapping: BTreeMap<Host, StorageAssignment>,
    /// Committed entropy hashes, keyed by host
    pub entropy_stage1: BTreeMap<Host, String>,
    /// Revealed entropy secrets, keyed by host
    pub entropy_stage2: BTreeMap<Host, String>,
}

impl Block {
    /// Create an empty block
    pub fn new(
        id: impl Into<String>,
        chain_id: impl Into<String>,
        compiler: impl Into<Host>,
    ) -> Self {
        Self {
            id: id.into(),
            chain_id: chain_id.into(),
            compiler: compiler.into(),
            ..Default::default()
        }
    }

    pub fn swarm_id(&self) -> &str {
        &self.chain_id
    }

    pub fn block_id(&self) -> &str {
        &self.id
    }

    /// True when `host` appears in the storage mapping
    pub fn maps_host(&self, host: &str) -> bool {
        self.storage_mapping.contains_key(host)
    }

    /// Text form used on the wire
    pub fn marshal_string(&self) -> CoreResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Parse a block from its text form
pub fn unmarshal_block(encoded: &str) -> CoreResult<Block> {
    Ok(serde_json::from_str(encoded)?)
}

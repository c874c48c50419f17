//! Transport abstraction and the in-memory test network

use crate::{NetworkResult, RemoteCall};
use parking_lot::Mutex;
use swarm_core::Address;
use tracing::debug;

/// Delivers remote calls to other participants
pub trait Transport: Send + Sync {
    fn deliver(&self, destination: &Address, call: RemoteCall) -> NetworkResult<()>;
}

/// A remote call as it travelled over the network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub destination: Address,
    pub procedure: String,
    pub payload: Vec<u8>,
}

impl Message {
    /// Decode the call carried by this message
    pub fn call(&self) -> NetworkResult<RemoteCall> {
        RemoteCall::decode(&self.procedure, &self.payload)
    }
}

/// Network that delivers nothing and records every message in order
#[derive(Debug, Default)]
pub struct ZeroNetwork {
    messages: Mutex<Vec<Message>>,
}

impl ZeroNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `i`-th message sent over this network
    pub fn recent_message(&self, i: usize) -> Option<Message> {
        self.messages.lock().get(i).cloned()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }
}

impl Transport for ZeroNetwork {
    fn deliver(&self, destination: &Address, call: RemoteCall) -> NetworkResult<()> {
        let (procedure, payload) = call.encode()?;
        debug!("ZERO: {} to {} ({} bytes)", procedure, destination, payload.len());
        self.messages.lock().push(Message {
            destination: destination.clone(),
            procedure: procedure.to_string(),
            payload,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_network_records_in_order() {
        let network = ZeroNetwork::new();
        assert!(network.is_empty());
        assert!(network.recent_message(0).is_none());

        let first = Address::new("10.0.0.1", 9988);
        let second = Address::new("10.0.0.2", 9988);
        network
            .deliver(&first, RemoteCall::TransferQuorum(vec![1, 2, 3]))
            .unwrap();
        network
            .deliver(&second, RemoteCall::TransferQuorum(vec![4]))
            .unwrap();

        assert_eq!(network.len(), 2);
        let m = network.recent_message(1).unwrap();
        assert_eq!(m.destination, second);
        assert_eq!(m.procedure, "Participant.TransferQuorum");
        assert_eq!(m.call().unwrap(), RemoteCall::TransferQuorum(vec![4]));
    }
}

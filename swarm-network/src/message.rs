//! Remote calls between participants

use crate::{NetworkError, NetworkResult};
use swarm_consensus::quorum::codec;
use swarm_consensus::Sibling;

/// Procedure names as they appear on the wire
pub mod procedures {
    /// A hopeful asks a quorum member to be admitted
    pub const JOIN_SWARM: &str = "Participant.JoinSwarm";
    /// A member announces a hopeful to its siblings
    pub const ADD_HOPEFUL: &str = "Participant.AddHopeful";
    /// A member hands the quorum to a newly admitted sibling
    pub const TRANSFER_QUORUM: &str = "Participant.TransferQuorum";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    JoinSwarm(Sibling),
    AddHopeful(Sibling),
    /// Encoded quorum
    TransferQuorum(Vec<u8>),
}

impl RemoteCall {
    pub fn procedure(&self) -> &'static str {
        match self {
            RemoteCall::JoinSwarm(_) => procedures::JOIN_SWARM,
            RemoteCall::AddHopeful(_) => procedures::ADD_HOPEFUL,
            RemoteCall::TransferQuorum(_) => procedures::TRANSFER_QUORUM,
        }
    }

    /// Procedure name and payload
    pub fn encode(&self) -> NetworkResult<(&'static str, Vec<u8>)> {
        let payload = match self {
            RemoteCall::JoinSwarm(sibling) | RemoteCall::AddHopeful(sibling) => {
                codec::encode_sibling(Some(sibling))?
            }
            RemoteCall::TransferQuorum(quorum) => quorum.clone(),
        };
        Ok((self.procedure(), payload))
    }

    pub fn decode(procedure: &str, payload: &[u8]) -> NetworkResult<Self> {
        match procedure {
            procedures::JOIN_SWARM => Ok(RemoteCall::JoinSwarm(codec::decode_sibling(payload)?)),
            procedures::ADD_HOPEFUL => Ok(RemoteCall::AddHopeful(codec::decode_sibling(payload)?)),
            procedures::TRANSFER_QUORUM => Ok(RemoteCall::TransferQuorum(payload.to_vec())),
            other => Err(NetworkError::UnknownProcedure(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_consensus::ConsensusError;
    use swarm_core::{Address, PublicKey};

    fn hopeful() -> Sibling {
        Sibling::new(
            Address::new("10.0.0.7", 9988),
            PublicKey::from_coordinates([7u8; 32], [8u8; 32]),
        )
    }

    #[test]
    fn test_join_request_on_the_wire() {
        let (procedure, payload) = RemoteCall::JoinSwarm(hopeful()).encode().unwrap();
        assert_eq!(procedure, "Participant.JoinSwarm");
        assert_eq!(payload[0], swarm_consensus::quorum::UNASSIGNED_INDEX);

        match RemoteCall::decode(procedure, &payload).unwrap() {
            RemoteCall::JoinSwarm(sibling) => assert_eq!(sibling, hopeful()),
            other => panic!("unexpected call: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_procedure() {
        assert!(matches!(
            RemoteCall::decode("Participant.Vanish", &[]),
            Err(NetworkError::UnknownProcedure(_))
        ));
    }

    #[test]
    fn test_keyless_sibling_cannot_be_sent() {
        let keyless = Sibling::from_parts(0, Address::new("10.0.0.7", 9988), None);
        assert!(matches!(
            RemoteCall::AddHopeful(keyless).encode(),
            Err(NetworkError::Consensus(ConsensusError::Encoding(_)))
        ));
    }

    #[test]
    fn test_truncated_sibling_payload() {
        let (_, payload) = RemoteCall::AddHopeful(hopeful()).encode().unwrap();
        assert!(matches!(
            RemoteCall::decode(procedures::ADD_HOPEFUL, &payload[..10]),
            Err(NetworkError::Consensus(ConsensusError::Decode(_)))
        ));
    }
}

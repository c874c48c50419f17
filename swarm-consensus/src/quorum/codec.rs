//! Wire encoding of siblings and quorums
//!
//! A sibling is `[index: u8][address][x: 32 bytes][y: 32 bytes]`. A quorum
//! is the sequence of its occupied siblings followed by the current and
//! upcoming entropy, each written as its own bincode value.
//!
//! Decoding is bounded: no single value may claim more than
//! [`MAX_FRAME_BYTES`], so a forged length prefix fails with a decode error
//! before anything is allocated.

use super::{Quorum, Sibling};
use crate::{ConsensusError, ConsensusResult};
use bincode::config::Config;
use swarm_core::{Address, Entropy, PublicKey};

/// Largest payload a sibling or quorum decode accepts
pub const MAX_FRAME_BYTES: usize = 64 * 1024;

fn wire_config() -> impl Config {
    bincode::config::standard().with_limit::<MAX_FRAME_BYTES>()
}

fn check_frame(bytes: &[u8]) -> ConsensusResult<()> {
    if bytes.len() > MAX_FRAME_BYTES {
        return Err(ConsensusError::Decode(format!(
            "frame of {} bytes exceeds {} byte limit",
            bytes.len(),
            MAX_FRAME_BYTES
        )));
    }
    Ok(())
}

#[derive(bincode::Encode, bincode::Decode)]
struct SiblingWire {
    index: u8,
    address: Address,
    x: [u8; 32],
    y: [u8; 32],
}

impl TryFrom<&Sibling> for SiblingWire {
    type Error = ConsensusError;

    fn try_from(sibling: &Sibling) -> ConsensusResult<Self> {
        let key = sibling.public_key().ok_or_else(|| {
            ConsensusError::Encoding(format!("sibling {} has no public key", sibling.address()))
        })?;
        let (x, y) = key.coordinates().ok_or_else(|| {
            ConsensusError::Encoding(format!(
                "public key of sibling {} is missing a coordinate",
                sibling.address()
            ))
        })?;

        Ok(Self {
            index: sibling.index(),
            address: sibling.address().clone(),
            x,
            y,
        })
    }
}

impl From<SiblingWire> for Sibling {
    fn from(wire: SiblingWire) -> Self {
        Sibling::from_parts(
            wire.index,
            wire.address,
            Some(PublicKey::from_coordinates(wire.x, wire.y)),
        )
    }
}

/// Encode a sibling. Fails when the sibling or any part of its key is absent.
pub fn encode_sibling(sibling: Option<&Sibling>) -> ConsensusResult<Vec<u8>> {
    let sibling =
        sibling.ok_or_else(|| ConsensusError::Encoding("no sibling to encode".to_string()))?;
    let wire = SiblingWire::try_from(sibling)?;
    Ok(bincode::encode_to_vec(&wire, wire_config())?)
}

/// Decode a sibling that fills `bytes` exactly
pub fn decode_sibling(bytes: &[u8]) -> ConsensusResult<Sibling> {
    check_frame(bytes)?;
    let (wire, read): (SiblingWire, usize) = bincode::decode_from_slice(bytes, wire_config())?;
    if read != bytes.len() {
        return Err(ConsensusError::Decode(format!(
            "{} trailing bytes after sibling",
            bytes.len() - read
        )));
    }
    Ok(wire.into())
}

/// Encode a quorum. An absent quorum encodes as an empty one with zero
/// entropy.
pub fn encode_quorum(quorum: Option<&Quorum>) -> ConsensusResult<Vec<u8>> {
    let empty;
    let quorum = match quorum {
        Some(quorum) => quorum,
        None => {
            empty = Quorum::new(0);
            &empty
        }
    };

    let siblings = quorum
        .siblings()
        .map(SiblingWire::try_from)
        .collect::<ConsensusResult<Vec<_>>>()?;

    let config = wire_config();
    let mut buf = bincode::encode_to_vec(&siblings, config)?;
    buf.extend(bincode::encode_to_vec(quorum.current_entropy(), config)?);
    buf.extend(bincode::encode_to_vec(quorum.upcoming_entropy(), config)?);
    Ok(buf)
}

/// Decode a quorum into a registry of `capacity` slots. Each sibling lands
/// in the slot its embedded index names.
pub fn decode_quorum(bytes: &[u8], capacity: usize) -> ConsensusResult<Quorum> {
    check_frame(bytes)?;
    let config = wire_config();

    let (siblings, mut offset): (Vec<SiblingWire>, usize) =
        bincode::decode_from_slice(bytes, config)?;
    let (current, read): (Entropy, usize) = bincode::decode_from_slice(&bytes[offset..], config)?;
    offset += read;
    let (upcoming, read): (Entropy, usize) = bincode::decode_from_slice(&bytes[offset..], config)?;
    offset += read;

    if offset != bytes.len() {
        return Err(ConsensusError::Decode(format!(
            "{} trailing bytes after quorum",
            bytes.len() - offset
        )));
    }

    if siblings.len() > capacity {
        return Err(ConsensusError::Decode(format!(
            "{} siblings do not fit {} slots",
            siblings.len(),
            capacity
        )));
    }

    let mut quorum = Quorum::new(capacity).with_entropy(current, upcoming);
    for wire in siblings {
        quorum
            .insert(Sibling::from(wire))
            .map_err(|e| ConsensusError::Decode(e.to_string()))?;
    }
    Ok(quorum)
}

impl Sibling {
    pub fn encode(&self) -> ConsensusResult<Vec<u8>> {
        encode_sibling(Some(self))
    }

    pub fn decode(bytes: &[u8]) -> ConsensusResult<Self> {
        decode_sibling(bytes)
    }
}

impl Quorum {
    pub fn encode(&self) -> ConsensusResult<Vec<u8>> {
        encode_quorum(Some(self))
    }

    pub fn decode(bytes: &[u8], capacity: usize) -> ConsensusResult<Self> {
        decode_quorum(bytes, capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sibling(n: u8) -> Sibling {
        Sibling::new(
            Address::new(format!("192.168.0.{}", n), 4000 + u16::from(n)),
            PublicKey::from_coordinates([n; 32], [0xff - n; 32]),
        )
    }

    #[test]
    fn test_sibling_layout() {
        let bytes = encode_sibling(Some(&sibling(1).at_index(3))).unwrap();
        assert_eq!(bytes[0], 3);
        assert_eq!(&bytes[bytes.len() - 64..bytes.len() - 32], &[1u8; 32]);
        assert_eq!(&bytes[bytes.len() - 32..], &[0xfeu8; 32]);

        let decoded = decode_sibling(&bytes).unwrap();
        assert_eq!(decoded, sibling(1).at_index(3));
    }

    #[test]
    fn test_encode_rejects_incomplete_siblings() {
        assert!(matches!(encode_sibling(None), Err(ConsensusError::Encoding(_))));

        let address = Address::new("192.168.0.1", 4001);
        let keyless = Sibling::from_parts(0, address.clone(), None);
        assert!(matches!(
            encode_sibling(Some(&keyless)),
            Err(ConsensusError::Encoding(_))
        ));

        let half_key = PublicKey {
            x: Some([1u8; 32]),
            y: None,
        };
        let half = Sibling::from_parts(0, address, Some(half_key));
        assert!(matches!(
            encode_sibling(Some(&half)),
            Err(ConsensusError::Encoding(_))
        ));

        let mut quorum = Quorum::new(2);
        quorum.insert(half).unwrap();
        assert!(encode_quorum(Some(&quorum)).is_err());
    }

    #[test]
    fn test_quorum_keeps_slots_and_entropy() {
        let mut quorum =
            Quorum::new(8).with_entropy(Entropy::new([0xaa; 32]), Entropy::new([0xbb; 32]));
        quorum.insert(sibling(1).at_index(0)).unwrap();
        quorum.insert(sibling(2).at_index(5)).unwrap();
        quorum.insert(sibling(3).at_index(7)).unwrap();

        let decoded = decode_quorum(&encode_quorum(Some(&quorum)).unwrap(), 8).unwrap();
        assert_eq!(decoded, quorum);
        assert_eq!(decoded.occupied(), vec![0, 5, 7]);
    }

    #[test]
    fn test_absent_quorum_is_empty() {
        let bytes = encode_quorum(None).unwrap();
        let decoded = decode_quorum(&bytes, 4).unwrap();
        assert!(decoded.is_empty());
        assert_eq!(decoded.current_entropy(), Entropy::zero());
        assert_eq!(decoded.upcoming_entropy(), Entropy::zero());
    }

    #[test]
    fn test_decode_rejects_out_of_range_index() {
        let mut quorum = Quorum::new(8);
        quorum.insert(sibling(1).at_index(6)).unwrap();
        let bytes = quorum.encode().unwrap();

        assert!(matches!(
            Quorum::decode(&bytes, 4),
            Err(ConsensusError::Decode(_))
        ));
        assert!(Quorum::decode(&bytes, 7).is_ok());
    }

    #[test]
    fn test_decode_rejects_truncated_input() {
        let mut quorum = Quorum::new(4).with_entropy(Entropy::new([1; 32]), Entropy::new([2; 32]));
        quorum.insert(sibling(1).at_index(1)).unwrap();
        let bytes = quorum.encode().unwrap();

        for cut in [0, 1, bytes.len() / 2, bytes.len() - 1] {
            assert!(matches!(
                decode_quorum(&bytes[..cut], 4),
                Err(ConsensusError::Decode(_))
            ));
        }

        let sibling_bytes = sibling(2).encode().unwrap();
        assert!(Sibling::decode(&sibling_bytes[..sibling_bytes.len() - 1]).is_err());

        let mut padded = sibling_bytes.clone();
        padded.push(0);
        assert!(Sibling::decode(&padded).is_err());
    }

    fn forged_length() -> Vec<u8> {
        let mut bytes = vec![0xfd];
        bytes.extend_from_slice(&(1u64 << 40).to_le_bytes());
        bytes
    }

    #[test]
    fn test_decode_rejects_forged_lengths() {
        // sibling count
        assert!(matches!(
            decode_quorum(&forged_length(), 4),
            Err(ConsensusError::Decode(_))
        ));

        // host length of a lone sibling
        let mut sibling_bytes = vec![0u8];
        sibling_bytes.extend(forged_length());
        assert!(matches!(
            decode_sibling(&sibling_bytes),
            Err(ConsensusError::Decode(_))
        ));

        // host length of the first sibling inside a quorum
        let mut quorum_bytes = vec![1u8];
        quorum_bytes.extend(sibling_bytes);
        assert!(matches!(
            decode_quorum(&quorum_bytes, 4),
            Err(ConsensusError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_rejects_oversized_frame() {
        let bytes = vec![0u8; MAX_FRAME_BYTES + 1];
        assert!(matches!(decode_sibling(&bytes), Err(ConsensusError::Decode(_))));
        assert!(matches!(decode_quorum(&bytes, 4), Err(ConsensusError::Decode(_))));
    }

    #[test]
    fn test_decode_rejects_more_siblings_than_slots() {
        let mut quorum = Quorum::new(4);
        quorum.insert(sibling(1).at_index(0)).unwrap();
        quorum.insert(sibling(2).at_index(1)).unwrap();
        quorum.insert(sibling(3).at_index(2)).unwrap();
        let bytes = quorum.encode().unwrap();

        assert!(matches!(decode_quorum(&bytes, 2), Err(ConsensusError::Decode(_))));
    }

    #[test]
    fn test_decode_places_siblings_by_embedded_index() {
        let wires = [5u8, 2, 0]
            .iter()
            .map(|slot| SiblingWire::try_from(&sibling(*slot + 1).at_index(*slot)).unwrap())
            .collect::<Vec<_>>();

        let config = wire_config();
        let mut bytes = bincode::encode_to_vec(&wires, config).unwrap();
        bytes.extend(bincode::encode_to_vec(Entropy::new([3; 32]), config).unwrap());
        bytes.extend(bincode::encode_to_vec(Entropy::new([4; 32]), config).unwrap());

        let quorum = decode_quorum(&bytes, 8).unwrap();
        assert_eq!(quorum.occupied(), vec![0, 2, 5]);
        for slot in [0u8, 2, 5] {
            assert_eq!(quorum.get(slot), Some(&sibling(slot + 1).at_index(slot)));
        }
        assert_eq!(quorum.current_entropy(), Entropy::new([3; 32]));
        assert_eq!(quorum.upcoming_entropy(), Entropy::new([4; 32]));
    }
}

//! Basic swarm types

use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Host identifier as announced on the swarm (e.g. "10.0.0.4:9988")
pub type Host = String;

/// Size in bytes of an entropy value
pub const ENTROPY_SIZE: usize = 32;

/// Fixed-size entropy value, advanced by truncated-hash chaining
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    bincode::Encode,
    bincode::Decode,
)]
pub struct Entropy([u8; ENTROPY_SIZE]);

impl Entropy {
    /// Create entropy from a byte array
    pub fn new(bytes: [u8; ENTROPY_SIZE]) -> Self {
        Self(bytes)
    }

    /// All-zero entropy
    pub fn zero() -> Self {
        Self([0u8; ENTROPY_SIZE])
    }

    /// Get the underlying byte array
    pub fn as_bytes(&self) -> &[u8; ENTROPY_SIZE] {
        &self.0
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Create from hex string
    pub fn from_hex(hex: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(hex)?;
        let bytes: [u8; ENTROPY_SIZE] = bytes
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Self(bytes))
    }
}

impl Default for Entropy {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Entropy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl From<[u8; ENTROPY_SIZE]> for Entropy {
    fn from(bytes: [u8; ENTROPY_SIZE]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Entropy {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Network address of a participant
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    bincode::Encode,
    bincode::Decode,
)]
pub struct Address {
    pub host: String,
    pub port: u16,
}

impl Address {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| CoreError::InvalidAddress(format!("missing port in '{}'", s)))?;
        if host.is_empty() {
            return Err(CoreError::InvalidAddress(format!("missing host in '{}'", s)));
        }
        let port = port
            .parse::<u16>()
            .map_err(|e| CoreError::InvalidAddress(format!("bad port in '{}': {}", s, e)))?;
        Ok(Self::new(host, port))
    }
}

/// Public key of a participant: the affine coordinates of an uncompressed
/// secp256k1 point. A key received from an untrusted source may be missing
/// either coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PublicKey {
    pub x: Option<[u8; 32]>,
    pub y: Option<[u8; 32]>,
}

impl PublicKey {
    /// Create a key from both coordinates
    pub fn from_coordinates(x: [u8; 32], y: [u8; 32]) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
        }
    }

    /// Both coordinates, if present
    pub fn coordinates(&self) -> Option<([u8; 32], [u8; 32])> {
        Some((self.x?, self.y?))
    }

    /// True when both coordinates are present
    pub fn is_complete(&self) -> bool {
        self.x.is_some() && self.y.is_some()
    }

    /// Convert back into a curve point, validating it
    pub fn to_secp256k1(&self) -> CoreResult<secp256k1::PublicKey> {
        let (x, y) = self
            .coordinates()
            .ok_or_else(|| CoreError::InvalidPublicKey("missing coordinate".to_string()))?;

        let mut bytes = [0u8; 65];
        bytes[0] = 0x04;
        bytes[1..33].copy_from_slice(&x);
        bytes[33..65].copy_from_slice(&y);

        secp256k1::PublicKey::from_slice(&bytes)
            .map_err(|e| CoreError::InvalidPublicKey(e.to_string()))
    }
}

impl From<&secp256k1::PublicKey> for PublicKey {
    fn from(key: &secp256k1::PublicKey) -> Self {
        let bytes = key.serialize_uncompressed();
        let mut x = [0u8; 32];
        let mut y = [0u8; 32];
        x.copy_from_slice(&bytes[1..33]);
        y.copy_from_slice(&bytes[33..65]);
        Self::from_coordinates(x, y)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.x {
            Some(x) => write!(f, "0x{}..", hex::encode(&x[..8])),
            None => write!(f, "<incomplete>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entropy_creation() {
        let entropy = Entropy::zero();
        assert_eq!(
            entropy.to_hex(),
            "0000000000000000000000000000000000000000000000000000000000000000"
        );
        assert_eq!(entropy, Entropy::default());

        let entropy2 = Entropy::new([1u8; ENTROPY_SIZE]);
        assert_eq!(
            entropy2.to_hex(),
            "0101010101010101010101010101010101010101010101010101010101010101"
        );
    }

    #[test]
    fn test_entropy_from_hex() {
        let hex = "1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef";
        let entropy = Entropy::from_hex(hex).unwrap();
        assert_eq!(entropy.to_hex(), hex);

        assert!(Entropy::from_hex("1234").is_err());
    }

    #[test]
    fn test_address_parse() {
        let addr: Address = "127.0.0.1:9988".parse().unwrap();
        assert_eq!(addr, Address::new("127.0.0.1", 9988));
        assert_eq!(addr.to_string(), "127.0.0.1:9988");

        assert!("127.0.0.1".parse::<Address>().is_err());
        assert!(":9988".parse::<Address>().is_err());
        assert!("localhost:notaport".parse::<Address>().is_err());
    }

    #[test]
    fn test_incomplete_public_key() {
        let key = PublicKey {
            x: Some([1u8; 32]),
            y: None,
        };
        assert!(!key.is_complete());
        assert!(key.coordinates().is_none());
        assert!(key.to_secp256k1().is_err());
        assert_eq!(key.to_string(), "0x0101010101010101..");
    }
}

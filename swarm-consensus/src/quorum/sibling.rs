//! Slot-bound identities of quorum members

use serde::{Deserialize, Serialize};
use std::fmt;
use swarm_core::{Address, PublicKey};

/// Index carried by a sibling that has not been given a slot yet
pub const UNASSIGNED_INDEX: u8 = u8::MAX;

/// Identifies another member of the quorum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sibling {
    index: u8,
    address: Address,
    public_key: Option<PublicKey>,
}

impl Sibling {
    /// A new identity that has not been placed in a quorum
    pub fn new(address: Address, public_key: PublicKey) -> Self {
        Self {
            index: UNASSIGNED_INDEX,
            address,
            public_key: Some(public_key),
        }
    }

    /// Build a sibling from raw parts, including incomplete identities
    /// received from peers
    pub fn from_parts(index: u8, address: Address, public_key: Option<PublicKey>) -> Self {
        Self {
            index,
            address,
            public_key,
        }
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn public_key(&self) -> Option<&PublicKey> {
        self.public_key.as_ref()
    }

    pub fn is_assigned(&self) -> bool {
        self.index != UNASSIGNED_INDEX
    }

    /// Copy of this identity bound to `index`
    pub fn at_index(&self, index: u8) -> Self {
        Self {
            index,
            ..self.clone()
        }
    }

    /// Identity equality: same address and same public key. The slot index
    /// takes no part in it.
    pub fn same_identity(&self, other: &Sibling) -> bool {
        if self.address != other.address {
            return false;
        }
        match (&self.public_key, &other.public_key) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Sibling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.index, self.address)
    }
}

/// Identity equality where either side may be absent
pub fn compare(a: Option<&Sibling>, b: Option<&Sibling>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.same_identity(b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(seed: u8) -> PublicKey {
        PublicKey::from_coordinates([seed; 32], [seed.wrapping_add(1); 32])
    }

    #[test]
    fn test_new_sibling_is_unassigned() {
        let s = Sibling::new(Address::new("10.0.0.1", 9988), key(1));
        assert_eq!(s.index(), UNASSIGNED_INDEX);
        assert!(!s.is_assigned());
        assert!(s.at_index(2).is_assigned());
        assert_eq!(s.at_index(2).to_string(), "2 10.0.0.1:9988");
    }

    #[test]
    fn test_compare() {
        let a = Sibling::new(Address::new("10.0.0.1", 9988), key(1));

        assert!(compare(Some(&a), Some(&a.at_index(3))));
        assert!(!compare(Some(&a), None));
        assert!(!compare(None, Some(&a)));
        assert!(!compare(None, None));

        let other_address = Sibling::new(Address::new("10.0.0.2", 9988), key(1));
        assert!(!compare(Some(&a), Some(&other_address)));

        let other_key = Sibling::new(Address::new("10.0.0.1", 9988), key(7));
        assert!(!compare(Some(&a), Some(&other_key)));

        let keyless = Sibling::from_parts(0, Address::new("10.0.0.1", 9988), None);
        assert!(!compare(Some(&keyless), Some(&keyless)));
    }
}

//! Quorum registry
//!
//! A quorum is a fixed-capacity table of sibling slots plus two entropy
//! values. `current_entropy` drives orderings for the round being compiled;
//! `upcoming_entropy` accumulates heartbeat contributions and is promoted
//! once a round is compiled.

pub mod codec;
pub mod entropy;
pub mod heartbeat;
pub mod sibling;

pub use heartbeat::Heartbeat;
pub use sibling::{compare, Sibling, UNASSIGNED_INDEX};

use crate::{ConsensusError, ConsensusResult, MAX_QUORUM_SIZE};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::BTreeMap;
use swarm_core::Entropy;
use tracing::{debug, info};

/// Fixed-capacity sibling table with its entropy chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quorum {
    capacity: usize,
    siblings: BTreeMap<u8, Sibling>,
    current_entropy: Entropy,
    upcoming_entropy: Entropy,
}

impl Quorum {
    /// Empty quorum with `capacity` slots and zero entropy
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.min(MAX_QUORUM_SIZE),
            siblings: BTreeMap::new(),
            current_entropy: Entropy::zero(),
            upcoming_entropy: Entropy::zero(),
        }
    }

    /// Replace both entropy values
    pub fn with_entropy(mut self, current: Entropy, upcoming: Entropy) -> Self {
        self.current_entropy = current;
        self.upcoming_entropy = upcoming;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.siblings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.siblings.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.siblings.len() >= self.capacity
    }

    pub fn current_entropy(&self) -> Entropy {
        self.current_entropy
    }

    pub fn upcoming_entropy(&self) -> Entropy {
        self.upcoming_entropy
    }

    /// Sibling in slot `index`
    pub fn get(&self, index: u8) -> Option<&Sibling> {
        self.siblings.get(&index)
    }

    /// Occupied slots in ascending order
    pub fn siblings(&self) -> impl Iterator<Item = &Sibling> {
        self.siblings.values()
    }

    /// Indices of occupied slots in ascending order
    pub fn occupied(&self) -> Vec<u8> {
        self.siblings.keys().copied().collect()
    }

    /// Occupied sibling with the same identity as `sibling`
    pub fn find(&self, sibling: &Sibling) -> Option<&Sibling> {
        self.siblings.values().find(|s| s.same_identity(sibling))
    }

    /// Place `sibling` in the slot its index names
    pub fn insert(&mut self, sibling: Sibling) -> ConsensusResult<()> {
        let index = sibling.index();
        if usize::from(index) >= self.capacity {
            return Err(ConsensusError::InvalidSlot {
                index,
                reason: format!("outside quorum of {} slots", self.capacity),
            });
        }
        if self.siblings.contains_key(&index) {
            return Err(ConsensusError::InvalidSlot {
                index,
                reason: "slot is occupied".to_string(),
            });
        }

        debug!("QUORUM: sibling {} placed in slot {}", sibling.address(), index);
        self.siblings.insert(index, sibling);
        Ok(())
    }

    /// Free slot `index`, returning its sibling
    pub fn remove(&mut self, index: u8) -> Option<Sibling> {
        let removed = self.siblings.remove(&index);
        if let Some(sibling) = &removed {
            debug!("QUORUM: sibling {} left slot {}", sibling.address(), index);
        }
        removed
    }

    /// Place `sibling` in the lowest free slot, returning the placed copy
    pub fn insert_first_fit(&mut self, sibling: &Sibling) -> ConsensusResult<Sibling> {
        let index = (0..self.capacity)
            .map(|i| i as u8)
            .find(|i| !self.siblings.contains_key(i))
            .ok_or(ConsensusError::QuorumFull {
                capacity: self.capacity,
            })?;

        let placed = sibling.at_index(index);
        self.insert(placed.clone())?;
        Ok(placed)
    }

    /// Draw an integer in `[low, high)` from the current entropy, advancing it
    pub fn rand_int(&mut self, low: usize, high: usize) -> ConsensusResult<usize> {
        let (value, next) = entropy::draw_int(&self.current_entropy, low, high)?;
        self.current_entropy = next;
        Ok(value)
    }

    /// Shuffle the occupied slot indices with the current entropy, consuming
    /// one draw per occupied slot
    pub fn sibling_ordering(&mut self) -> ConsensusResult<Vec<u8>> {
        let mut ordering = self.occupied();
        self.current_entropy = entropy::shuffle(&mut ordering, self.current_entropy)?;
        Ok(ordering)
    }

    /// The ordering `sibling_ordering` would produce, leaving the entropy alone
    pub fn preview_ordering(&self) -> ConsensusResult<Vec<u8>> {
        let mut ordering = self.occupied();
        entropy::shuffle(&mut ordering, self.current_entropy)?;
        Ok(ordering)
    }

    /// Apply the heartbeats of one round in the order drawn from the current
    /// entropy, then promote the upcoming entropy. Heartbeats are keyed by
    /// the slot of the sibling that sent them; slots without one are skipped.
    pub fn compile_round(
        &mut self,
        heartbeats: &BTreeMap<u8, Heartbeat>,
    ) -> ConsensusResult<Vec<Sibling>> {
        let ordering = self.sibling_ordering()?;
        let mut admitted = Vec::new();

        for index in ordering {
            if let Some(heartbeat) = heartbeats.get(&index) {
                admitted.extend(self.process_heartbeat(heartbeat));
            }
        }

        self.current_entropy = self.upcoming_entropy;
        info!(
            "QUORUM: round compiled, {} admitted, {} of {} slots occupied",
            admitted.len(),
            self.len(),
            self.capacity
        );
        Ok(admitted)
    }

    /// One-line summary for logs and status queries
    pub fn status(&self) -> String {
        let slots: Vec<String> = self.siblings.values().map(|s| s.to_string()).collect();
        format!(
            "quorum {}/{} [{}] current {} upcoming {}",
            self.len(),
            self.capacity,
            slots.join(", "),
            self.current_entropy,
            self.upcoming_entropy
        )
    }
}

/// Shared quorum. Readers take the read lock; the round compiler holds the
/// write lock for the whole round.
#[derive(Debug)]
pub struct QuorumRegistry {
    quorum: RwLock<Quorum>,
}

impl QuorumRegistry {
    pub fn new(capacity: usize) -> Self {
        Self::from_quorum(Quorum::new(capacity))
    }

    pub fn from_quorum(quorum: Quorum) -> Self {
        Self {
            quorum: RwLock::new(quorum),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Quorum> {
        self.quorum.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Quorum> {
        self.quorum.write()
    }

    /// Swap in a quorum received from a peer
    pub fn replace(&self, quorum: Quorum) -> Quorum {
        std::mem::replace(&mut *self.quorum.write(), quorum)
    }

    /// Copy of the quorum as it stands
    pub fn snapshot(&self) -> Quorum {
        self.quorum.read().clone()
    }

    pub fn status(&self) -> String {
        self.quorum.read().status()
    }

    /// Broadcast order for the current entropy
    pub fn broadcast_ordering(&self) -> ConsensusResult<Vec<u8>> {
        self.quorum.read().preview_ordering()
    }

    pub fn compile_round(
        &self,
        heartbeats: &BTreeMap<u8, Heartbeat>,
    ) -> ConsensusResult<Vec<Sibling>> {
        self.quorum.write().compile_round(heartbeats)
    }

    /// Wire form of the quorum
    pub fn encode(&self) -> ConsensusResult<Vec<u8>> {
        codec::encode_quorum(Some(&*self.quorum.read()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;
    use swarm_core::{Address, PublicKey};

    fn sibling(n: u8) -> Sibling {
        Sibling::new(
            Address::new(format!("10.0.0.{}", n), 9988),
            PublicKey::from_coordinates([n; 32], [n.wrapping_mul(3); 32]),
        )
    }

    fn quorum_with(capacity: usize, slots: &[u8], entropy: Entropy) -> Quorum {
        let mut quorum = Quorum::new(capacity).with_entropy(entropy, Entropy::zero());
        for slot in slots {
            quorum.insert(sibling(*slot).at_index(*slot)).unwrap();
        }
        quorum
    }

    #[test]
    fn test_insert_and_remove() {
        let mut quorum = Quorum::new(4);
        quorum.insert(sibling(1).at_index(2)).unwrap();

        assert_eq!(quorum.len(), 1);
        assert_eq!(quorum.get(2).map(|s| s.index()), Some(2));
        assert!(quorum.find(&sibling(1)).is_some());
        assert!(quorum.find(&sibling(2)).is_none());

        assert!(matches!(
            quorum.insert(sibling(2).at_index(2)),
            Err(ConsensusError::InvalidSlot { index: 2, .. })
        ));
        assert!(quorum.insert(sibling(2).at_index(4)).is_err());
        assert!(quorum.insert(sibling(2)).is_err());

        let removed = quorum.remove(2).unwrap();
        assert_eq!(removed.address(), sibling(1).address());
        assert!(quorum.is_empty());
        assert!(quorum.remove(2).is_none());
    }

    #[test]
    fn test_insert_first_fit() {
        let mut quorum = quorum_with(3, &[0, 2], Entropy::zero());
        let placed = quorum.insert_first_fit(&sibling(9)).unwrap();
        assert_eq!(placed.index(), 1);
        assert!(quorum.is_full());

        assert!(matches!(
            quorum.insert_first_fit(&sibling(8)),
            Err(ConsensusError::QuorumFull { capacity: 3 })
        ));
    }

    #[test]
    fn test_rand_int_advances_entropy() {
        let mut quorum = Quorum::new(4);
        assert_eq!(quorum.rand_int(0, 1).unwrap(), 0);
        assert_eq!(
            quorum.current_entropy(),
            swarm_core::truncated_hash(Entropy::zero().as_bytes())
        );

        let before = quorum.current_entropy();
        assert!(quorum.rand_int(2, 2).is_err());
        assert_eq!(quorum.current_entropy(), before);
    }

    #[test]
    fn test_empty_quorum_ordering() {
        let mut quorum = Quorum::new(4).with_entropy(Entropy::new([5u8; 32]), Entropy::zero());
        assert!(quorum.sibling_ordering().unwrap().is_empty());
        assert_eq!(quorum.current_entropy(), Entropy::new([5u8; 32]));
    }

    #[test]
    fn test_preview_matches_ordering() {
        let mut quorum = quorum_with(8, &[0, 1, 3, 6, 7], Entropy::new([42u8; 32]));
        let preview = quorum.preview_ordering().unwrap();
        let before = quorum.current_entropy();

        let ordering = quorum.sibling_ordering().unwrap();
        assert_eq!(preview, ordering);
        assert_ne!(quorum.current_entropy(), before);
    }

    #[test]
    fn test_compile_round_promotes_upcoming() {
        let mut quorum = quorum_with(4, &[0, 1], Entropy::new([1u8; 32]));
        let mut heartbeats = BTreeMap::new();
        heartbeats.insert(
            0,
            Heartbeat::new(vec![sibling(20)], Entropy::new([2u8; 32])),
        );
        heartbeats.insert(
            1,
            Heartbeat::new(vec![sibling(21), sibling(22)], Entropy::new([3u8; 32])),
        );
        // a heartbeat from an empty slot is not applied
        heartbeats.insert(3, Heartbeat::new(vec![sibling(23)], Entropy::new([4u8; 32])));

        let admitted = quorum.compile_round(&heartbeats).unwrap();

        assert_eq!(admitted.len(), 2);
        assert!(quorum.is_full());
        assert!(quorum.find(&sibling(23)).is_none());
        assert_eq!(quorum.current_entropy(), quorum.upcoming_entropy());
        assert_ne!(quorum.upcoming_entropy(), Entropy::zero());
    }

    #[test]
    fn test_registry() {
        let registry = QuorumRegistry::from_quorum(quorum_with(4, &[1, 2], Entropy::zero()));
        assert_eq!(registry.broadcast_ordering().unwrap().len(), 2);
        assert!(registry.status().starts_with("quorum 2/4"));

        registry.write().remove(1);
        assert_eq!(registry.read().len(), 1);

        let old = registry.replace(Quorum::new(6));
        assert_eq!(old.len(), 1);
        assert_eq!(registry.snapshot().capacity(), 6);
    }

    proptest! {
        #[test]
        fn prop_ordering_is_permutation_of_occupied(
            bytes in any::<[u8; 32]>(),
            slots in proptest::collection::btree_set(0u8..32, 0..32),
        ) {
            let slots: Vec<u8> = slots.into_iter().collect();
            let mut quorum = quorum_with(32, &slots, Entropy::new(bytes));

            let ordering = quorum.sibling_ordering().unwrap();

            prop_assert_eq!(ordering.len(), slots.len());
            let seen: BTreeSet<u8> = ordering.iter().copied().collect();
            prop_assert_eq!(seen.len(), ordering.len());
            prop_assert_eq!(seen.into_iter().collect::<Vec<_>>(), slots);
        }

        #[test]
        fn prop_ordering_is_deterministic(
            bytes in any::<[u8; 32]>(),
            slots in proptest::collection::btree_set(0u8..16, 1..16),
        ) {
            let slots: Vec<u8> = slots.into_iter().collect();
            let mut a = quorum_with(16, &slots, Entropy::new(bytes));
            let mut b = quorum_with(16, &slots, Entropy::new(bytes));

            prop_assert_eq!(a.sibling_ordering().unwrap(), b.sibling_ordering().unwrap());
            prop_assert_eq!(a.current_entropy(), b.current_entropy());
        }
    }
}

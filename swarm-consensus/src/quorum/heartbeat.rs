//! Heartbeat processing

use super::{entropy, Quorum, Sibling};
use swarm_core::Entropy;
use tracing::{debug, warn};

/// A member's per-round contribution: hopefuls it vouches for and a piece
/// of entropy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Heartbeat {
    pub hopefuls: Vec<Sibling>,
    pub entropy: Entropy,
}

impl Heartbeat {
    pub fn new(hopefuls: Vec<Sibling>, entropy: Entropy) -> Self {
        Self { hopefuls, entropy }
    }
}

impl Quorum {
    /// Admit the heartbeat's hopefuls into the lowest free slots and fold its
    /// entropy into the upcoming entropy. Hopefuls that find no free slot are
    /// dropped. Returns the admitted siblings with their assigned slots.
    pub fn process_heartbeat(&mut self, heartbeat: &Heartbeat) -> Vec<Sibling> {
        let mut admitted = Vec::with_capacity(heartbeat.hopefuls.len());

        for hopeful in &heartbeat.hopefuls {
            match self.insert_first_fit(hopeful) {
                Ok(placed) => {
                    debug!(
                        "QUORUM: hopeful {} admitted to slot {}",
                        placed.address(),
                        placed.index()
                    );
                    admitted.push(placed);
                }
                Err(e) => warn!("QUORUM: hopeful {} dropped: {}", hopeful.address(), e),
            }
        }

        self.upcoming_entropy = entropy::chain(&self.upcoming_entropy, heartbeat.entropy.as_bytes());
        admitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;
    use swarm_core::{truncated_hash, Address, PublicKey};

    fn hopeful(n: u8) -> Sibling {
        Sibling::new(
            Address::new(format!("10.0.1.{}", n), 9988),
            PublicKey::from_coordinates([n; 32], [n; 32]),
        )
    }

    #[test]
    fn test_single_hopeful_takes_next_slot() {
        let mut quorum = Quorum::new(4);
        quorum.insert(hopeful(100).at_index(0)).unwrap();

        let admitted = quorum.process_heartbeat(&Heartbeat::new(vec![hopeful(1)], Entropy::zero()));

        assert_eq!(admitted.len(), 1);
        assert_eq!(admitted[0].index(), 1);
        assert_eq!(quorum.get(1), Some(&admitted[0]));
    }

    #[test]
    fn test_first_fit_admission() {
        let mut quorum = Quorum::new(4);
        quorum.insert(hopeful(100).at_index(1)).unwrap();

        let heartbeat = Heartbeat::new(vec![hopeful(1), hopeful(2), hopeful(3)], Entropy::zero());
        let admitted = quorum.process_heartbeat(&heartbeat);

        let slots: Vec<u8> = admitted.iter().map(|s| s.index()).collect();
        assert_eq!(slots, vec![0, 2, 3]);
        assert!(quorum.is_full());
        assert_eq!(quorum.get(2).unwrap().address(), hopeful(2).address());
    }

    #[test]
    fn test_full_quorum_drops_hopefuls() {
        let mut quorum = Quorum::new(1);
        let heartbeat = Heartbeat::new(vec![hopeful(1), hopeful(2)], Entropy::new([7u8; 32]));

        let admitted = quorum.process_heartbeat(&heartbeat);
        assert_eq!(admitted.len(), 1);
        assert_eq!(quorum.len(), 1);
        assert!(quorum.find(&hopeful(2)).is_none());
    }

    #[test]
    fn test_entropy_is_chained() {
        let mut quorum = Quorum::new(4);
        let contribution = Entropy::new([7u8; 32]);
        quorum.process_heartbeat(&Heartbeat::new(Vec::new(), contribution));

        let mut data = Entropy::zero().as_bytes().to_vec();
        data.extend_from_slice(contribution.as_bytes());
        assert_eq!(quorum.upcoming_entropy(), truncated_hash(&data));
        assert_eq!(quorum.current_entropy(), Entropy::zero());
    }

    proptest! {
        #[test]
        fn prop_admission_respects_capacity(
            capacity in 1usize..16,
            occupied in proptest::collection::btree_set(0u8..16, 0..16),
            hopefuls in 0u8..24,
        ) {
            let mut quorum = Quorum::new(capacity);
            for slot in occupied.iter().filter(|s| usize::from(**s) < capacity) {
                quorum.insert(hopeful(200 - *slot).at_index(*slot)).unwrap();
            }
            let before = quorum.len();

            let heartbeat = Heartbeat::new((0..hopefuls).map(hopeful).collect(), Entropy::zero());
            let admitted = quorum.process_heartbeat(&heartbeat);

            let slots: BTreeSet<u8> = admitted.iter().map(|s| s.index()).collect();
            prop_assert_eq!(slots.len(), admitted.len());
            prop_assert!(quorum.len() <= capacity);
            prop_assert_eq!(quorum.len(), before + admitted.len());
            prop_assert_eq!(admitted.len(), usize::from(hopefuls).min(capacity - before));
            for sibling in &admitted {
                prop_assert_eq!(quorum.get(sibling.index()), Some(sibling));
            }
        }
    }
}

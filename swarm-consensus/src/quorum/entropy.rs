//! Deterministic entropy chain
//!
//! Every draw reads the current entropy and replaces it with its truncated
//! hash. The functions here are pure: they take an entropy value and return
//! the next one, and the quorum threads the result through its own state.

use crate::{ConsensusError, ConsensusResult};
use swarm_core::{truncated_hash, Entropy};

/// Draw an integer in `[low, high)` from `entropy`.
///
/// Returns the drawn value and the advanced entropy.
pub fn draw_int(entropy: &Entropy, low: usize, high: usize) -> ConsensusResult<(usize, Entropy)> {
    if high <= low {
        return Err(ConsensusError::InvalidRange { low, high });
    }

    let rolling = entropy.as_bytes()[..4]
        .iter()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte));
    let span = (high - low) as u64;
    let value = (rolling % span) as usize + low;

    Ok((value, truncated_hash(entropy.as_bytes())))
}

/// Fisher-Yates shuffle of `items` in place, the swap target for position
/// `i` being `draw_int(i, n)`. Returns the entropy after the last draw.
pub fn shuffle<T>(items: &mut [T], entropy: Entropy) -> ConsensusResult<Entropy> {
    let n = items.len();
    let mut entropy = entropy;
    for i in 0..n {
        let (j, next) = draw_int(&entropy, i, n)?;
        items.swap(i, j);
        entropy = next;
    }
    Ok(entropy)
}

/// Fold a contribution into an entropy value
pub fn chain(entropy: &Entropy, contribution: &[u8]) -> Entropy {
    let mut data = Vec::with_capacity(entropy.as_bytes().len() + contribution.len());
    data.extend_from_slice(entropy.as_bytes());
    data.extend_from_slice(contribution);
    truncated_hash(&data)
}

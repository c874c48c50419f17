//! Block compiler election
//!
//! Every node evaluates the same eligible set with the same salt, so every
//! node elects the same compiler without exchanging messages. The score of
//! a host is `blake3(salt || host)`; the highest score wins and ties fall to
//! the smaller host name.

use swarm_core::Host;

/// Rendezvous score of `host` under `salt`
pub fn rendezvous_score(host: &str, salt: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(salt);
    hasher.update(host.as_bytes());
    *hasher.finalize().as_bytes()
}

/// Elect the block compiler among `eligible`. Returns `None` when nobody is
/// eligible. The result does not depend on the order of `eligible`.
pub fn elect_compiler<I, S>(eligible: I, salt: &[u8]) -> Option<Host>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    eligible
        .into_iter()
        .map(|host| {
            let host = host.as_ref();
            (rendezvous_score(host, salt), host.to_string())
        })
        .max_by(|(score_a, host_a), (score_b, host_b)| {
            score_a.cmp(score_b).then_with(|| host_b.cmp(host_a))
        })
        .map(|(_, host)| host)
}

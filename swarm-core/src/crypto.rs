//! Hashing, randomness and key helpers

use crate::{CoreError, CoreResult, Entropy, PublicKey, ENTROPY_SIZE};
use rand::distr::Alphanumeric;
use rand::Rng;
use sha3::{Digest, Keccak256, Sha3_512};

/// Hash `data` with SHA3-512 and keep the first `ENTROPY_SIZE` bytes
pub fn truncated_hash(data: &[u8]) -> Entropy {
    let digest = Sha3_512::digest(data);
    let mut bytes = [0u8; ENTROPY_SIZE];
    bytes.copy_from_slice(&digest[..ENTROPY_SIZE]);
    Entropy::new(bytes)
}

/// Fresh entropy from the OS-seeded thread RNG
pub fn random_entropy() -> Entropy {
    Entropy::new(rand::random())
}

/// Random alphanumeric string, used for block ids
pub fn random_string(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Generate a two-stage reveal pair.
///
/// Returns `(stage1, stage2)` where `stage2` is `len` random bytes (hex) and
/// `stage1` is the Keccak256 hash of those bytes (hex). `stage1` is published
/// first; revealing `stage2` later proves the commitment.
pub fn hashed_random_data(len: usize) -> (String, String) {
    let mut secret = vec![0u8; len];
    rand::rng().fill(&mut secret[..]);
    let commitment = Keccak256::digest(&secret);
    (hex::encode(commitment), hex::encode(secret))
}

/// Check that `stage2` is the preimage of `stage1`
pub fn verify_reveal(stage1: &str, stage2: &str) -> bool {
    match hex::decode(stage2) {
        Ok(secret) => hex::encode(Keccak256::digest(&secret)) == stage1,
        Err(_) => false,
    }
}

/// secp256k1 identity key of a participant
#[derive(Debug, Clone)]
pub struct Keypair {
    #[allow(dead_code)]
    secret: secp256k1::SecretKey,
    public: secp256k1::PublicKey,
}

impl Keypair {
    /// Generate a new random keypair
    pub fn generate() -> CoreResult<Self> {
        let secp = secp256k1::Secp256k1::new();
        let bytes: [u8; 32] = rand::random();
        let secret = secp256k1::SecretKey::from_slice(&bytes)
            .map_err(|e| CoreError::Crypto(e.to_string()))?;
        let public = secp256k1::PublicKey::from_secret_key(&secp, &secret);

        Ok(Self { secret, public })
    }

    /// Public half as swarm coordinates
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from(&self.public)
    }
}

//! Opaque-key generation for activation and email-change confirmation.
//!
//! Keys are derived from a random salt plus a stable per-account seed (the
//! username), hashed and hex-encoded. The trait exists so tests can pin the
//! generated keys; production code uses [`RandomSecretSource`].

use rand::RngCore;
use sha3::{Digest, Sha3_256};
use std::fmt::Write;

/// Length of every generated key, in hex characters
pub const KEY_LENGTH: usize = 40;

/// Length of the salt mixed into every key
pub const SALT_LENGTH: usize = 5;

pub trait SecretSource: Send + Sync + 'static {
    /// Returns `(salt, key)`. The key is a [`KEY_LENGTH`]-character lowercase
    /// hex token derived from the salt and the seed.
    fn generate(&self, seed: &str) -> (String, String);
}

/// Derives a key from an already-chosen salt. Deterministic; the randomness
/// lives entirely in the salt.
pub fn derive_key(salt: &str, seed: &str) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(salt.as_bytes());
    hasher.update(seed.as_bytes());
    let mut key = to_hex(&hasher.finalize());
    key.truncate(KEY_LENGTH);
    key
}

/// The default source: a fresh random salt per key
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomSecretSource;

impl SecretSource for RandomSecretSource {
    fn generate(&self, seed: &str) -> (String, String) {
        let mut raw = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut raw);
        let mut salt = to_hex(&raw);
        salt.truncate(SALT_LENGTH);
        let key = derive_key(&salt, seed);
        (salt, key)
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().fold(
        String::with_capacity(bytes.len() * 2),
        |mut out, byte| {
            let _ = write!(out, "{byte:02x}");
            out
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_forty_hex_chars() {
        let (salt, key) = RandomSecretSource.generate("alice");
        assert_eq!(salt.len(), SALT_LENGTH);
        assert_eq!(key.len(), KEY_LENGTH);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn derivation_is_deterministic_given_the_salt() {
        assert_eq!(derive_key("ab123", "alice"), derive_key("ab123", "alice"));
        assert_ne!(derive_key("ab123", "alice"), derive_key("ab124", "alice"));
        assert_ne!(derive_key("ab123", "alice"), derive_key("ab123", "bob"));
    }

    #[test]
    fn consecutive_keys_differ() {
        let (_, first) = RandomSecretSource.generate("alice");
        let (_, second) = RandomSecretSource.generate("alice");
        assert_ne!(first, second);
    }
}

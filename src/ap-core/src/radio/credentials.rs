// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Salted hashing of station WPA keys.
//!
//! Station status is published to external readers, so it carries a digest
//! of the key together with the salt used rather than the key itself. A
//! reader that knows the expected key can verify it by hashing
//! `key ++ salt` on its side.

use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Number of characters in a generated salt.
pub const SALT_LENGTH: usize = 16;

/// Source of salts for key hashing.
pub trait SaltSource: Send + Sync {
    fn salt(&self) -> String;
}

/// Fresh random alphanumeric salt on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSalt;

impl SaltSource for RandomSalt {
    fn salt(&self) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SALT_LENGTH)
            .map(char::from)
            .collect()
    }
}

/// Always returns the same salt. Only meant for reproducible digests.
#[derive(Debug, Clone)]
pub struct FixedSalt(pub String);

impl SaltSource for FixedSalt {
    fn salt(&self) -> String {
        self.0.clone()
    }
}

/// Hex digest and the salt it was computed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedKey {
    pub hashed_key: String,
    pub salt: String,
}

/// Hex-encoded SHA-256 of `key ++ salt`.
pub fn digest(key: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hash a key with a newly drawn salt.
pub fn hash_key(key: &str, salts: &dyn SaltSource) -> HashedKey {
    let salt = salts.salt();
    HashedKey {
        hashed_key: digest(key, &salt),
        salt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_salt_shape() {
        let salt = RandomSalt.salt();
        assert_eq!(salt.len(), SALT_LENGTH);
        assert!(salt.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_salt_never_reused() {
        let first = hash_key("password", &RandomSalt);
        let second = hash_key("password", &RandomSalt);
        assert_ne!(first.salt, second.salt);
        assert_ne!(first.hashed_key, second.hashed_key);
    }

    #[test]
    fn test_digest_is_deterministic_for_key_and_salt() {
        let salts = FixedSalt("abcdefghijklmnop".to_string());
        let first = hash_key("password", &salts);
        let second = hash_key("password", &salts);
        assert_eq!(first, second);
        assert_eq!(first.hashed_key, digest("passwordabcdefghijklmnop", ""));
    }

    #[test]
    fn test_known_digest() {
        // sha256("abc")
        assert_eq!(
            digest("ab", "c"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(digest("abc", "").len(), 64);
    }
}

//! Password hashing.
//!
//! Stored form is `base64(salt)$base64(digest)`, where the digest is
//! SHA-256 over salt and password, re-hashed a fixed number of rounds.

use base64::{engine::general_purpose::STANDARD, Engine};
use rand::Rng;
use sha2::{Digest, Sha256};

const SALT_LEN: usize = 16;
const ROUNDS: u32 = 10_000;

/// Hashes `password` with a fresh random salt.
pub fn hash(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill(&mut salt);
    let digest = derive(&salt, password);
    format!("{}${}", STANDARD.encode(salt), STANDARD.encode(digest))
}

/// Checks `password` against a stored hash. Malformed hashes never verify.
pub fn verify(password: &str, stored: &str) -> bool {
    let Some((salt, expected)) = stored.split_once('$') else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (STANDARD.decode(salt), STANDARD.decode(expected)) else {
        return false;
    };

    let actual = derive(&salt, password);
    constant_time_eq(&actual, &expected)
}

fn derive(salt: &[u8], password: &str) -> [u8; 32] {
    let mut digest: [u8; 32] = Sha256::new()
        .chain_update(salt)
        .chain_update(password.as_bytes())
        .finalize()
        .into();
    for _ in 1..ROUNDS {
        digest = Sha256::new()
            .chain_update(digest)
            .chain_update(salt)
            .finalize()
            .into();
    }
    digest
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

//! Stable digests for content-derived object names
//!
//! Uses SHA-256 from aws-lc-rs. `DefaultHasher` is not stable across Rust
//! releases and must never be used for anything persisted.

use std::fmt::Write;

use aws_lc_rs::digest;

/// Full SHA-256 of the input as 64 lowercase hex characters
pub fn sha256_hex(input: &[u8]) -> String {
    let hash = digest::digest(&digest::SHA256, input);
    to_hex(hash.as_ref())
}

/// Deterministic 32-hex-char digest of a string, valid as an object name
pub fn deterministic_hash(input: &str) -> String {
    let hash = digest::digest(&digest::SHA256, input.as_bytes());
    to_hex(&hash.as_ref()[..16])
}

fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
            let _ = write!(s, "{:02x}", b);
            s
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_matches_known_vector() {
        assert_eq!(
            sha256_hex(b"test"),
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn deterministic_hash_is_stable_and_short() {
        let a = deterministic_hash("app.example.com");
        assert_eq!(a, deterministic_hash("app.example.com"));
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(a, deterministic_hash("api.example.com"));
    }
}

//! Image fingerprinting for content-addressed caching.
//!
//! A fingerprint is a deterministic hash over the **full** encoded image
//! payload. Hashing a truncated prefix would make visually distinct images
//! that share leading bytes collide and silently serve each other's
//! nutrition data, so both strategies consume every byte.

use sha2::{Digest, Sha256};

/// How to fingerprint an image payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FingerprintStrategy {
    /// SHA-256 over the full payload; lowercase hex digest.
    #[default]
    Sha256,
    /// DJB2 rolling hash, `simple_`-prefixed. A degraded fallback for
    /// environments without a cryptographic primitive; the prefix keeps the
    /// two hash spaces disjoint.
    Simple,
}

impl FingerprintStrategy {
    /// Parse the config label (`"sha256"` or `"simple"`).
    pub fn parse(label: &str) -> Option<FingerprintStrategy> {
        match label {
            "sha256" => Some(FingerprintStrategy::Sha256),
            "simple" => Some(FingerprintStrategy::Simple),
            _ => None,
        }
    }

    /// Fingerprint a payload. Pure; identical bytes always yield the
    /// identical digest.
    pub fn compute(self, payload: &[u8]) -> String {
        match self {
            FingerprintStrategy::Sha256 => sha256_fingerprint(payload),
            FingerprintStrategy::Simple => simple_fingerprint(payload),
        }
    }
}

/// SHA-256 digest of the payload as lowercase hex.
pub fn sha256_fingerprint(payload: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload);
    format!("{:x}", hasher.finalize())
}

/// DJB2 (xor variant) over the payload, `simple_`-prefixed.
pub fn simple_fingerprint(payload: &[u8]) -> String {
    let mut hash: u32 = 5381;
    for &byte in payload {
        hash = hash.wrapping_mul(33) ^ u32::from(byte);
    }
    format!("simple_{hash:08x}")
}

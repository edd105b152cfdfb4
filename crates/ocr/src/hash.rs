use sha2::{Digest, Sha256};
use std::fmt::Write;

/// SHA-256 of an in-memory upload.
pub fn sha256_bytes(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Encode a raw 32-byte hash as a lowercase hex string (64 chars).
pub fn to_hex(hash: &[u8; 32]) -> String {
    hash.iter().fold(String::with_capacity(64), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

/// Hash and hex-encode in one step.
pub fn sha256_hex(data: &[u8]) -> String {
    to_hex(&sha256_bytes(data))
}

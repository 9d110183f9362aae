//! Token generation and hashing for one-time links (email verification, password reset).

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of random bytes in a one-time token (hex encoded to 64 chars).
pub const TOKEN_BYTES: usize = 32;

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generates a random URL-safe token.
///
/// The raw value is sent to the user; only `sha256_hex(token)` is stored.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Generates a token and returns `(raw, hash)`.
pub fn generate_token_pair() -> (String, String) {
    let raw = generate_token();
    let hash = sha256_hex(&raw);
    (raw, hash)
}

//! # Sentinel Crypto - Cryptographic Core
//!
//! Pluggable primitives behind the security pipeline. The pipeline itself is
//! a protocol and state machine; everything cryptographic lives here with
//! precise contracts:
//!
//! | Module | Algorithm | Contract |
//! |--------|-----------|----------|
//! | `hashing` | BLAKE3 | deterministic digests, audit proofs, key derivation |
//! | `signatures` | Ed25519 | `verify_detached` returns `false`, never errors |
//! | `symmetric` | XChaCha20-Poly1305 | fresh random nonce per call, tag mismatch fails |
//! | `shamir` | GF(2^8) secret sharing | t-of-n reconstruction of key seeds |
//!
//! All operations are pure functions over supplied key material; no module
//! here owns registries or mutable state.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod shamir;
pub mod signatures;
pub mod symmetric;

// Re-exports
pub use errors::CryptoError;
pub use hashing::{hash, hash_hex, hash_many, derive_key, Digest};
pub use shamir::{combine_shares, split_secret, SecretShare};
pub use signatures::{verify_detached, KeyPair, PublicKey, Signature};
pub use symmetric::{decrypt, encrypt, Nonce, SecretKey};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}

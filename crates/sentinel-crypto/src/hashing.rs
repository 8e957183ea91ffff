//! # BLAKE3 Hashing
//!
//! Digests for audit proofs, certificate records, and message content
//! fingerprints, plus domain-separated key derivation for per-participant
//! share keys.

/// BLAKE3 digest (256-bit).
pub type Digest = [u8; 32];

/// Hash data with BLAKE3 (one-shot).
pub fn hash(data: &[u8]) -> Digest {
    *blake3::hash(data).as_bytes()
}

/// Hash multiple inputs as one stream.
///
/// Callers are responsible for unambiguous framing of the inputs (the audit
/// trail length-prefixes every field before calling this).
pub fn hash_many(inputs: &[&[u8]]) -> Digest {
    let mut hasher = blake3::Hasher::new();
    for input in inputs {
        hasher.update(input);
    }
    *hasher.finalize().as_bytes()
}

/// One-shot hash returned as lowercase hex, the form stored in audit entries.
pub fn hash_hex(data: &[u8]) -> String {
    hex::encode(hash(data))
}

/// Derive a 32-byte key from a context string and input key material.
///
/// Used to derive per-participant share keypairs from Shamir share bytes
/// without reusing the raw share as a signing seed.
pub fn derive_key(context: &str, key_material: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    hasher.update(key_material);
    *hasher.finalize().as_bytes()
}

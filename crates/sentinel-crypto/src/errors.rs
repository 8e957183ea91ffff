//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Encryption failed
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed: wrong key, corrupted ciphertext, or bad tag
    #[error("decryption failed: authentication tag mismatch or corrupt input")]
    DecryptionFailed,

    /// Signature did not verify
    #[error("signature verification failed")]
    SignatureVerificationFailed,

    /// Key bytes do not encode a valid curve point
    #[error("invalid public key")]
    InvalidPublicKey,

    /// Signature bytes are malformed
    #[error("invalid signature format")]
    InvalidSignature,

    /// Not enough shares to reconstruct the secret
    #[error("insufficient shares: need {needed}, got {actual}")]
    InsufficientShares {
        /// Threshold required for reconstruction
        needed: usize,
        /// Shares actually supplied
        actual: usize,
    },

    /// Two shares carry the same x-coordinate
    #[error("duplicate share index {0}")]
    DuplicateShare(u8),

    /// Invalid split parameters (t or n out of range)
    #[error("invalid sharing parameters: {0}")]
    InvalidSharingParams(String),
}

//! # Shamir Secret Sharing over GF(2^8)
//!
//! Splits a 32-byte secret (an Ed25519 seed) into `n` shares such that any
//! `t` reconstruct it and any `t - 1` reveal nothing. Each secret byte is the
//! constant term of an independent random polynomial of degree `t - 1`; share
//! `i` holds the polynomial evaluations at `x = i`.
//!
//! Arithmetic is in GF(2^8) with the AES reduction polynomial (0x11b).

use crate::CryptoError;
use zeroize::Zeroize;

/// One participant's share of a split secret.
#[derive(Clone, Debug, PartialEq, Eq, Zeroize)]
pub struct SecretShare {
    /// Evaluation point (`1..=n`, never 0).
    pub index: u8,
    /// Per-byte polynomial evaluations.
    pub data: [u8; 32],
}

/// Multiply in GF(2^8) mod x^8 + x^4 + x^3 + x + 1.
fn gf_mul(mut a: u8, mut b: u8) -> u8 {
    let mut product = 0u8;
    while b != 0 {
        if b & 1 != 0 {
            product ^= a;
        }
        let carry = a & 0x80;
        a <<= 1;
        if carry != 0 {
            a ^= 0x1b;
        }
        b >>= 1;
    }
    product
}

/// Multiplicative inverse via a^254 (Fermat in GF(2^8)); undefined for 0.
fn gf_inv(a: u8) -> u8 {
    let mut result = 1u8;
    let mut base = a;
    let mut exp = 254u8;
    while exp != 0 {
        if exp & 1 != 0 {
            result = gf_mul(result, base);
        }
        base = gf_mul(base, base);
        exp >>= 1;
    }
    result
}

/// Evaluate a polynomial (coefficients low-to-high) at `x` via Horner.
fn poly_eval(coefficients: &[u8], x: u8) -> u8 {
    let mut acc = 0u8;
    for &coefficient in coefficients.iter().rev() {
        acc = gf_mul(acc, x) ^ coefficient;
    }
    acc
}

/// Split `secret` into `n` shares with reconstruction threshold `t`.
///
/// # Errors
///
/// Returns `CryptoError::InvalidSharingParams` unless `1 <= t <= n <= 255`.
pub fn split_secret(
    secret: &[u8; 32],
    n: usize,
    t: usize,
) -> Result<Vec<SecretShare>, CryptoError> {
    if n == 0 || n > 255 {
        return Err(CryptoError::InvalidSharingParams(format!(
            "participant count {n} outside 1..=255"
        )));
    }
    if t == 0 || t > n {
        return Err(CryptoError::InvalidSharingParams(format!(
            "threshold {t} outside 1..={n}"
        )));
    }

    let mut shares: Vec<SecretShare> = (1..=n as u8)
        .map(|index| SecretShare {
            index,
            data: [0u8; 32],
        })
        .collect();

    let mut coefficients = vec![0u8; t];
    for (byte_pos, &secret_byte) in secret.iter().enumerate() {
        coefficients[0] = secret_byte;
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut coefficients[1..]);

        for share in &mut shares {
            share.data[byte_pos] = poly_eval(&coefficients, share.index);
        }
    }
    coefficients.zeroize();

    Ok(shares)
}

/// Reconstruct the secret from at least `t` distinct shares.
///
/// Only the first `t` shares are used; reconstruction is Lagrange
/// interpolation at `x = 0`, byte by byte.
///
/// # Errors
///
/// - `CryptoError::InsufficientShares` with fewer than `t` shares
/// - `CryptoError::DuplicateShare` when two shares repeat an index
pub fn combine_shares(shares: &[SecretShare], t: usize) -> Result<[u8; 32], CryptoError> {
    if shares.len() < t {
        return Err(CryptoError::InsufficientShares {
            needed: t,
            actual: shares.len(),
        });
    }
    let quorum = &shares[..t];
    for (i, share) in quorum.iter().enumerate() {
        if quorum[i + 1..].iter().any(|other| other.index == share.index) {
            return Err(CryptoError::DuplicateShare(share.index));
        }
    }

    let mut secret = [0u8; 32];
    for (byte_pos, out) in secret.iter_mut().enumerate() {
        let mut acc = 0u8;
        for (i, share) in quorum.iter().enumerate() {
            // Lagrange basis at x = 0: prod over j != i of x_j / (x_j ^ x_i)
            let mut basis = 1u8;
            for (j, other) in quorum.iter().enumerate() {
                if i == j {
                    continue;
                }
                basis = gf_mul(basis, gf_mul(other.index, gf_inv(other.index ^ share.index)));
            }
            acc ^= gf_mul(share.data[byte_pos], basis);
        }
        *out = acc;
    }
    Ok(secret)
}

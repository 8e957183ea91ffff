//! # Threshold Signatures
//!
//! t-of-n signing over a master Ed25519 key. The master seed is split with
//! Shamir secret sharing at key generation and immediately wiped; producing a
//! full signature requires reconstructing the seed from at least `t` shares.
//!
//! Partial signatures are attributable: each participant also holds its own
//! Ed25519 keypair and signs with it, so a partial can be traced to (and
//! verified against) exactly one participant. The full threshold signature is
//! verified against the master public key alone.

use parking_lot::RwLock;
use sentinel_crypto::{
    derive_key, split_secret, verify_detached, KeyPair, PublicKey, SecretShare, Signature,
};
use sentinel_types::{AgentId, SecurityError};
use std::collections::HashMap;
use tracing::info;
use zeroize::Zeroize;

/// Domain separator for deriving a participant's share keypair from its
/// share bytes. The raw share is never reused as a signing seed.
const SHARE_KEY_CONTEXT: &str = "sentinel-threshold share-key v1";

/// A single participant's attributable signature over a message.
#[derive(Debug, Clone)]
pub struct PartialSignature {
    /// Who signed.
    pub participant: AgentId,
    /// The participant's share index (1-based evaluation point).
    pub share_index: u8,
    /// Ed25519 signature under the participant's share keypair.
    pub signature: Signature,
    /// The participant's share public key, for verification.
    pub public_key: PublicKey,
}

struct ParticipantKeys {
    share: SecretShare,
    keypair: KeyPair,
}

struct KeyMaterial {
    master_public: PublicKey,
    participants: HashMap<AgentId, ParticipantKeys>,
}

/// t-of-n threshold signer over a Shamir-split master Ed25519 seed.
pub struct ThresholdSigner {
    total_nodes: usize,
    threshold: usize,
    material: RwLock<Option<KeyMaterial>>,
}

impl ThresholdSigner {
    /// Create an uninitialized signer for a t-of-n scheme.
    ///
    /// # Errors
    ///
    /// `SecurityError::Config` unless `1 <= threshold <= total_nodes <= 255`.
    pub fn new(total_nodes: usize, threshold: usize) -> Result<Self, SecurityError> {
        if total_nodes == 0 || total_nodes > 255 {
            return Err(SecurityError::Config(format!(
                "total_nodes {total_nodes} outside 1..=255"
            )));
        }
        if threshold == 0 || threshold > total_nodes {
            return Err(SecurityError::Config(format!(
                "threshold {threshold} outside 1..={total_nodes}"
            )));
        }
        Ok(Self {
            total_nodes,
            threshold,
            material: RwLock::new(None),
        })
    }

    /// Configured participant count.
    pub fn total_nodes(&self) -> usize {
        self.total_nodes
    }

    /// Configured reconstruction threshold.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Whether key material has been generated.
    pub fn is_initialized(&self) -> bool {
        self.material.read().is_some()
    }

    /// Generate the master keypair, split its seed into one share per
    /// participant, and wipe the seed. Replaces any previous key material.
    ///
    /// # Errors
    ///
    /// `SecurityError::Config` when `participants.len() != total_nodes` or a
    /// participant id repeats.
    pub fn generate_keys(&self, participants: &[AgentId]) -> Result<PublicKey, SecurityError> {
        if participants.len() != self.total_nodes {
            return Err(SecurityError::Config(format!(
                "expected {} participants, got {}",
                self.total_nodes,
                participants.len()
            )));
        }

        let master = KeyPair::generate();
        let master_public = master.public_key();
        let mut seed = master.to_seed();
        let shares = split_secret(&seed, self.total_nodes, self.threshold)
            .map_err(|e| SecurityError::Threshold(e.to_string()))?;
        seed.zeroize();
        drop(master);

        let mut keyed = HashMap::with_capacity(participants.len());
        for (participant, share) in participants.iter().zip(shares) {
            let keypair = KeyPair::from_seed(derive_key(SHARE_KEY_CONTEXT, &share.data));
            let previous = keyed.insert(participant.clone(), ParticipantKeys { share, keypair });
            if previous.is_some() {
                return Err(SecurityError::Config(format!(
                    "duplicate participant {participant}"
                )));
            }
        }

        info!(
            total_nodes = self.total_nodes,
            threshold = self.threshold,
            "threshold key material generated"
        );
        *self.material.write() = Some(KeyMaterial {
            master_public,
            participants: keyed,
        });
        Ok(master_public)
    }

    /// The master public key, once keys have been generated.
    pub fn master_public_key(&self) -> Option<PublicKey> {
        self.material.read().as_ref().map(|m| m.master_public)
    }

    /// Sign a message with one participant's share keypair.
    ///
    /// # Errors
    ///
    /// `SecurityError::Threshold` when keys are missing or the participant is
    /// unknown.
    pub fn sign_partial(
        &self,
        message: &[u8],
        participant: &str,
    ) -> Result<PartialSignature, SecurityError> {
        let material = self.material.read();
        let material = material
            .as_ref()
            .ok_or_else(|| SecurityError::Threshold("key material not generated".to_string()))?;
        let keys = material.participants.get(participant).ok_or_else(|| {
            SecurityError::Threshold(format!("unknown participant {participant}"))
        })?;
        Ok(PartialSignature {
            participant: participant.to_string(),
            share_index: keys.share.index,
            signature: keys.keypair.sign(message),
            public_key: keys.keypair.public_key(),
        })
    }

    /// Verify an attributable partial signature against its embedded share
    /// public key and the participant registry.
    pub fn verify_partial(&self, message: &[u8], partial: &PartialSignature) -> bool {
        let material = self.material.read();
        let Some(material) = material.as_ref() else {
            return false;
        };
        let Some(keys) = material.participants.get(&partial.participant) else {
            return false;
        };
        keys.keypair.public_key() == partial.public_key
            && verify_detached(
                message,
                &partial.signature.to_vec(),
                partial.public_key.as_bytes(),
            )
    }

    /// Produce the full threshold signature over `message`.
    ///
    /// Requires at least `threshold` distinct registered signatories. The
    /// master seed is reconstructed from the first `threshold` shares after
    /// sorting signatories by id, so the result is deterministic and
    /// independent of the order signatories were supplied in. The seed is
    /// wiped again immediately after signing.
    ///
    /// # Errors
    ///
    /// `SecurityError::Threshold` when keys are missing, a signatory is
    /// unknown, or fewer than `threshold` distinct signatories are given.
    pub fn create_threshold_signature(
        &self,
        message: &[u8],
        signatories: &[AgentId],
    ) -> Result<Signature, SecurityError> {
        let material = self.material.read();
        let material = material
            .as_ref()
            .ok_or_else(|| SecurityError::Threshold("key material not generated".to_string()))?;

        let mut distinct: Vec<&AgentId> = signatories.iter().collect();
        distinct.sort();
        distinct.dedup();
        if distinct.len() < self.threshold {
            return Err(SecurityError::Threshold(format!(
                "need {} signatories, got {} distinct",
                self.threshold,
                distinct.len()
            )));
        }

        let mut shares = Vec::with_capacity(self.threshold);
        for signatory in distinct.iter().take(self.threshold) {
            let keys = material.participants.get(*signatory).ok_or_else(|| {
                SecurityError::Threshold(format!("unknown signatory {signatory}"))
            })?;
            shares.push(keys.share.clone());
        }

        let mut seed = sentinel_crypto::combine_shares(&shares, self.threshold)
            .map_err(|e| SecurityError::Threshold(e.to_string()))?;
        for share in &mut shares {
            share.zeroize();
        }
        let master = KeyPair::from_seed(seed);
        seed.zeroize();

        let signature = master.sign(message);
        Ok(signature)
    }

    /// Verify a full threshold signature against the master public key.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        match self.master_public_key() {
            Some(master) => verify_detached(message, signature, master.as_bytes()),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participants(n: usize) -> Vec<AgentId> {
        (0..n).map(|i| format!("node-{i}")).collect()
    }

    #[test]
    fn test_rejects_invalid_scheme_params() {
        assert!(matches!(
            ThresholdSigner::new(5, 0),
            Err(SecurityError::Config(_))
        ));
        assert!(matches!(
            ThresholdSigner::new(5, 6),
            Err(SecurityError::Config(_))
        ));
        assert!(matches!(
            ThresholdSigner::new(0, 0),
            Err(SecurityError::Config(_))
        ));
    }

    #[test]
    fn test_generate_requires_exact_participant_count() {
        let signer = ThresholdSigner::new(5, 3).unwrap();
        let err = signer.generate_keys(&participants(4)).unwrap_err();
        assert!(matches!(err, SecurityError::Config(_)));
        assert!(!signer.is_initialized());
    }

    #[test]
    fn test_threshold_signature_round_trip() {
        let signer = ThresholdSigner::new(5, 3).unwrap();
        let nodes = participants(5);
        signer.generate_keys(&nodes).unwrap();

        let message = b"verification result payload";
        let signature = signer
            .create_threshold_signature(message, &nodes[..3])
            .unwrap();
        assert!(signer.verify(message, &signature.to_vec()));
    }

    #[test]
    fn test_any_t_subset_produces_valid_signature() {
        let signer = ThresholdSigner::new(5, 3).unwrap();
        let nodes = participants(5);
        signer.generate_keys(&nodes).unwrap();

        let message = b"same payload";
        let sig_a = signer
            .create_threshold_signature(message, &[nodes[0].clone(), nodes[2].clone(), nodes[4].clone()])
            .unwrap();
        let sig_b = signer
            .create_threshold_signature(message, &[nodes[1].clone(), nodes[3].clone(), nodes[4].clone()])
            .unwrap();
        assert!(signer.verify(message, &sig_a.to_vec()));
        assert!(signer.verify(message, &sig_b.to_vec()));
        // Ed25519 is deterministic and every subset reconstructs the same
        // master key, so the signatures agree byte for byte.
        assert_eq!(sig_a.to_vec(), sig_b.to_vec());
    }

    #[test]
    fn test_signatory_order_irrelevant() {
        let signer = ThresholdSigner::new(5, 3).unwrap();
        let nodes = participants(5);
        signer.generate_keys(&nodes).unwrap();

        let message = b"ordered";
        let forward = signer
            .create_threshold_signature(message, &nodes)
            .unwrap();
        let mut reversed = nodes.clone();
        reversed.reverse();
        let backward = signer
            .create_threshold_signature(message, &reversed)
            .unwrap();
        assert_eq!(forward.to_vec(), backward.to_vec());
    }

    #[test]
    fn test_insufficient_signatories_rejected() {
        let signer = ThresholdSigner::new(5, 3).unwrap();
        let nodes = participants(5);
        signer.generate_keys(&nodes).unwrap();

        let err = signer
            .create_threshold_signature(b"msg", &nodes[..2])
            .unwrap_err();
        assert!(matches!(err, SecurityError::Threshold(_)));

        // Duplicates do not count twice
        let err = signer
            .create_threshold_signature(
                b"msg",
                &[nodes[0].clone(), nodes[0].clone(), nodes[1].clone()],
            )
            .unwrap_err();
        assert!(matches!(err, SecurityError::Threshold(_)));
    }

    #[test]
    fn test_flipped_byte_fails_verification() {
        let signer = ThresholdSigner::new(5, 3).unwrap();
        let nodes = participants(5);
        signer.generate_keys(&nodes).unwrap();

        let message = b"tamper target";
        let signature = signer
            .create_threshold_signature(message, &nodes[..3])
            .unwrap();

        let mut tampered = signature.to_vec();
        tampered[10] ^= 0x01;
        assert!(!signer.verify(message, &tampered));
        assert!(!signer.verify(b"different message", &signature.to_vec()));
    }

    #[test]
    fn test_partial_signatures_attributable() {
        let signer = ThresholdSigner::new(3, 2).unwrap();
        let nodes = participants(3);
        signer.generate_keys(&nodes).unwrap();

        let message = b"partial";
        let partial = signer.sign_partial(message, &nodes[0]).unwrap();
        assert_eq!(partial.participant, nodes[0]);
        assert!(signer.verify_partial(message, &partial));

        // A partial claiming to be from another participant fails
        let mut forged = partial.clone();
        forged.participant = nodes[1].clone();
        assert!(!signer.verify_partial(message, &forged));

        assert!(matches!(
            signer.sign_partial(message, "node-99"),
            Err(SecurityError::Threshold(_))
        ));
    }

    #[test]
    fn test_share_keypairs_derived_from_share_bytes() {
        let signer = ThresholdSigner::new(3, 2).unwrap();
        signer.generate_keys(&participants(3)).unwrap();

        let material = signer.material.read();
        let material = material.as_ref().unwrap();
        for (participant, keys) in &material.participants {
            let rederived = KeyPair::from_seed(derive_key(SHARE_KEY_CONTEXT, &keys.share.data));
            assert_eq!(
                keys.keypair.public_key(),
                rederived.public_key(),
                "share key for {participant} must be a function of its share"
            );
        }
    }

    #[test]
    fn test_uninitialized_signer_refuses_to_sign() {
        let signer = ThresholdSigner::new(3, 2).unwrap();
        assert!(matches!(
            signer.create_threshold_signature(b"msg", &participants(3)),
            Err(SecurityError::Threshold(_))
        ));
        assert!(!signer.verify(b"msg", &[0u8; 64]));
    }
}

//! # Domain Entities
//!
//! Core data model for the verification-request security pipeline.

use crate::envelope::ClaimEnvelope;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Unique agent identifier.
pub type AgentId = String;

/// Returns the current Unix timestamp in milliseconds.
///
/// Never panics: a clock before `UNIX_EPOCH` yields 0.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Ordered security clearance levels for registered agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SecurityLevel {
    /// Untrusted or newly onboarded agents.
    Low,
    /// Standard agents.
    Medium,
    /// Agents handling sensitive claims.
    High,
    /// Agents participating in consensus-critical decisions.
    Critical,
}

/// A registered agent's identity record.
///
/// Created once at registration and never deleted; revocation forces the
/// reputation to 0 and marks the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentIdentity {
    /// Unique agent identifier.
    pub agent_id: AgentId,
    /// Ed25519 verifying key (32 bytes).
    pub public_key: [u8; 32],
    /// Ordered chain of opaque certificate hashes (hex).
    pub certificate_chain: Vec<String>,
    /// Capability strings granted at registration.
    pub capabilities: BTreeSet<String>,
    /// Clearance level.
    pub security_level: SecurityLevel,
    /// Trust score in `[0, 100]`. Seeded at 100, mutated by pipeline outcomes.
    pub reputation: u8,
    /// Last successful authentication (Unix millis).
    pub last_verified_ms: u64,
    /// Set once by revocation; revoked identities never authenticate again.
    pub revoked: bool,
}

/// A truth-verification request submitted by an agent.
///
/// Transient: constructed by a caller, consumed by the pipeline, never
/// persisted verbatim (only audited).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationRequest {
    /// Unique per submission.
    pub request_id: String,
    /// Submitting agent.
    pub agent_id: AgentId,
    /// The claim under verification.
    pub claim: ClaimEnvelope,
    /// Submission time (Unix millis).
    pub timestamp_ms: u64,
    /// Caller-supplied single-use nonce.
    pub nonce: String,
    /// Optional Ed25519 signature over the request signing bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<Vec<u8>>,
}

impl VerificationRequest {
    /// Canonical bytes an agent signs to authenticate a request.
    ///
    /// Deterministic concatenation of the identifying fields and the claim's
    /// canonical encoding; the signature field itself is excluded.
    pub fn signing_bytes(&self) -> Vec<u8> {
        let claim = self.claim.canonical_bytes();
        let mut out = Vec::with_capacity(
            self.request_id.len() + self.agent_id.len() + self.nonce.len() + claim.len() + 8,
        );
        out.extend_from_slice(self.request_id.as_bytes());
        out.extend_from_slice(self.agent_id.as_bytes());
        out.extend_from_slice(&self.timestamp_ms.to_be_bytes());
        out.extend_from_slice(self.nonce.as_bytes());
        out.extend_from_slice(&claim);
        out
    }
}

/// Outcome of external truth verification (the business stage).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TruthAssessment {
    /// Whether the claim was verified.
    pub verified: bool,
    /// Supporting evidence references.
    pub evidence: Vec<String>,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
}

/// The immutable result of a fully processed verification request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Unique result identifier.
    pub result_id: Uuid,
    /// The originating request.
    pub request_id: String,
    /// The submitting agent.
    pub agent_id: AgentId,
    /// Verification outcome.
    pub verified: bool,
    /// Evidence from the truth verifier.
    pub evidence: Vec<String>,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Completion time (Unix millis).
    pub timestamp_ms: u64,
    /// Threshold signature over the result digest (64 bytes).
    pub signature: Vec<u8>,
    /// Audit entries produced while processing this request.
    pub audit_trail: Vec<AuditEntry>,
}

impl VerificationResult {
    /// Canonical bytes the threshold quorum signs.
    pub fn signing_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(self.result_id.as_bytes());
        out.extend_from_slice(self.request_id.as_bytes());
        out.extend_from_slice(self.agent_id.as_bytes());
        out.push(u8::from(self.verified));
        out.extend_from_slice(&self.confidence.to_be_bytes());
        out.extend_from_slice(&self.timestamp_ms.to_be_bytes());
        out
    }
}

/// Action tags recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    /// System bootstrap with a participant set.
    SystemInitialized,
    /// A request passed the full pipeline.
    VerificationCompleted,
    /// Authentication stage rejected the request.
    VerificationRejected,
    /// Rate-limit stage rejected the request.
    RateLimitExceeded,
    /// Byzantine screen rejected the request.
    ByzantineBehavior,
    /// Request signature failed cryptographic verification.
    InvalidSignature,
    /// An unexpected error terminated the pipeline.
    VerificationError,
    /// A new agent joined the registry.
    AgentRegistered,
    /// An agent was revoked.
    AgentRevoked,
    /// Operator-initiated hard stop.
    EmergencyShutdown,
}

impl AuditAction {
    /// Stable string form used in proofs and exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SystemInitialized => "SYSTEM_INITIALIZED",
            Self::VerificationCompleted => "VERIFICATION_COMPLETED",
            Self::VerificationRejected => "VERIFICATION_REJECTED",
            Self::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            Self::ByzantineBehavior => "BYZANTINE_BEHAVIOR",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::VerificationError => "VERIFICATION_ERROR",
            Self::AgentRegistered => "AGENT_REGISTERED",
            Self::AgentRevoked => "AGENT_REVOKED",
            Self::EmergencyShutdown => "EMERGENCY_SHUTDOWN",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in the append-only, hash-chained audit log.
///
/// `proof` covers `(event_id, timestamp_ms, agent_id, action, details,
/// prev_proof)` and is deliberately independent of `witness_signatures`:
/// partial witness collection never invalidates the base proof.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Creation time (Unix millis).
    pub timestamp_ms: u64,
    /// The agent this event concerns.
    pub agent_id: AgentId,
    /// What happened.
    pub action: AuditAction,
    /// Opaque JSON-encoded details.
    pub details: String,
    /// BLAKE3 proof over the canonical entry tuple (hex).
    pub proof: String,
    /// Proof of the preceding entry (hex; all-zero for the first entry).
    pub prev_proof: String,
    /// Co-signatures in `witness_id:hex_signature` form.
    pub witness_signatures: Vec<String>,
}

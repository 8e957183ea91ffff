//! # Hash-Chained Audit Trail
//!
//! Append-only log where each entry's BLAKE3 proof commits to the previous
//! entry's proof. Any mutation of a recorded field breaks proof recomputation;
//! any reordering or removal breaks chain linkage. Verification reports
//! corruption and never repairs.
//!
//! Witness co-signatures are layered on top: registered witness keys sign the
//! entry proof after it is computed, so a partially witnessed entry is still a
//! valid chain member.

use parking_lot::RwLock;
use sentinel_crypto::{hash_many, KeyPair, PublicKey};
use sentinel_types::{now_millis, AgentId, AuditAction, AuditEntry, SecurityError};
use tracing::{info, warn};
use uuid::Uuid;

/// `prev_proof` of the first chain entry.
pub const GENESIS_PROOF: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Filter for [`AuditTrail::search`]. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    /// Only entries for this agent.
    pub agent_id: Option<AgentId>,
    /// Only entries with this action.
    pub action: Option<AuditAction>,
    /// Only entries at or after this time (Unix millis).
    pub from_ms: Option<u64>,
    /// Only entries at or before this time (Unix millis).
    pub to_ms: Option<u64>,
    /// Cap on returned entries (most recent kept).
    pub limit: Option<usize>,
}

impl AuditQuery {
    fn matches(&self, entry: &AuditEntry) -> bool {
        self.agent_id
            .as_ref()
            .is_none_or(|agent| *agent == entry.agent_id)
            && self.action.is_none_or(|action| action == entry.action)
            && self.from_ms.is_none_or(|from| entry.timestamp_ms >= from)
            && self.to_ms.is_none_or(|to| entry.timestamp_ms <= to)
    }
}

/// Export encodings for the trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Full entries as a JSON array.
    Json,
    /// One row per entry: `event_id,timestamp_ms,agent_id,action,proof`.
    Csv,
}

/// Outcome of verifying a chain snapshot.
#[derive(Debug, Clone)]
pub struct TrailVerification {
    /// True when every proof recomputes and every link holds.
    pub valid: bool,
    /// Entries examined.
    pub total_entries: usize,
    /// Event ids of entries that failed recomputation or linkage.
    pub corrupted: Vec<Uuid>,
}

/// Recompute an entry's proof from its recorded fields.
///
/// Every field is length-prefixed before hashing so no two field boundaries
/// can alias.
fn compute_proof(entry: &AuditEntry) -> String {
    let event_id = entry.event_id.as_bytes();
    let timestamp = entry.timestamp_ms.to_be_bytes();
    let fields: [&[u8]; 6] = [
        event_id,
        &timestamp,
        entry.agent_id.as_bytes(),
        entry.action.as_str().as_bytes(),
        entry.details.as_bytes(),
        entry.prev_proof.as_bytes(),
    ];
    let mut framed: Vec<u8> = Vec::new();
    for field in fields {
        framed.extend_from_slice(&(field.len() as u32).to_be_bytes());
        framed.extend_from_slice(field);
    }
    hex::encode(hash_many(&[&framed]))
}

/// Verify an entry snapshot: recompute every proof and check that each entry
/// links to its predecessor.
///
/// Works on any contiguous slice of a chain (the first entry's `prev_proof`
/// is taken as given), so result-embedded sub-trails verify too.
pub fn verify_entries(entries: &[AuditEntry]) -> TrailVerification {
    let mut corrupted = Vec::new();
    let mut previous_proof: Option<&str> = None;

    for entry in entries {
        let mut bad = compute_proof(entry) != entry.proof;
        if let Some(prev) = previous_proof {
            if entry.prev_proof != prev {
                bad = true;
            }
        }
        if bad {
            corrupted.push(entry.event_id);
        }
        previous_proof = Some(&entry.proof);
    }

    TrailVerification {
        valid: corrupted.is_empty(),
        total_entries: entries.len(),
        corrupted,
    }
}

struct Witness {
    witness_id: String,
    keypair: KeyPair,
}

/// The append-only audit log plus its witness registry.
pub struct AuditTrail {
    entries: RwLock<Vec<AuditEntry>>,
    witnesses: RwLock<Vec<Witness>>,
}

impl Default for AuditTrail {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditTrail {
    /// Create an empty trail.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            witnesses: RwLock::new(Vec::new()),
        }
    }

    /// Register a witness key. Every subsequent entry is co-signed by it.
    /// Returns the witness public key for out-of-band verification.
    pub fn register_witness(&self, witness_id: &str) -> PublicKey {
        let keypair = KeyPair::generate();
        let public_key = keypair.public_key();
        self.witnesses.write().push(Witness {
            witness_id: witness_id.to_string(),
            keypair,
        });
        public_key
    }

    /// Append one entry, chaining it to the current head.
    pub fn record(&self, agent_id: &str, action: AuditAction, details: String) -> AuditEntry {
        let mut entries = self.entries.write();
        let prev_proof = entries
            .last()
            .map(|e| e.proof.clone())
            .unwrap_or_else(|| GENESIS_PROOF.to_string());

        let mut entry = AuditEntry {
            event_id: Uuid::new_v4(),
            timestamp_ms: now_millis(),
            agent_id: agent_id.to_string(),
            action,
            details,
            proof: String::new(),
            prev_proof,
            witness_signatures: Vec::new(),
        };
        entry.proof = compute_proof(&entry);

        // Witnesses sign the finished proof; the proof itself never covers
        // the signatures.
        let witnesses = self.witnesses.read();
        for witness in witnesses.iter() {
            let signature = witness.keypair.sign(entry.proof.as_bytes());
            entry
                .witness_signatures
                .push(format!("{}:{}", witness.witness_id, hex::encode(signature.as_bytes())));
        }

        info!(
            event_id = %entry.event_id,
            agent_id,
            action = %action,
            "audit entry recorded"
        );
        entries.push(entry.clone());
        entry
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the trail is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Proof of the chain head, or the genesis proof when empty.
    pub fn head_proof(&self) -> String {
        self.entries
            .read()
            .last()
            .map(|e| e.proof.clone())
            .unwrap_or_else(|| GENESIS_PROOF.to_string())
    }

    /// The most recent `limit` entries, in chronological order.
    pub fn recent(&self, limit: usize) -> Vec<AuditEntry> {
        let entries = self.entries.read();
        let start = entries.len().saturating_sub(limit);
        entries[start..].to_vec()
    }

    /// Recompute and cross-check the whole chain.
    pub fn verify_trail(&self) -> TrailVerification {
        let entries = self.entries.read();
        let mut verification = verify_entries(&entries);
        if let Some(first) = entries.first() {
            if first.prev_proof != GENESIS_PROOF && !verification.corrupted.contains(&first.event_id)
            {
                verification.corrupted.insert(0, first.event_id);
                verification.valid = false;
            }
        }
        if !verification.valid {
            warn!(
                corrupted = verification.corrupted.len(),
                total = verification.total_entries,
                "audit trail corruption detected"
            );
        }
        verification
    }

    /// Entries matching the query, chronological, capped to the most recent
    /// `limit` when set.
    pub fn search(&self, query: &AuditQuery) -> Vec<AuditEntry> {
        let entries = self.entries.read();
        let mut matched: Vec<AuditEntry> = entries
            .iter()
            .filter(|e| query.matches(e))
            .cloned()
            .collect();
        if let Some(limit) = query.limit {
            let start = matched.len().saturating_sub(limit);
            matched.drain(..start);
        }
        matched
    }

    /// The most recent `limit` entries for one agent, chronological.
    pub fn agent_history(&self, agent_id: &str, limit: usize) -> Vec<AuditEntry> {
        self.search(&AuditQuery {
            agent_id: Some(agent_id.to_string()),
            limit: Some(limit),
            ..AuditQuery::default()
        })
    }

    /// Serialize the whole trail.
    ///
    /// # Errors
    ///
    /// `SecurityError::Verification` when JSON serialization fails.
    pub fn export(&self, format: ExportFormat) -> Result<String, SecurityError> {
        let entries = self.entries.read();
        match format {
            ExportFormat::Json => serde_json::to_string_pretty(&*entries)
                .map_err(|e| SecurityError::Verification(format!("audit export failed: {e}"))),
            ExportFormat::Csv => {
                let mut out = String::from("event_id,timestamp_ms,agent_id,action,proof\n");
                for entry in entries.iter() {
                    out.push_str(&format!(
                        "{},{},{},{},{}\n",
                        entry.event_id,
                        entry.timestamp_ms,
                        entry.agent_id,
                        entry.action.as_str(),
                        entry.proof
                    ));
                }
                Ok(out)
            }
        }
    }

    /// Count of entries per action, for the status surface.
    pub fn action_counts(&self) -> Vec<(AuditAction, usize)> {
        let entries = self.entries.read();
        let mut counts: Vec<(AuditAction, usize)> = Vec::new();
        for entry in entries.iter() {
            match counts.iter_mut().find(|(action, _)| *action == entry.action) {
                Some((_, count)) => *count += 1,
                None => counts.push((entry.action, 1)),
            }
        }
        counts
    }
}

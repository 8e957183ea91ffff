//! Status and report shapes for the export surface.

use crate::domain::byzantine::SystemHealth;
use crate::metrics::MetricsSnapshot;
use sentinel_types::{AgentId, AuditEntry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Condensed audit-trail state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSummary {
    /// Entries recorded so far.
    pub total_entries: usize,
    /// Whether the full chain verified at snapshot time.
    pub chain_valid: bool,
    /// Entries that failed verification.
    pub corrupted_entries: usize,
    /// Entry counts by action tag.
    pub action_counts: BTreeMap<String, usize>,
}

/// A low-trust agent surfaced in the status report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatEntry {
    /// The agent.
    pub agent_id: AgentId,
    /// Current reputation.
    pub reputation: u8,
    /// Whether the agent has been revoked.
    pub revoked: bool,
}

/// Point-in-time view of the whole security system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityStatus {
    /// False before `initialize` and after `emergency_shutdown`.
    pub accepting_requests: bool,
    /// Whether threshold key material exists.
    pub initialized: bool,
    /// Pipeline counters.
    pub metrics: MetricsSnapshot,
    /// Node registry health.
    pub system_health: SystemHealth,
    /// Audit-trail summary.
    pub audit: AuditSummary,
    /// Lowest-reputation agents first.
    pub top_threats: Vec<ThreatEntry>,
    /// Reputation snapshot per agent.
    pub reputation_scores: BTreeMap<AgentId, u8>,
}

/// Full exported report: status plus the complete audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityReport {
    /// Report creation time (Unix millis).
    pub generated_at_ms: u64,
    /// Status snapshot.
    pub status: SecurityStatus,
    /// Total rate-limit violations across all agents and windows.
    pub total_rate_violations: u64,
    /// Every audit entry, in chain order.
    pub audit_trail: Vec<AuditEntry>,
}

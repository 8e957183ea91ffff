//! # Byzantine Fault Tolerance
//!
//! Per-node behavior history with four detection heuristics and quorum-based
//! consensus evaluation.
//!
//! ## Node State Machine
//!
//! ```text
//! registered(alive) ⇄ suspected(suspicion rising) → byzantine(suspicion >= 50)
//! ```
//!
//! Valid heartbeats lower suspicion by 1 (floored at 0); invalid heartbeats
//! raise it. Once suspicion crosses the exclusion threshold the node is
//! reclassified as Byzantine and excluded from consensus entirely — never
//! merely down-weighted.

use parking_lot::RwLock;
use sentinel_crypto::hash;
use sentinel_types::{now_millis, AgentId, DetectionConfig};
use std::collections::{HashMap, VecDeque};
use tracing::{debug, warn};

/// One message in a node's bounded history.
#[derive(Debug, Clone)]
pub struct NodeMessage {
    /// Message kind tag (e.g. `verification_request`).
    pub kind: String,
    /// Request correlation id.
    pub request_id: String,
    /// Content fingerprint (BLAKE3 of the canonical payload).
    pub content_hash: [u8; 32],
    /// Arrival time (Unix millis).
    pub timestamp_ms: u64,
}

impl NodeMessage {
    /// Build a message record, fingerprinting the content.
    pub fn new(kind: &str, request_id: &str, content: &[u8], timestamp_ms: u64) -> Self {
        Self {
            kind: kind.to_string(),
            request_id: request_id.to_string(),
            content_hash: hash(content),
            timestamp_ms,
        }
    }

    /// Collusion pattern token: message kind paired with hour-of-day.
    fn pattern_token(&self) -> (String, u64) {
        (self.kind.clone(), (self.timestamp_ms / 3_600_000) % 24)
    }
}

/// A behavior-log record for a flagged detection.
#[derive(Debug, Clone)]
pub struct BehaviorRecord {
    /// When the flag was raised.
    pub timestamp_ms: u64,
    /// Composite score at flag time.
    pub score: u32,
    /// Which heuristics fired.
    pub reasons: Vec<String>,
}

#[derive(Debug)]
struct NodeState {
    is_alive: bool,
    last_heartbeat_ms: u64,
    history: VecDeque<NodeMessage>,
    suspicion: u32,
    behavior_log: Vec<BehaviorRecord>,
}

impl NodeState {
    fn new() -> Self {
        Self {
            is_alive: true,
            last_heartbeat_ms: now_millis(),
            history: VecDeque::new(),
            suspicion: 0,
            behavior_log: Vec::new(),
        }
    }
}

/// Result of scoring one message.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Whether the composite score crossed the flag threshold.
    pub is_byzantine: bool,
    /// Composite score.
    pub score: u32,
    /// Heuristics that fired.
    pub reasons: Vec<String>,
    /// `min(score / 100, 1.0)`.
    pub confidence: f64,
}

/// Result of a consensus round.
#[derive(Debug, Clone)]
pub struct ConsensusOutcome {
    /// Whether quorum was reached.
    pub consensus: bool,
    /// Majority result when quorum was reached, else `None`.
    pub result: Option<bool>,
    /// Nodes whose votes counted.
    pub participating: Vec<AgentId>,
    /// Nodes excluded as Byzantine.
    pub byzantine: Vec<AgentId>,
}

/// Snapshot of registry health.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SystemHealth {
    /// Registered nodes.
    pub total_nodes: usize,
    /// Nodes currently alive.
    pub alive_nodes: usize,
    /// Nodes at or above the exclusion threshold.
    pub byzantine_nodes: usize,
    /// Whether enough alive nodes remain to reach the consensus threshold.
    pub consensus_capable: bool,
}

/// Registry of node states with detection and consensus evaluation.
pub struct ByzantineRegistry {
    config: DetectionConfig,
    consensus_threshold: RwLock<usize>,
    nodes: RwLock<HashMap<AgentId, NodeState>>,
}

impl ByzantineRegistry {
    /// Create a registry with the given detection tunables and consensus
    /// threshold.
    pub fn new(config: DetectionConfig, consensus_threshold: usize) -> Self {
        Self {
            config,
            consensus_threshold: RwLock::new(consensus_threshold),
            nodes: RwLock::new(HashMap::new()),
        }
    }

    /// Update the consensus threshold (set by `initialize`).
    pub fn set_consensus_threshold(&self, threshold: usize) {
        *self.consensus_threshold.write() = threshold;
    }

    /// Register a node. Idempotent: an existing node keeps its state.
    pub fn register_node(&self, node_id: &str) {
        self.nodes
            .write()
            .entry(node_id.to_string())
            .or_insert_with(NodeState::new);
    }

    /// Permanently exclude a node (revocation path): marked dead and pinned
    /// at the exclusion threshold.
    pub fn revoke_node(&self, node_id: &str) {
        if let Some(node) = self.nodes.write().get_mut(node_id) {
            node.is_alive = false;
            node.suspicion = node.suspicion.max(self.config.suspicion_exclusion);
        }
    }

    /// Record a heartbeat. Valid heartbeats lower suspicion by 1 (floored at
    /// 0) and mark the node alive; invalid heartbeats raise suspicion by 5.
    pub fn heartbeat(&self, node_id: &str, valid: bool) {
        let mut nodes = self.nodes.write();
        let Some(node) = nodes.get_mut(node_id) else {
            return;
        };
        node.last_heartbeat_ms = now_millis();
        if valid {
            node.is_alive = true;
            node.suspicion = node.suspicion.saturating_sub(1);
        } else {
            node.suspicion += 5;
            warn!(node_id, suspicion = node.suspicion, "invalid heartbeat");
        }
    }

    /// Current suspicion level for a node.
    pub fn suspicion(&self, node_id: &str) -> Option<u32> {
        self.nodes.read().get(node_id).map(|n| n.suspicion)
    }

    /// Behavior log for a node.
    pub fn behavior_log(&self, node_id: &str) -> Vec<BehaviorRecord> {
        self.nodes
            .read()
            .get(node_id)
            .map(|n| n.behavior_log.clone())
            .unwrap_or_default()
    }

    /// Score a new message against the node's bounded history.
    ///
    /// Four independent heuristics are summed; a score at or above the flag
    /// threshold marks the message Byzantine, raises the node's suspicion by
    /// 10, and appends to its behavior log. Unknown nodes are registered on
    /// first contact.
    pub fn detect(&self, node_id: &str, message: NodeMessage) -> Detection {
        let mut nodes = self.nodes.write();

        let mut reasons = Vec::new();
        let mut score = 0u32;

        {
            let node = nodes
                .entry(node_id.to_string())
                .or_insert_with(NodeState::new);

            if self.contradicts_history(node, &message) {
                score += self.config.contradiction_weight;
                reasons.push(format!(
                    "contradiction: conflicting content for ({}, {})",
                    message.kind, message.request_id
                ));
            }
            if self.timing_is_automated(node, &message) {
                score += self.config.timing_weight;
                reasons.push("timing: suspiciously regular message cadence".to_string());
            }
            if self.is_spamming(node, &message) {
                score += self.config.spam_weight;
                reasons.push(format!(
                    "spam: more than {} messages in {}s",
                    self.config.spam_max_messages, self.config.spam_window_secs
                ));
            }
        }

        // Collusion looks across nodes, so it runs before mutating this
        // node's history with the new message.
        let colluders = self.colluding_peers(&nodes, node_id, &message);
        if colluders >= 2 {
            score += self.config.collusion_weight;
            reasons.push(format!(
                "collusion: behavior pattern shared with {colluders} other nodes"
            ));
        }

        let node = nodes
            .entry(node_id.to_string())
            .or_insert_with(NodeState::new);
        node.history.push_back(message);
        while node.history.len() > self.config.history_limit {
            node.history.pop_front();
        }

        let is_byzantine = score >= self.config.flag_threshold;
        if is_byzantine {
            node.suspicion += 10;
            node.behavior_log.push(BehaviorRecord {
                timestamp_ms: now_millis(),
                score,
                reasons: reasons.clone(),
            });
            warn!(
                node_id,
                score,
                suspicion = node.suspicion,
                ?reasons,
                "byzantine behavior flagged"
            );
        } else {
            debug!(node_id, score, "message screened");
        }

        Detection {
            is_byzantine,
            score,
            reasons,
            confidence: (f64::from(score) / 100.0).min(1.0),
        }
    }

    /// Same `(kind, request_id)` seen before with different content.
    fn contradicts_history(&self, node: &NodeState, message: &NodeMessage) -> bool {
        node.history.iter().any(|prior| {
            prior.kind == message.kind
                && prior.request_id == message.request_id
                && prior.content_hash != message.content_hash
        })
    }

    /// Variance of up to the last 5 inter-message intervals below the floor:
    /// automation signature. Fires from the second message on (one interval
    /// has variance 0); a lone first message never trips it.
    fn timing_is_automated(&self, node: &NodeState, message: &NodeMessage) -> bool {
        let mut timestamps: Vec<u64> = node
            .history
            .iter()
            .rev()
            .take(5)
            .map(|m| m.timestamp_ms)
            .collect();
        timestamps.reverse();
        timestamps.push(message.timestamp_ms);
        if timestamps.len() < 2 {
            return false;
        }

        let intervals: Vec<f64> = timestamps
            .windows(2)
            .map(|pair| pair[1].saturating_sub(pair[0]) as f64)
            .collect();
        let mean = intervals.iter().sum::<f64>() / intervals.len() as f64;
        let variance = intervals
            .iter()
            .map(|i| (i - mean).powi(2))
            .sum::<f64>()
            / intervals.len() as f64;

        variance < self.config.timing_variance_floor
    }

    /// More than the configured message count within the trailing window.
    fn is_spamming(&self, node: &NodeState, message: &NodeMessage) -> bool {
        let window_ms = self.config.spam_window_secs * 1_000;
        let cutoff = message.timestamp_ms.saturating_sub(window_ms);
        let recent = node
            .history
            .iter()
            .filter(|m| m.timestamp_ms >= cutoff)
            .count();
        // +1 for the message under evaluation
        recent + 1 > self.config.spam_max_messages
    }

    /// Count other nodes whose last-10 `(kind, hour)` pattern matches this
    /// node's at or above the similarity threshold. Both patterns must be
    /// full (10 messages) to count.
    fn colluding_peers(
        &self,
        nodes: &HashMap<AgentId, NodeState>,
        node_id: &str,
        message: &NodeMessage,
    ) -> usize {
        const PATTERN_LEN: usize = 10;

        let own: Vec<_> = nodes
            .get(node_id)
            .map(|node| {
                let mut tokens: Vec<_> = node
                    .history
                    .iter()
                    .rev()
                    .take(PATTERN_LEN - 1)
                    .map(NodeMessage::pattern_token)
                    .collect();
                tokens.reverse();
                tokens.push(message.pattern_token());
                tokens
            })
            .unwrap_or_default();
        if own.len() < PATTERN_LEN {
            return 0;
        }

        nodes
            .iter()
            .filter(|(other_id, _)| other_id.as_str() != node_id)
            .filter(|(_, other)| {
                let theirs: Vec<_> = other
                    .history
                    .iter()
                    .rev()
                    .take(PATTERN_LEN)
                    .map(NodeMessage::pattern_token)
                    .collect();
                if theirs.len() < PATTERN_LEN {
                    return false;
                }
                let theirs: Vec<_> = theirs.into_iter().rev().collect();
                let matching = own
                    .iter()
                    .zip(theirs.iter())
                    .filter(|(a, b)| a == b)
                    .count();
                (matching as f64 / PATTERN_LEN as f64) >= self.config.collusion_similarity
            })
            .count()
    }

    /// Evaluate a consensus round over the given votes.
    ///
    /// Only alive nodes below the suspicion exclusion threshold participate;
    /// excluded nodes are removed from both numerator and denominator. Quorum
    /// is `ceil(threshold * 0.67)` participating votes.
    pub fn achieve_consensus(
        &self,
        proposal_id: &str,
        votes: &[(AgentId, bool)],
    ) -> ConsensusOutcome {
        let nodes = self.nodes.read();
        let threshold = *self.consensus_threshold.read();
        let quorum = ((threshold as f64) * 0.67).ceil() as usize;

        let mut participating = Vec::new();
        let mut byzantine = Vec::new();
        let mut yes = 0usize;
        let mut no = 0usize;

        for (voter, vote) in votes {
            match nodes.get(voter) {
                Some(node)
                    if node.is_alive && node.suspicion < self.config.suspicion_exclusion =>
                {
                    participating.push(voter.clone());
                    if *vote {
                        yes += 1;
                    } else {
                        no += 1;
                    }
                }
                Some(_) => byzantine.push(voter.clone()),
                // Unregistered voters are ignored entirely
                None => {}
            }
        }

        let consensus = participating.len() >= quorum;
        let result = consensus.then_some(yes > no);
        debug!(
            proposal_id,
            participants = participating.len(),
            quorum,
            yes,
            no,
            consensus,
            "consensus round evaluated"
        );

        ConsensusOutcome {
            consensus,
            result,
            participating,
            byzantine,
        }
    }

    /// Health snapshot for the status surface.
    pub fn system_health(&self) -> SystemHealth {
        let nodes = self.nodes.read();
        let threshold = *self.consensus_threshold.read();
        let alive = nodes.values().filter(|n| n.is_alive).count();
        let byzantine = nodes
            .values()
            .filter(|n| n.suspicion >= self.config.suspicion_exclusion)
            .count();
        SystemHealth {
            total_nodes: nodes.len(),
            alive_nodes: alive,
            byzantine_nodes: byzantine,
            consensus_capable: alive >= threshold,
        }
    }
}

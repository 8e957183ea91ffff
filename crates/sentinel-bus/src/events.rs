//! # Security Events
//!
//! Everything the enforcement pipeline announces to the outside world.
//! Rejections are not events: they surface as typed errors to the caller and
//! as audit entries; the bus carries lifecycle and outcome notifications.

use sentinel_types::{AgentId, SecurityLevel, VerificationResult};
use serde::{Deserialize, Serialize};

/// All events published by the enforcement core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SecurityEvent {
    /// The system finished bootstrapping with a participant set.
    SystemInitialized {
        /// Registered threshold-signing participants.
        participants: Vec<AgentId>,
        /// Quorum size in effect.
        threshold: usize,
        /// When initialization completed (Unix millis).
        timestamp_ms: u64,
    },

    /// A request passed the full pipeline.
    VerificationCompleted {
        /// The signed, audited result.
        result: VerificationResult,
    },

    /// A pipeline stage failed unexpectedly (not a clean rejection).
    VerificationError {
        /// The originating request.
        request_id: String,
        /// The agent whose request failed.
        agent_id: AgentId,
        /// Error description.
        error: String,
    },

    /// An agent joined the registry.
    AgentRegistered {
        /// The new agent.
        agent_id: AgentId,
        /// Granted clearance level.
        security_level: SecurityLevel,
    },

    /// An agent was revoked from both registries.
    AgentRevoked {
        /// The revoked agent.
        agent_id: AgentId,
        /// Operator-supplied reason.
        reason: String,
    },

    /// Operator-initiated hard stop. No drain guarantee.
    EmergencyShutdown {
        /// Operator-supplied reason.
        reason: String,
        /// When the stop took effect (Unix millis).
        timestamp_ms: u64,
    },
}

impl SecurityEvent {
    /// Topic for subscription filtering.
    #[must_use]
    pub fn topic(&self) -> SecurityTopic {
        match self {
            Self::SystemInitialized { .. } | Self::EmergencyShutdown { .. } => {
                SecurityTopic::Lifecycle
            }
            Self::VerificationCompleted { .. } | Self::VerificationError { .. } => {
                SecurityTopic::Verification
            }
            Self::AgentRegistered { .. } | Self::AgentRevoked { .. } => SecurityTopic::Registry,
        }
    }

    /// The agent this event concerns, when there is one.
    #[must_use]
    pub fn agent_id(&self) -> Option<&str> {
        match self {
            Self::VerificationCompleted { result } => Some(&result.agent_id),
            Self::VerificationError { agent_id, .. }
            | Self::AgentRegistered { agent_id, .. }
            | Self::AgentRevoked { agent_id, .. } => Some(agent_id),
            Self::SystemInitialized { .. } | Self::EmergencyShutdown { .. } => None,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecurityTopic {
    /// Initialization and shutdown.
    Lifecycle,
    /// Verification outcomes and errors.
    Verification,
    /// Agent registration and revocation.
    Registry,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<SecurityTopic>,
    /// Agents to include. Empty means all agents (and agent-less events).
    pub agent_ids: Vec<AgentId>,
}

impl EventFilter {
    /// Accept every event.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Accept events on specific topics.
    #[must_use]
    pub fn topics(topics: Vec<SecurityTopic>) -> Self {
        Self {
            topics,
            agent_ids: Vec::new(),
        }
    }

    /// Accept events concerning specific agents.
    #[must_use]
    pub fn agents(agent_ids: Vec<AgentId>) -> Self {
        Self {
            topics: Vec::new(),
            agent_ids,
        }
    }

    /// Check whether an event passes this filter.
    #[must_use]
    pub fn matches(&self, event: &SecurityEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&SecurityTopic::All)
            || self.topics.contains(&event.topic());

        let agent_match = self.agent_ids.is_empty()
            || event
                .agent_id()
                .is_some_and(|id| self.agent_ids.iter().any(|wanted| wanted == id));

        topic_match && agent_match
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_types::now_millis;

    fn shutdown_event() -> SecurityEvent {
        SecurityEvent::EmergencyShutdown {
            reason: "drill".into(),
            timestamp_ms: now_millis(),
        }
    }

    fn registered_event(agent: &str) -> SecurityEvent {
        SecurityEvent::AgentRegistered {
            agent_id: agent.into(),
            security_level: SecurityLevel::Medium,
        }
    }

    #[test]
    fn test_topic_mapping() {
        assert_eq!(shutdown_event().topic(), SecurityTopic::Lifecycle);
        assert_eq!(registered_event("a").topic(), SecurityTopic::Registry);
    }

    #[test]
    fn test_filter_all() {
        assert!(EventFilter::all().matches(&shutdown_event()));
    }

    #[test]
    fn test_filter_by_topic() {
        let filter = EventFilter::topics(vec![SecurityTopic::Registry]);
        assert!(filter.matches(&registered_event("a")));
        assert!(!filter.matches(&shutdown_event()));
    }

    #[test]
    fn test_filter_by_agent() {
        let filter = EventFilter::agents(vec!["agent-7".into()]);
        assert!(filter.matches(&registered_event("agent-7")));
        assert!(!filter.matches(&registered_event("agent-8")));
        // Agent-less events don't pass an agent filter
        assert!(!filter.matches(&shutdown_event()));
    }
}

//! Cross-crate integration scenarios.
//!
//! Shared fixtures live here; each submodule holds one scenario family.

pub mod adversarial;
pub mod audit_integrity;
pub mod consensus;
pub mod pipeline;

use sentinel_bus::InMemoryEventBus;
use sentinel_core::{EnforcementService, StubTruthVerifier};
use sentinel_crypto::KeyPair;
use sentinel_types::{
    now_millis, AgentId, ClaimEnvelope, SecurityConfig, SecurityLevel, VerificationRequest,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

/// A fully initialized service with registered agents and their keypairs.
pub struct Harness {
    pub service: Arc<EnforcementService>,
    pub bus: Arc<InMemoryEventBus>,
    pub agents: Vec<(AgentId, KeyPair)>,
}

impl Harness {
    /// Production-config service with `count` registered agents, initialized
    /// with all of them as threshold participants.
    pub async fn with_agents(count: usize) -> Self {
        Self::with_config(SecurityConfig::production(), count).await
    }

    pub async fn with_config(config: SecurityConfig, count: usize) -> Self {
        // First caller installs the subscriber; later calls are no-ops
        let _ = sentinel_telemetry::init_tracing(&sentinel_telemetry::TelemetryConfig::from_env());

        let bus = Arc::new(InMemoryEventBus::new());
        let publisher: Arc<dyn sentinel_bus::EventPublisher> = bus.clone();
        let service = Arc::new(
            EnforcementService::new(config, StubTruthVerifier, publisher).expect("valid config"),
        );

        let mut agents = Vec::new();
        for i in 0..count {
            let agent_id = format!("agent-{i}");
            let (_, keypair) = service
                .register_agent(&agent_id, BTreeSet::new(), SecurityLevel::Medium)
                .await
                .expect("fresh registration");
            agents.push((agent_id, keypair));
        }

        let ids: Vec<AgentId> = agents.iter().map(|(id, _)| id.clone()).collect();
        service.initialize(&ids).await.expect("initialize");

        Self {
            service,
            bus,
            agents,
        }
    }

    /// A signed, rate-compliant request from agent `index`.
    pub fn signed_request(&self, index: usize, request_id: &str, payload: &str) -> VerificationRequest {
        let (agent_id, keypair) = &self.agents[index];
        let mut request = VerificationRequest {
            request_id: request_id.to_string(),
            agent_id: agent_id.clone(),
            claim: ClaimEnvelope::json(payload.to_string()),
            timestamp_ms: now_millis(),
            nonce: Uuid::new_v4().simple().to_string(),
            signature: None,
        };
        request.signature = Some(keypair.sign(&request.signing_bytes()).to_vec());
        request
    }
}

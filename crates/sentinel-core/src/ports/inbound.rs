//! Inbound port: the operations callers drive the pipeline with.

use crate::report::{SecurityReport, SecurityStatus};
use async_trait::async_trait;
use sentinel_crypto::KeyPair;
use sentinel_types::{
    AgentId, AgentIdentity, SecurityError, SecurityLevel, VerificationRequest, VerificationResult,
};
use std::collections::BTreeSet;

/// The surface exposed to orchestration layers.
///
/// One implementation exists ([`EnforcementService`](crate::EnforcementService));
/// the trait is the seam middleware and test harnesses program against.
#[async_trait]
pub trait SecurityApi: Send + Sync {
    /// Bootstrap: register consensus participants and generate threshold key
    /// material. Must be called once before requests are processed.
    async fn initialize(&self, participants: &[AgentId]) -> Result<(), SecurityError>;

    /// Run one request through the full enforcement pipeline.
    async fn process_verification_request(
        &self,
        request: VerificationRequest,
    ) -> Result<VerificationResult, SecurityError>;

    /// Register an agent in the identity and node registries together.
    /// The returned keypair is the agent's to keep; it is never stored.
    async fn register_agent(
        &self,
        agent_id: &str,
        capabilities: BTreeSet<String>,
        security_level: SecurityLevel,
    ) -> Result<(AgentIdentity, KeyPair), SecurityError>;

    /// Revoke an agent in both registries together.
    async fn revoke_agent(&self, agent_id: &str, reason: &str) -> Result<(), SecurityError>;

    /// Hard stop: no in-flight completion guarantee, subsequent requests are
    /// rejected.
    async fn emergency_shutdown(&self, reason: &str) -> Result<(), SecurityError>;

    /// Current metrics, health, audit summary, and top threats.
    fn security_status(&self) -> SecurityStatus;

    /// Full JSON report including the audit trail.
    fn export_report(&self) -> Result<SecurityReport, SecurityError>;
}

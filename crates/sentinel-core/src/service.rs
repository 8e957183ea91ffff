//! # Enforcement Service
//!
//! The orchestrator. Owns one registry per concern and runs every request
//! through the strict stage order:
//!
//! 1. authenticate
//! 2. rate-limit
//! 3. Byzantine screen
//! 4. signature verification (when a signature is present)
//! 5. business truth verification (outbound port)
//! 6. threshold-sign the result
//! 7. audit `VERIFICATION_COMPLETED`
//! 8. metrics, reputation bonus, event publication
//!
//! Stages 1-4 reject with their own audit entry and metric updates before the
//! error propagates. Failures past stage 4 funnel through one central handler
//! that audits `VERIFICATION_ERROR` and re-raises; the pipeline never retries.

use crate::domain::audit::{AuditTrail, ExportFormat};
use crate::domain::auth::AuthRegistry;
use crate::domain::byzantine::{ByzantineRegistry, ConsensusOutcome, NodeMessage, SystemHealth};
use crate::domain::rate_limit::RateLimiter;
use crate::domain::threshold::ThresholdSigner;
use crate::metrics::SecurityMetrics;
use crate::ports::inbound::SecurityApi;
use crate::ports::outbound::TruthVerifier;
use crate::report::{AuditSummary, SecurityReport, SecurityStatus, ThreatEntry};
use async_trait::async_trait;
use parking_lot::RwLock;
use sentinel_bus::{EventPublisher, SecurityEvent};
use sentinel_crypto::{verify_detached, KeyPair};
use sentinel_types::{
    now_millis, AgentId, AgentIdentity, AuditAction, SecurityConfig, SecurityError, SecurityLevel,
    VerificationRequest, VerificationResult,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// How many low-reputation agents the status surface lists.
const TOP_THREAT_LIMIT: usize = 5;

/// The security enforcement pipeline and its registries.
pub struct EnforcementService {
    config: SecurityConfig,
    auth: AuthRegistry,
    rate_limiter: RateLimiter,
    byzantine: ByzantineRegistry,
    signer: RwLock<Option<ThresholdSigner>>,
    participants: RwLock<Vec<AgentId>>,
    audit: AuditTrail,
    metrics: SecurityMetrics,
    verifier: Arc<dyn TruthVerifier>,
    bus: Arc<dyn EventPublisher>,
    accepting: AtomicBool,
    shutdown_reason: RwLock<Option<String>>,
}

impl EnforcementService {
    /// Build the service from a validated configuration.
    ///
    /// The service is not accepting requests until [`initialize`](Self::initialize)
    /// succeeds.
    ///
    /// # Errors
    ///
    /// `SecurityError::Config` when the configuration is inconsistent.
    pub fn new(
        config: SecurityConfig,
        verifier: impl TruthVerifier + 'static,
        bus: Arc<dyn EventPublisher>,
    ) -> Result<Self, SecurityError> {
        config.validate()?;
        Ok(Self {
            auth: AuthRegistry::new(config.reputation, config.token_ttl_secs),
            rate_limiter: RateLimiter::new(config.rate_limits),
            byzantine: ByzantineRegistry::new(config.detection, config.threshold),
            signer: RwLock::new(None),
            participants: RwLock::new(Vec::new()),
            audit: AuditTrail::new(),
            metrics: SecurityMetrics::new(),
            verifier: Arc::new(verifier),
            bus,
            accepting: AtomicBool::new(false),
            shutdown_reason: RwLock::new(None),
            config,
        })
    }

    /// Bootstrap the consensus participant set and threshold key material.
    ///
    /// The effective threshold is taken from the configuration when the
    /// participant count matches `total_nodes`, otherwise re-derived as
    /// `floor(2n/3) + 1`. No partial state survives a failed initialization.
    ///
    /// # Errors
    ///
    /// `SecurityError::Config` for an empty or duplicated participant set.
    pub async fn initialize(&self, participants: &[AgentId]) -> Result<(), SecurityError> {
        if participants.is_empty() {
            return Err(SecurityError::Config(
                "participant set must not be empty".to_string(),
            ));
        }

        let n = participants.len();
        let threshold = if n == self.config.total_nodes {
            self.config.threshold
        } else {
            SecurityConfig::consensus_threshold(n)
        };

        let signer = ThresholdSigner::new(n, threshold)?;
        signer.generate_keys(participants)?;

        for participant in participants {
            self.byzantine.register_node(participant);
        }
        self.byzantine.set_consensus_threshold(threshold);

        *self.signer.write() = Some(signer);
        *self.participants.write() = participants.to_vec();
        self.accepting.store(true, Ordering::SeqCst);

        self.audit.record(
            "system",
            AuditAction::SystemInitialized,
            serde_json::json!({
                "participants": participants,
                "threshold": threshold,
            })
            .to_string(),
        );
        self.bus
            .publish(SecurityEvent::SystemInitialized {
                participants: participants.to_vec(),
                threshold,
                timestamp_ms: now_millis(),
            })
            .await;

        info!(participants = n, threshold, "security system initialized");
        Ok(())
    }

    /// Register an agent in the identity and node registries together.
    ///
    /// # Errors
    ///
    /// `SecurityError::Authentication(AlreadyRegistered)` for a duplicate id;
    /// the existing identity is untouched and no node state is added.
    pub async fn register_agent(
        &self,
        agent_id: &str,
        capabilities: BTreeSet<String>,
        security_level: SecurityLevel,
    ) -> Result<(AgentIdentity, KeyPair), SecurityError> {
        let (identity, keypair) = self
            .auth
            .register_agent(agent_id, capabilities, security_level)?;
        self.byzantine.register_node(agent_id);

        self.audit.record(
            agent_id,
            AuditAction::AgentRegistered,
            serde_json::json!({ "security_level": security_level }).to_string(),
        );
        self.bus
            .publish(SecurityEvent::AgentRegistered {
                agent_id: agent_id.to_string(),
                security_level,
            })
            .await;
        Ok((identity, keypair))
    }

    /// Revoke an agent in both registries together.
    ///
    /// # Errors
    ///
    /// `SecurityError::Authentication(UnknownAgent)` when no identity exists.
    pub async fn revoke_agent(&self, agent_id: &str, reason: &str) -> Result<(), SecurityError> {
        self.auth.revoke(agent_id)?;
        self.byzantine.revoke_node(agent_id);

        self.audit.record(
            agent_id,
            AuditAction::AgentRevoked,
            serde_json::json!({ "reason": reason }).to_string(),
        );
        self.bus
            .publish(SecurityEvent::AgentRevoked {
                agent_id: agent_id.to_string(),
                reason: reason.to_string(),
            })
            .await;
        Ok(())
    }

    /// Run one request through the full pipeline.
    ///
    /// # Errors
    ///
    /// Any stage's typed rejection, or `SecurityError::SystemShutdown` after
    /// an emergency stop. Every rejection is audited before it propagates.
    #[instrument(skip(self, request), fields(request_id = %request.request_id, agent_id = %request.agent_id))]
    pub async fn process_verification_request(
        &self,
        request: VerificationRequest,
    ) -> Result<VerificationResult, SecurityError> {
        let started = now_millis();
        self.metrics.record_request();

        if !self.accepting.load(Ordering::SeqCst) {
            let reason = self
                .shutdown_reason
                .read()
                .clone()
                .unwrap_or_else(|| "system not initialized".to_string());
            self.metrics.record_rejected();
            self.audit.record(
                &request.agent_id,
                AuditAction::VerificationRejected,
                serde_json::json!({
                    "request_id": request.request_id,
                    "error": format!("not accepting requests: {reason}"),
                })
                .to_string(),
            );
            return Err(SecurityError::SystemShutdown(reason));
        }

        // Stage 1: authenticate
        let identity = match self.auth.check_identity(&request.agent_id) {
            Ok(identity) => identity,
            Err(err) => {
                self.metrics.record_rejected();
                self.metrics.record_bypass_attempt();
                self.audit.record(
                    &request.agent_id,
                    AuditAction::VerificationRejected,
                    serde_json::json!({
                        "request_id": request.request_id,
                        "error": err.to_string(),
                    })
                    .to_string(),
                );
                return Err(err.into());
            }
        };

        // Stage 2: rate limit
        if let Err(violation) = self.rate_limiter.check(&request.agent_id) {
            self.metrics.record_rejected();
            self.audit.record(
                &request.agent_id,
                AuditAction::RateLimitExceeded,
                serde_json::json!({
                    "request_id": request.request_id,
                    "window": violation.window.as_str(),
                    "retry_after_secs": violation.retry_after_secs,
                })
                .to_string(),
            );
            return Err(SecurityError::RateLimit {
                window: violation.window,
                retry_after_secs: violation.retry_after_secs,
            });
        }

        // Stage 3: Byzantine screen
        let detection = self.byzantine.detect(
            &request.agent_id,
            NodeMessage::new(
                "verification_request",
                &request.request_id,
                &request.claim.canonical_bytes(),
                request.timestamp_ms,
            ),
        );
        if detection.is_byzantine {
            self.metrics.record_byzantine();
            self.metrics.record_rejected();
            if let Err(err) = self.auth.update_reputation(
                &request.agent_id,
                -self.auth.byzantine_penalty(),
                "byzantine behavior",
            ) {
                warn!(error = %err, "reputation penalty failed");
            }
            self.audit.record(
                &request.agent_id,
                AuditAction::ByzantineBehavior,
                serde_json::json!({
                    "request_id": request.request_id,
                    "score": detection.score,
                    "reasons": detection.reasons,
                })
                .to_string(),
            );
            return Err(SecurityError::Byzantine {
                score: detection.score,
                reasons: detection.reasons,
            });
        }

        // Stage 4: request signature
        if let Some(signature) = &request.signature {
            if !verify_detached(&request.signing_bytes(), signature, &identity.public_key) {
                self.metrics.record_bypass_attempt();
                self.audit.record(
                    &request.agent_id,
                    AuditAction::InvalidSignature,
                    serde_json::json!({ "request_id": request.request_id }).to_string(),
                );
                return Err(SecurityError::Cryptographic(
                    "request signature verification failed".to_string(),
                ));
            }
        }

        // Stages 5-8 share the central error handler
        match self.complete_request(&request).await {
            Ok(result) => {
                self.metrics.record_verified();
                self.metrics
                    .record_response_time(now_millis().saturating_sub(started));
                if let Err(err) = self.auth.update_reputation(
                    &request.agent_id,
                    self.auth.success_bonus(),
                    "verification success",
                ) {
                    warn!(error = %err, "reputation bonus failed");
                }
                self.bus
                    .publish(SecurityEvent::VerificationCompleted {
                        result: result.clone(),
                    })
                    .await;
                Ok(result)
            }
            Err(err) => {
                self.metrics.record_rejected();
                self.audit.record(
                    &request.agent_id,
                    AuditAction::VerificationError,
                    serde_json::json!({
                        "request_id": request.request_id,
                        "error": err.to_string(),
                    })
                    .to_string(),
                );
                self.bus
                    .publish(SecurityEvent::VerificationError {
                        request_id: request.request_id.clone(),
                        agent_id: request.agent_id.clone(),
                        error: err.to_string(),
                    })
                    .await;
                Err(err)
            }
        }
    }

    /// Stages 5-7: business verification, threshold signature, completion
    /// audit.
    async fn complete_request(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationResult, SecurityError> {
        let assessment = self.verifier.verify_claim(request).await?;

        let mut result = VerificationResult {
            result_id: Uuid::new_v4(),
            request_id: request.request_id.clone(),
            agent_id: request.agent_id.clone(),
            verified: assessment.verified,
            evidence: assessment.evidence,
            confidence: assessment.confidence,
            timestamp_ms: now_millis(),
            signature: Vec::new(),
            audit_trail: Vec::new(),
        };

        {
            let signer = self.signer.read();
            let signer = signer
                .as_ref()
                .ok_or_else(|| SecurityError::Threshold("signer not initialized".to_string()))?;
            let participants = self.participants.read();
            result.signature = signer
                .create_threshold_signature(&result.signing_bytes(), &participants)?
                .to_vec();
        }

        let entry = self.audit.record(
            &request.agent_id,
            AuditAction::VerificationCompleted,
            serde_json::json!({
                "request_id": request.request_id,
                "result_id": result.result_id,
                "verified": result.verified,
                "confidence": result.confidence,
            })
            .to_string(),
        );
        result.audit_trail.push(entry);
        Ok(result)
    }

    /// Verify a full threshold signature over a result.
    pub fn verify_result_signature(&self, result: &VerificationResult) -> bool {
        let signer = self.signer.read();
        match signer.as_ref() {
            Some(signer) => signer.verify(&result.signing_bytes(), &result.signature),
            None => false,
        }
    }

    /// Evaluate a consensus round over the registered node set.
    pub fn achieve_consensus(
        &self,
        proposal_id: &str,
        votes: &[(AgentId, bool)],
    ) -> ConsensusOutcome {
        self.byzantine.achieve_consensus(proposal_id, votes)
    }

    /// Hard stop: flips the service to non-accepting. In-flight requests get
    /// no completion guarantee; subsequent requests are rejected with
    /// `SecurityError::SystemShutdown`.
    pub async fn emergency_shutdown(&self, reason: &str) -> Result<(), SecurityError> {
        self.accepting.store(false, Ordering::SeqCst);
        *self.shutdown_reason.write() = Some(reason.to_string());

        self.audit.record(
            "system",
            AuditAction::EmergencyShutdown,
            serde_json::json!({ "reason": reason }).to_string(),
        );
        self.bus
            .publish(SecurityEvent::EmergencyShutdown {
                reason: reason.to_string(),
                timestamp_ms: now_millis(),
            })
            .await;

        warn!(reason, "emergency shutdown");
        Ok(())
    }

    /// Whether the service currently accepts requests.
    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::SeqCst)
    }

    /// Node registry health.
    pub fn system_health(&self) -> SystemHealth {
        self.byzantine.system_health()
    }

    /// Point-in-time view of metrics, health, audit state, and threats.
    pub fn security_status(&self) -> SecurityStatus {
        let verification = self.audit.verify_trail();
        let action_counts = self
            .audit
            .action_counts()
            .into_iter()
            .map(|(action, count)| (action.as_str().to_string(), count))
            .collect();

        let reputation_scores: BTreeMap<AgentId, u8> =
            self.auth.reputation_scores().into_iter().collect();
        let mut top_threats: Vec<ThreatEntry> = reputation_scores
            .iter()
            .map(|(agent_id, reputation)| ThreatEntry {
                agent_id: agent_id.clone(),
                reputation: *reputation,
                revoked: self
                    .auth
                    .identity(agent_id)
                    .is_some_and(|identity| identity.revoked),
            })
            .collect();
        top_threats.sort_by_key(|threat| threat.reputation);
        top_threats.truncate(TOP_THREAT_LIMIT);

        SecurityStatus {
            accepting_requests: self.is_accepting(),
            initialized: self.signer.read().is_some(),
            metrics: self.metrics.snapshot(),
            system_health: self.byzantine.system_health(),
            audit: AuditSummary {
                total_entries: verification.total_entries,
                chain_valid: verification.valid,
                corrupted_entries: verification.corrupted.len(),
                action_counts,
            },
            top_threats,
            reputation_scores,
        }
    }

    /// Full report: status snapshot plus the complete audit trail.
    ///
    /// # Errors
    ///
    /// `SecurityError::Verification` when serialization of the trail fails.
    pub fn export_report(&self) -> Result<SecurityReport, SecurityError> {
        // Exercise the JSON path so a serialization problem surfaces here,
        // not in the caller's serializer.
        self.audit.export(ExportFormat::Json)?;
        Ok(SecurityReport {
            generated_at_ms: now_millis(),
            status: self.security_status(),
            total_rate_violations: self.rate_limiter.total_violations(),
            audit_trail: self.audit.recent(self.audit.len()),
        })
    }

    /// The audit trail, for direct queries.
    pub fn audit_trail(&self) -> &AuditTrail {
        &self.audit
    }

    /// The identity registry, for direct queries.
    pub fn auth_registry(&self) -> &AuthRegistry {
        &self.auth
    }

    /// Per-agent rate-limit overrides.
    pub fn set_agent_limits(&self, agent_id: &str, limits: sentinel_types::RateLimits) {
        self.rate_limiter.set_agent_limits(agent_id, limits);
    }
}

#[async_trait]
impl SecurityApi for EnforcementService {
    async fn initialize(&self, participants: &[AgentId]) -> Result<(), SecurityError> {
        EnforcementService::initialize(self, participants).await
    }

    async fn process_verification_request(
        &self,
        request: VerificationRequest,
    ) -> Result<VerificationResult, SecurityError> {
        EnforcementService::process_verification_request(self, request).await
    }

    async fn register_agent(
        &self,
        agent_id: &str,
        capabilities: BTreeSet<String>,
        security_level: SecurityLevel,
    ) -> Result<(AgentIdentity, KeyPair), SecurityError> {
        EnforcementService::register_agent(self, agent_id, capabilities, security_level).await
    }

    async fn revoke_agent(&self, agent_id: &str, reason: &str) -> Result<(), SecurityError> {
        EnforcementService::revoke_agent(self, agent_id, reason).await
    }

    async fn emergency_shutdown(&self, reason: &str) -> Result<(), SecurityError> {
        EnforcementService::emergency_shutdown(self, reason).await
    }

    fn security_status(&self) -> SecurityStatus {
        EnforcementService::security_status(self)
    }

    fn export_report(&self) -> Result<SecurityReport, SecurityError> {
        EnforcementService::export_report(self)
    }
}

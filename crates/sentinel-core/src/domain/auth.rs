//! # Agent Authentication Registry
//!
//! Identity records, challenge authentication, capability tokens, and the
//! reputation score that threads through every other component.
//!
//! Identities are never deleted. Revocation forces reputation to 0 and marks
//! the record; a revoked agent can never authenticate again.

use parking_lot::RwLock;
use sentinel_crypto::{hash_hex, verify_detached, KeyPair};
use sentinel_types::{
    now_millis, AgentId, AgentIdentity, AuthError, ReputationConfig, SecurityLevel,
};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A capability token issued to an authenticated agent.
#[derive(Debug, Clone)]
struct AuthToken {
    agent_id: AgentId,
    permissions: BTreeSet<String>,
    expires_ms: u64,
}

/// Registry of agent identities and live capability tokens.
pub struct AuthRegistry {
    reputation: ReputationConfig,
    token_ttl_ms: u64,
    identities: RwLock<HashMap<AgentId, AgentIdentity>>,
    tokens: RwLock<HashMap<String, AuthToken>>,
}

impl AuthRegistry {
    /// Create an empty registry.
    pub fn new(reputation: ReputationConfig, token_ttl_secs: u64) -> Self {
        Self {
            reputation,
            token_ttl_ms: token_ttl_secs * 1_000,
            identities: RwLock::new(HashMap::new()),
            tokens: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new agent: generates its keypair, issues a self-referential
    /// certificate record, and seeds reputation at 100.
    ///
    /// The secret half of the keypair is returned to the caller and never
    /// stored; the registry keeps only the verifying key.
    ///
    /// # Errors
    ///
    /// `AuthError::AlreadyRegistered` if the agent id exists. The existing
    /// identity is left untouched.
    pub fn register_agent(
        &self,
        agent_id: &str,
        capabilities: BTreeSet<String>,
        security_level: SecurityLevel,
    ) -> Result<(AgentIdentity, KeyPair), AuthError> {
        let mut identities = self.identities.write();
        if identities.contains_key(agent_id) {
            return Err(AuthError::AlreadyRegistered(agent_id.to_string()));
        }

        let keypair = KeyPair::generate();
        let public_key = *keypair.public_key().as_bytes();

        let mut cert_material = Vec::with_capacity(agent_id.len() + 32);
        cert_material.extend_from_slice(agent_id.as_bytes());
        cert_material.extend_from_slice(&public_key);

        let identity = AgentIdentity {
            agent_id: agent_id.to_string(),
            public_key,
            certificate_chain: vec![hash_hex(&cert_material)],
            capabilities,
            security_level,
            reputation: 100,
            last_verified_ms: now_millis(),
            revoked: false,
        };
        identities.insert(agent_id.to_string(), identity.clone());

        info!(agent_id, level = ?security_level, "agent registered");
        Ok((identity, keypair))
    }

    /// Authenticate an agent by verifying its signature over a challenge.
    ///
    /// Refreshes `last_verified` on success.
    ///
    /// # Errors
    ///
    /// - `UnknownAgent` when no identity exists
    /// - `Revoked` when the identity was revoked
    /// - `InvalidChallenge` when the signature does not verify
    /// - `ReputationTooLow` when reputation is below the floor
    pub fn authenticate(
        &self,
        agent_id: &str,
        challenge: &[u8],
        signature: &[u8],
    ) -> Result<(), AuthError> {
        let mut identities = self.identities.write();
        let identity = identities
            .get_mut(agent_id)
            .ok_or_else(|| AuthError::UnknownAgent(agent_id.to_string()))?;

        if identity.revoked {
            return Err(AuthError::Revoked(agent_id.to_string()));
        }
        if !verify_detached(challenge, signature, &identity.public_key) {
            warn!(agent_id, "challenge signature rejected");
            return Err(AuthError::InvalidChallenge);
        }
        if identity.reputation < self.reputation.min_authenticate {
            return Err(AuthError::ReputationTooLow {
                actual: identity.reputation,
                required: self.reputation.min_authenticate,
            });
        }

        identity.last_verified_ms = now_millis();
        Ok(())
    }

    /// Pipeline-stage identity check: the agent must exist, not be revoked,
    /// and sit above the reputation floor. Refreshes `last_verified`.
    pub fn check_identity(&self, agent_id: &str) -> Result<AgentIdentity, AuthError> {
        let mut identities = self.identities.write();
        let identity = identities
            .get_mut(agent_id)
            .ok_or_else(|| AuthError::UnknownAgent(agent_id.to_string()))?;

        if identity.revoked {
            return Err(AuthError::Revoked(agent_id.to_string()));
        }
        if identity.reputation < self.reputation.min_authenticate {
            return Err(AuthError::ReputationTooLow {
                actual: identity.reputation,
                required: self.reputation.min_authenticate,
            });
        }
        identity.last_verified_ms = now_millis();
        Ok(identity.clone())
    }

    /// Issue a short-lived capability token.
    ///
    /// # Errors
    ///
    /// `UnknownAgent` or `Revoked` when the identity cannot hold tokens.
    pub fn issue_token(
        &self,
        agent_id: &str,
        permissions: BTreeSet<String>,
    ) -> Result<String, AuthError> {
        {
            let identities = self.identities.read();
            let identity = identities
                .get(agent_id)
                .ok_or_else(|| AuthError::UnknownAgent(agent_id.to_string()))?;
            if identity.revoked {
                return Err(AuthError::Revoked(agent_id.to_string()));
            }
        }

        let token = Uuid::new_v4().simple().to_string();
        self.tokens.write().insert(
            token.clone(),
            AuthToken {
                agent_id: agent_id.to_string(),
                permissions,
                expires_ms: now_millis() + self.token_ttl_ms,
            },
        );
        Ok(token)
    }

    /// Validate a token, optionally requiring one permission.
    ///
    /// Expired tokens are purged here, on the validation attempt, not
    /// proactively.
    ///
    /// # Errors
    ///
    /// `InvalidToken` for unknown or expired tokens, `MissingPermission` when
    /// the required permission is absent.
    pub fn validate_token(
        &self,
        token: &str,
        required_permission: Option<&str>,
    ) -> Result<AgentId, AuthError> {
        let now = now_millis();
        let mut tokens = self.tokens.write();
        tokens.retain(|_, t| t.expires_ms > now);

        let record = tokens.get(token).ok_or(AuthError::InvalidToken)?;
        if let Some(permission) = required_permission {
            if !record.permissions.contains(permission) {
                return Err(AuthError::MissingPermission(permission.to_string()));
            }
        }
        Ok(record.agent_id.clone())
    }

    /// Adjust an agent's reputation by `delta`, clamped to `[0, 100]`.
    /// Returns the new score.
    ///
    /// This is the single mutable trust signal: every pipeline outcome lands
    /// here.
    pub fn update_reputation(
        &self,
        agent_id: &str,
        delta: i32,
        reason: &str,
    ) -> Result<u8, AuthError> {
        let mut identities = self.identities.write();
        let identity = identities
            .get_mut(agent_id)
            .ok_or_else(|| AuthError::UnknownAgent(agent_id.to_string()))?;

        let updated = (i32::from(identity.reputation) + delta).clamp(0, 100) as u8;
        debug!(
            agent_id,
            from = identity.reputation,
            to = updated,
            reason,
            "reputation updated"
        );
        identity.reputation = updated;
        Ok(updated)
    }

    /// Revoke an agent: reputation forced to 0, record kept.
    pub fn revoke(&self, agent_id: &str) -> Result<(), AuthError> {
        let mut identities = self.identities.write();
        let identity = identities
            .get_mut(agent_id)
            .ok_or_else(|| AuthError::UnknownAgent(agent_id.to_string()))?;
        identity.revoked = true;
        identity.reputation = 0;
        warn!(agent_id, "agent revoked");
        Ok(())
    }

    /// Look up an identity snapshot.
    pub fn identity(&self, agent_id: &str) -> Option<AgentIdentity> {
        self.identities.read().get(agent_id).cloned()
    }

    /// Snapshot of all reputation scores (for metrics and threat reports).
    pub fn reputation_scores(&self) -> HashMap<AgentId, u8> {
        self.identities
            .read()
            .iter()
            .map(|(id, identity)| (id.clone(), identity.reputation))
            .collect()
    }

    /// Number of registered identities.
    pub fn len(&self) -> usize {
        self.identities.read().len()
    }

    /// True when no identities are registered.
    pub fn is_empty(&self) -> bool {
        self.identities.read().is_empty()
    }

    /// The reputation bonus applied on verification success.
    pub fn success_bonus(&self) -> i32 {
        i32::from(self.reputation.success_bonus)
    }

    /// The reputation penalty applied on a Byzantine flag.
    pub fn byzantine_penalty(&self) -> i32 {
        i32::from(self.reputation.byzantine_penalty)
    }
}

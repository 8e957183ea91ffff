//! Outbound port: the business verification stage.
//!
//! The pipeline enforces security; whether a claim is actually *true* is
//! somebody else's problem, injected here.

use async_trait::async_trait;
use sentinel_types::{SecurityError, TruthAssessment, VerificationRequest};

/// Verifies the content of a claim after the security stages have passed.
#[async_trait]
pub trait TruthVerifier: Send + Sync {
    /// Assess the claim carried by an already-screened request.
    async fn verify_claim(
        &self,
        request: &VerificationRequest,
    ) -> Result<TruthAssessment, SecurityError>;
}

/// Verifier that accepts every claim with full confidence.
///
/// Default wiring for tests and for deployments where only the security
/// pipeline is exercised.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubTruthVerifier;

#[async_trait]
impl TruthVerifier for StubTruthVerifier {
    async fn verify_claim(
        &self,
        request: &VerificationRequest,
    ) -> Result<TruthAssessment, SecurityError> {
        Ok(TruthAssessment {
            verified: true,
            evidence: vec![format!("stub-assessment:{}", request.request_id)],
            confidence: 1.0,
        })
    }
}

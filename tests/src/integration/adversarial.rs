//! Adversarial scenarios: contradictions, forged signatures, revocation, and
//! the reputation spiral that locks a misbehaving agent out.

#[cfg(test)]
mod tests {
    use crate::integration::Harness;
    use sentinel_crypto::KeyPair;
    use sentinel_types::{AuthError, SecurityError};

    #[tokio::test]
    async fn test_contradictory_claims_flag_byzantine() {
        let harness = Harness::with_agents(5).await;

        let first = harness.signed_request(1, "req-dup", r#"{"statement":"the sky is blue"}"#);
        harness
            .service
            .process_verification_request(first)
            .await
            .expect("first claim passes");

        // Same request id, contradictory content
        let second = harness.signed_request(1, "req-dup", r#"{"statement":"the sky is green"}"#);
        let err = harness
            .service
            .process_verification_request(second)
            .await
            .expect_err("contradiction must be flagged");

        match err {
            SecurityError::Byzantine { score, reasons } => {
                assert!(score >= 50);
                assert!(
                    reasons.iter().any(|r| r.contains("contradiction")),
                    "reasons: {reasons:?}"
                );
            }
            other => panic!("expected byzantine rejection, got {other:?}"),
        }

        let status = harness.service.security_status();
        assert_eq!(status.metrics.byzantine_detections, 1);
        assert_eq!(status.metrics.rejected_claims, 1);

        // -20 penalty on top of the +1 success bonus from the first claim
        let identity = harness.service.auth_registry().identity("agent-1").unwrap();
        assert_eq!(identity.reputation, 80);
    }

    #[tokio::test]
    async fn test_repeated_byzantine_flags_lock_agent_out() {
        let harness = Harness::with_agents(5).await;

        // Each pair: a passing claim (+1, clamped) then its contradiction
        // (-20). Three pairs walk reputation 100, 80, 81, 61, 62, 42 -
        // below the floor of 50.
        for pair in 0..3 {
            let request_id = format!("dup-{pair}");
            let first = harness.signed_request(2, &request_id, r#"{"claim":"consistent"}"#);
            harness
                .service
                .process_verification_request(first)
                .await
                .expect("consistent claim passes");

            let second = harness.signed_request(2, &request_id, r#"{"claim":"contradicting"}"#);
            let err = harness
                .service
                .process_verification_request(second)
                .await
                .expect_err("contradiction flagged");
            assert!(matches!(err, SecurityError::Byzantine { .. }));
        }

        let identity = harness.service.auth_registry().identity("agent-2").unwrap();
        assert!(identity.reputation < 50, "reputation: {}", identity.reputation);

        // The next request never reaches the rate limiter: stage 1 rejects it
        let request = harness.signed_request(2, "req-final", r#"{"claim":"anything"}"#);
        let err = harness
            .service
            .process_verification_request(request)
            .await
            .expect_err("low-reputation agent locked out");
        assert!(matches!(
            err,
            SecurityError::Authentication(AuthError::ReputationTooLow { .. })
        ));
    }

    #[tokio::test]
    async fn test_forged_signature_is_bypass_attempt() {
        let harness = Harness::with_agents(3).await;

        let forger = KeyPair::generate();
        let mut request = harness.signed_request(0, "req-1", r#"{"claim":"forged"}"#);
        request.signature = Some(forger.sign(&request.signing_bytes()).to_vec());

        let err = harness
            .service
            .process_verification_request(request)
            .await
            .expect_err("forged signature rejected");
        assert!(matches!(err, SecurityError::Cryptographic(_)));

        // The signature stage increments bypass_attempts only; the request
        // still appears in the total.
        let metrics = harness.service.security_status().metrics;
        assert_eq!(metrics.bypass_attempts, 1);
        assert_eq!(metrics.total_requests, 1);
        assert_eq!(metrics.rejected_claims, 0);
    }

    #[tokio::test]
    async fn test_tampered_payload_fails_signature_check() {
        let harness = Harness::with_agents(3).await;

        // Signature was computed over the original payload
        let mut request = harness.signed_request(0, "req-1", r#"{"amount":10}"#);
        request.claim = sentinel_types::ClaimEnvelope::json(r#"{"amount":10000}"#);

        let err = harness
            .service
            .process_verification_request(request)
            .await
            .expect_err("payload tamper rejected");
        assert!(matches!(err, SecurityError::Cryptographic(_)));
    }

    #[tokio::test]
    async fn test_revoked_agent_cannot_submit() {
        let harness = Harness::with_agents(3).await;
        harness
            .service
            .revoke_agent("agent-1", "key compromise")
            .await
            .unwrap();

        let request = harness.signed_request(1, "req-1", r#"{"claim":"anything"}"#);
        let err = harness
            .service
            .process_verification_request(request)
            .await
            .expect_err("revoked agent rejected");
        assert!(matches!(
            err,
            SecurityError::Authentication(AuthError::Revoked(_))
        ));

        // Revocation also dents system health: the node is marked dead
        let health = harness.service.system_health();
        assert_eq!(health.byzantine_nodes, 1);
        assert_eq!(health.alive_nodes, 2);
    }

    #[tokio::test]
    async fn test_unknown_agent_counted_as_bypass() {
        let harness = Harness::with_agents(3).await;

        let ghost_key = KeyPair::generate();
        let mut request = harness.signed_request(0, "req-1", r#"{"claim":"ghost"}"#);
        request.agent_id = "ghost".to_string();
        request.signature = Some(ghost_key.sign(&request.signing_bytes()).to_vec());

        let err = harness
            .service
            .process_verification_request(request)
            .await
            .expect_err("unknown agent rejected");
        assert!(matches!(
            err,
            SecurityError::Authentication(AuthError::UnknownAgent(_))
        ));

        let metrics = harness.service.security_status().metrics;
        assert_eq!(metrics.bypass_attempts, 1);
        assert_eq!(metrics.rejected_claims, 1);
    }
}

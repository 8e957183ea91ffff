//! End-to-end pipeline scenarios: the happy path, rate limiting under load,
//! registration invariants, and emergency shutdown.

#[cfg(test)]
mod tests {
    use crate::integration::Harness;
    use sentinel_bus::{EventFilter, SecurityEvent, SecurityTopic};
    use sentinel_types::{AuthError, RateWindow, SecurityError};

    #[tokio::test]
    async fn test_valid_signed_claim_full_pipeline() {
        let harness = Harness::with_agents(5).await;

        let request = harness.signed_request(0, "req-1", r#"{"statement":"the sky is blue"}"#);
        let result = harness
            .service
            .process_verification_request(request)
            .await
            .expect("pipeline accepts a valid signed claim");

        assert!(result.verified);
        assert!((result.confidence - 1.0).abs() < f64::EPSILON);
        assert_eq!(result.agent_id, "agent-0");
        assert_eq!(result.signature.len(), 64);
        assert!(harness.service.verify_result_signature(&result));
        assert_eq!(result.audit_trail.len(), 1);

        let metrics = harness.service.security_status().metrics;
        assert_eq!(metrics.total_requests, 1);
        assert_eq!(metrics.verified_claims, 1);
        assert_eq!(metrics.rejected_claims, 0);
    }

    #[tokio::test]
    async fn test_lifecycle_events_reach_subscribers() {
        // Subscribe before driving the pipeline so nothing is missed
        let harness = Harness::with_agents(3).await;
        let mut verifications = harness
            .bus
            .subscribe(EventFilter::topics(vec![SecurityTopic::Verification]));
        let mut lifecycle = harness
            .bus
            .subscribe(EventFilter::topics(vec![SecurityTopic::Lifecycle]));

        let request = harness.signed_request(0, "req-1", r#"{"claim":"water is wet"}"#);
        harness
            .service
            .process_verification_request(request)
            .await
            .unwrap();

        let event = verifications.recv().await.expect("bus open");
        match event {
            SecurityEvent::VerificationCompleted { result } => {
                assert_eq!(result.request_id, "req-1");
            }
            other => panic!("unexpected event: {other:?}"),
        }

        harness.service.emergency_shutdown("drill").await.unwrap();
        let event = lifecycle.recv().await.expect("bus open");
        assert!(matches!(event, SecurityEvent::EmergencyShutdown { .. }));
    }

    #[tokio::test]
    async fn test_flood_beyond_per_second_limit_rejected() {
        let harness = Harness::with_agents(3).await;

        // Default production limit is 10/s. 21 back-to-back submissions span
        // at most two wall-clock seconds, so at least one must be rejected,
        // and never before the 11th.
        let mut first_rejection = None;
        for i in 0..21 {
            let request = harness.signed_request(0, &format!("req-{i}"), r#"{"n":1}"#);
            if let Err(err) = harness.service.process_verification_request(request).await {
                first_rejection = Some((i, err));
                break;
            }
        }

        let (index, err) = first_rejection.expect("per-second limit must trip");
        assert!(index >= 10, "rejected too early, at request {index}");
        match err {
            SecurityError::RateLimit {
                window,
                retry_after_secs,
            } => {
                assert_eq!(window, RateWindow::Second);
                assert!(retry_after_secs > 0);
            }
            other => panic!("expected rate limit rejection, got {other:?}"),
        }

        let metrics = harness.service.security_status().metrics;
        assert_eq!(metrics.verified_claims, index as u64);
        assert_eq!(metrics.rejected_claims, 1);
    }

    #[tokio::test]
    async fn test_duplicate_registration_leaves_identity_alone() {
        let harness = Harness::with_agents(3).await;

        harness
            .service
            .auth_registry()
            .update_reputation("agent-0", -10, "test setup")
            .unwrap();

        let err = harness
            .service
            .register_agent(
                "agent-0",
                Default::default(),
                sentinel_types::SecurityLevel::Critical,
            )
            .await
            .expect_err("duplicate id");
        assert!(matches!(
            err,
            SecurityError::Authentication(AuthError::AlreadyRegistered(_))
        ));

        let identity = harness.service.auth_registry().identity("agent-0").unwrap();
        assert_eq!(identity.reputation, 90);
        assert_eq!(identity.security_level, sentinel_types::SecurityLevel::Medium);
    }

    #[tokio::test]
    async fn test_shutdown_then_request_is_system_shutdown() {
        let harness = Harness::with_agents(3).await;
        harness.service.emergency_shutdown("test").await.unwrap();

        let request = harness.signed_request(0, "req-after", r#"{"n":1}"#);
        let err = harness
            .service
            .process_verification_request(request)
            .await
            .expect_err("post-shutdown request");
        match err {
            SecurityError::SystemShutdown(reason) => assert_eq!(reason, "test"),
            other => panic!("expected shutdown rejection, got {other:?}"),
        }

        let status = harness.service.security_status();
        assert!(!status.accepting_requests);
        assert!(status.initialized);
    }

    #[tokio::test]
    async fn test_success_keeps_reputation_at_ceiling() {
        let harness = Harness::with_agents(3).await;

        let request = harness.signed_request(0, "req-1", r#"{"n":1}"#);
        harness
            .service
            .process_verification_request(request)
            .await
            .unwrap();

        // +1 bonus clamps at 100
        let identity = harness.service.auth_registry().identity("agent-0").unwrap();
        assert_eq!(identity.reputation, 100);
    }

    #[tokio::test]
    async fn test_unsigned_request_passes_without_signature_stage() {
        let harness = Harness::with_agents(3).await;

        let mut request = harness.signed_request(0, "req-1", r#"{"n":1}"#);
        request.signature = None;
        let result = harness
            .service
            .process_verification_request(request)
            .await
            .expect("signature stage only runs when a signature is present");
        assert!(result.verified);
    }
}

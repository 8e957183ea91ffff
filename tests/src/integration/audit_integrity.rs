//! Tamper-evidence of the audit trail as seen through the full service:
//! every attempt is recorded, exports verify, and any single-field mutation
//! is caught.

#[cfg(test)]
mod tests {
    use crate::integration::Harness;
    use sentinel_core::{verify_entries, AuditQuery, ExportFormat};
    use sentinel_crypto::KeyPair;
    use sentinel_types::AuditAction;

    async fn harness_with_activity() -> Harness {
        let harness = Harness::with_agents(3).await;

        // One success
        let request = harness.signed_request(0, "req-ok", r#"{"claim":"fine"}"#);
        harness
            .service
            .process_verification_request(request)
            .await
            .unwrap();

        // One forged signature
        let forger = KeyPair::generate();
        let mut request = harness.signed_request(1, "req-forged", r#"{"claim":"forged"}"#);
        request.signature = Some(forger.sign(&request.signing_bytes()).to_vec());
        let _ = harness.service.process_verification_request(request).await;

        // One unknown agent
        let mut request = harness.signed_request(0, "req-ghost", r#"{"claim":"ghost"}"#);
        request.agent_id = "ghost".to_string();
        let _ = harness.service.process_verification_request(request).await;

        harness
    }

    #[tokio::test]
    async fn test_attempts_are_audited_not_only_successes() {
        let harness = harness_with_activity().await;
        let trail = harness.service.audit_trail();

        assert_eq!(
            trail
                .search(&AuditQuery {
                    action: Some(AuditAction::VerificationCompleted),
                    ..AuditQuery::default()
                })
                .len(),
            1
        );
        assert_eq!(
            trail
                .search(&AuditQuery {
                    action: Some(AuditAction::InvalidSignature),
                    ..AuditQuery::default()
                })
                .len(),
            1
        );
        // The unknown agent's rejection is recorded under its claimed id
        assert_eq!(trail.agent_history("ghost", 10).len(), 1);
    }

    #[tokio::test]
    async fn test_full_trail_verifies_after_mixed_activity() {
        let harness = harness_with_activity().await;
        let verification = harness.service.audit_trail().verify_trail();
        assert!(verification.valid);
        assert!(verification.corrupted.is_empty());
        // 3 registrations, initialization, completion, forged sig, ghost
        assert_eq!(verification.total_entries, 7);
    }

    #[tokio::test]
    async fn test_any_single_field_mutation_is_reported() {
        let harness = harness_with_activity().await;
        let trail = harness.service.audit_trail();
        let baseline = trail.recent(trail.len());

        for index in 0..baseline.len() {
            // Mutate one field of one entry per pass
            let mut details = baseline.clone();
            details[index].details.push('x');
            let verification = verify_entries(&details);
            assert!(
                verification.corrupted.contains(&baseline[index].event_id),
                "details mutation of entry {index} not reported"
            );

            let mut agent = baseline.clone();
            agent[index].agent_id = "intruder".to_string();
            assert!(verify_entries(&agent)
                .corrupted
                .contains(&baseline[index].event_id));

            let mut timestamp = baseline.clone();
            timestamp[index].timestamp_ms ^= 1;
            assert!(verify_entries(&timestamp)
                .corrupted
                .contains(&baseline[index].event_id));
        }
    }

    #[tokio::test]
    async fn test_reordering_entries_breaks_the_chain() {
        let harness = harness_with_activity().await;
        let trail = harness.service.audit_trail();
        let mut entries = trail.recent(trail.len());

        entries.swap(2, 3);
        assert!(!verify_entries(&entries).valid);
    }

    #[tokio::test]
    async fn test_exports_are_consistent_with_the_trail() {
        let harness = harness_with_activity().await;
        let trail = harness.service.audit_trail();

        let json = trail.export(ExportFormat::Json).unwrap();
        let parsed: Vec<sentinel_types::AuditEntry> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), trail.len());
        assert!(verify_entries(&parsed).valid);

        let csv = trail.export(ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), trail.len() + 1);
        assert_eq!(lines[0], "event_id,timestamp_ms,agent_id,action,proof");
        // CSV deliberately omits details and witness signatures
        assert!(!csv.contains("req-ok"));
    }

    #[tokio::test]
    async fn test_report_reflects_trail_state() {
        let harness = harness_with_activity().await;
        let report = harness.service.export_report().unwrap();

        assert!(report.status.audit.chain_valid);
        assert_eq!(report.status.audit.total_entries, 7);
        assert_eq!(report.audit_trail.len(), 7);
        assert_eq!(
            report.status.audit.action_counts.get("VERIFICATION_COMPLETED"),
            Some(&1)
        );
    }
}

//! Quorum and threshold-signature properties across the whole participant
//! set.

#[cfg(test)]
mod tests {
    use crate::integration::Harness;
    use sentinel_core::ThresholdSigner;
    use sentinel_types::AgentId;

    #[tokio::test]
    async fn test_consensus_over_registered_participants() {
        // 5 participants under the production config: threshold re-derived to
        // floor(10/3)+1 = 4, quorum = ceil(4 * 0.67) = 3
        let harness = Harness::with_agents(5).await;

        let votes: Vec<(AgentId, bool)> = vec![
            ("agent-0".into(), true),
            ("agent-1".into(), true),
            ("agent-2".into(), false),
        ];
        let outcome = harness.service.achieve_consensus("prop-1", &votes);
        assert!(outcome.consensus);
        assert_eq!(outcome.result, Some(true));
        assert_eq!(outcome.participating.len(), 3);
    }

    #[tokio::test]
    async fn test_below_quorum_fails_for_any_vote_distribution() {
        let harness = Harness::with_agents(5).await;

        // Two votes < quorum of 3, whatever the distribution
        for pattern in [[true, true], [true, false], [false, false]] {
            let votes: Vec<(AgentId, bool)> = pattern
                .iter()
                .enumerate()
                .map(|(i, vote)| (format!("agent-{i}"), *vote))
                .collect();
            let outcome = harness.service.achieve_consensus("prop", &votes);
            assert!(!outcome.consensus, "pattern {pattern:?}");
            assert_eq!(outcome.result, None);
        }
    }

    #[tokio::test]
    async fn test_revoked_participant_excluded_from_consensus() {
        let harness = Harness::with_agents(5).await;
        harness
            .service
            .revoke_agent("agent-4", "equivocation")
            .await
            .unwrap();

        let votes: Vec<(AgentId, bool)> = (0..5)
            .map(|i| (format!("agent-{i}"), i != 4))
            .collect();
        let outcome = harness.service.achieve_consensus("prop", &votes);

        assert!(outcome.consensus);
        assert_eq!(outcome.result, Some(true));
        assert_eq!(outcome.participating.len(), 4);
        assert_eq!(outcome.byzantine, vec!["agent-4".to_string()]);
    }

    #[test]
    fn test_threshold_signature_round_trip_over_any_quorum() {
        let participants: Vec<AgentId> = (0..5).map(|i| format!("node-{i}")).collect();
        let signer = ThresholdSigner::new(5, 4).unwrap();
        signer.generate_keys(&participants).unwrap();

        let message = b"consensus payload";
        // Every 4-subset of 5 participants produces a verifying signature
        for skip in 0..5 {
            let quorum: Vec<AgentId> = participants
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != skip)
                .map(|(_, id)| id.clone())
                .collect();
            let signature = signer.create_threshold_signature(message, &quorum).unwrap();
            assert!(signer.verify(message, &signature.to_vec()), "skip {skip}");
        }
    }

    #[test]
    fn test_any_flipped_bit_invalidates_the_signature() {
        let participants: Vec<AgentId> = (0..5).map(|i| format!("node-{i}")).collect();
        let signer = ThresholdSigner::new(5, 4).unwrap();
        signer.generate_keys(&participants).unwrap();

        let message = b"tamper target";
        let signature = signer
            .create_threshold_signature(message, &participants)
            .unwrap()
            .to_vec();

        for byte in 0..signature.len() {
            let mut tampered = signature.clone();
            tampered[byte] ^= 0x01;
            assert!(
                !signer.verify(message, &tampered),
                "flip in byte {byte} accepted"
            );
        }
    }

    #[tokio::test]
    async fn test_result_signatures_bind_to_their_result() {
        let harness = Harness::with_agents(5).await;

        let request = harness.signed_request(0, "req-1", r#"{"claim":"binding"}"#);
        let mut result = harness
            .service
            .process_verification_request(request)
            .await
            .unwrap();
        assert!(harness.service.verify_result_signature(&result));

        // Any change to the signed fields invalidates the quorum signature
        result.verified = !result.verified;
        assert!(!harness.service.verify_result_signature(&result));
    }
}

//! Pipeline outcome counters.
//!
//! Lock-free: every counter is an `AtomicU64` bumped at the pipeline stage
//! that owns the outcome. Relaxed ordering is sufficient; the counters feed
//! reporting, not control flow.

use sentinel_types::now_millis;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counters for the enforcement pipeline.
#[derive(Debug)]
pub struct SecurityMetrics {
    started_at_ms: u64,
    total_requests: AtomicU64,
    verified: AtomicU64,
    rejected: AtomicU64,
    byzantine_flags: AtomicU64,
    bypass_attempts: AtomicU64,
    response_time_total_ms: AtomicU64,
    response_time_samples: AtomicU64,
}

impl Default for SecurityMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SecurityMetrics {
    /// Fresh counters, uptime starting now.
    pub fn new() -> Self {
        Self {
            started_at_ms: now_millis(),
            total_requests: AtomicU64::new(0),
            verified: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            byzantine_flags: AtomicU64::new(0),
            bypass_attempts: AtomicU64::new(0),
            response_time_total_ms: AtomicU64::new(0),
            response_time_samples: AtomicU64::new(0),
        }
    }

    /// A request entered the pipeline. Counted independently of the outcome
    /// counters: a signature rejection bumps only `bypass_attempts`, yet the
    /// request still shows up in the total.
    pub fn record_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// A request passed the full pipeline.
    pub fn record_verified(&self) {
        self.verified.fetch_add(1, Ordering::Relaxed);
    }

    /// A request was rejected at any stage.
    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// The Byzantine screen flagged a request.
    pub fn record_byzantine(&self) {
        self.byzantine_flags.fetch_add(1, Ordering::Relaxed);
    }

    /// A request tried to skip authentication or forge a signature.
    pub fn record_bypass_attempt(&self) {
        self.bypass_attempts.fetch_add(1, Ordering::Relaxed);
    }

    /// Fold one request's wall-clock duration into the running mean.
    pub fn record_response_time(&self, elapsed_ms: u64) {
        self.response_time_total_ms
            .fetch_add(elapsed_ms, Ordering::Relaxed);
        self.response_time_samples.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let samples = self.response_time_samples.load(Ordering::Relaxed);
        let total_ms = self.response_time_total_ms.load(Ordering::Relaxed);
        MetricsSnapshot {
            verified_claims: self.verified.load(Ordering::Relaxed),
            rejected_claims: self.rejected.load(Ordering::Relaxed),
            total_requests: self.total_requests.load(Ordering::Relaxed),
            byzantine_detections: self.byzantine_flags.load(Ordering::Relaxed),
            bypass_attempts: self.bypass_attempts.load(Ordering::Relaxed),
            average_response_ms: if samples == 0 {
                0.0
            } else {
                total_ms as f64 / samples as f64
            },
            uptime_ms: now_millis().saturating_sub(self.started_at_ms),
        }
    }
}

/// Serializable counter snapshot for status reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Requests that passed the full pipeline.
    pub verified_claims: u64,
    /// Requests rejected at any stage.
    pub rejected_claims: u64,
    /// Every request that entered the pipeline, whatever the outcome.
    pub total_requests: u64,
    /// Byzantine-screen flags.
    pub byzantine_detections: u64,
    /// Authentication or signature bypass attempts.
    pub bypass_attempts: u64,
    /// Running mean request duration in milliseconds.
    pub average_response_ms: f64,
    /// Milliseconds since the metrics were created.
    pub uptime_ms: u64,
}

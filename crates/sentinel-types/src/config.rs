//! # Security Configuration
//!
//! Tunables for the enforcement pipeline with three presets (development,
//! production, high-security). Thresholds and detection weights are
//! configurable constants rather than hard invariants; defaults preserve the
//! established values.

use crate::errors::SecurityError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A fixed rate-limiting time bucket.
///
/// Windows are always evaluated in increasing granularity order
/// (second first, day last).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RateWindow {
    /// One-second bucket.
    Second,
    /// One-minute bucket.
    Minute,
    /// One-hour bucket.
    Hour,
    /// One-day bucket.
    Day,
}

impl RateWindow {
    /// All windows in check order (finest first).
    pub const ALL: [RateWindow; 4] = [Self::Second, Self::Minute, Self::Hour, Self::Day];

    /// Window span in milliseconds.
    pub fn span_ms(&self) -> u64 {
        match self {
            Self::Second => 1_000,
            Self::Minute => 60_000,
            Self::Hour => 3_600_000,
            Self::Day => 86_400_000,
        }
    }

    /// Stable name used in rejection reasons and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Second => "perSecond",
            Self::Minute => "perMinute",
            Self::Hour => "perHour",
            Self::Day => "perDay",
        }
    }
}

impl fmt::Display for RateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-window request ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimits {
    /// Requests allowed per second.
    pub per_second: u32,
    /// Requests allowed per minute.
    pub per_minute: u32,
    /// Requests allowed per hour.
    pub per_hour: u32,
    /// Requests allowed per day.
    pub per_day: u32,
}

impl RateLimits {
    /// Limit for one window.
    pub fn limit(&self, window: RateWindow) -> u32 {
        match window {
            RateWindow::Second => self.per_second,
            RateWindow::Minute => self.per_minute,
            RateWindow::Hour => self.per_hour,
            RateWindow::Day => self.per_day,
        }
    }

    /// Loose limits for local development.
    pub fn loose() -> Self {
        Self {
            per_second: 100,
            per_minute: 1_000,
            per_hour: 10_000,
            per_day: 100_000,
        }
    }

    /// Strict limits for high-security deployments.
    pub fn strict() -> Self {
        Self {
            per_second: 5,
            per_minute: 50,
            per_hour: 500,
            per_day: 5_000,
        }
    }
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            per_second: 10,
            per_minute: 100,
            per_hour: 1_000,
            per_day: 10_000,
        }
    }
}

/// Reputation thresholds feeding authentication and exclusion decisions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReputationConfig {
    /// Minimum reputation required to authenticate.
    pub min_authenticate: u8,
    /// Reputation gained on a successful verification.
    pub success_bonus: u8,
    /// Reputation lost on a Byzantine flag.
    pub byzantine_penalty: u8,
}

impl Default for ReputationConfig {
    fn default() -> Self {
        Self {
            min_authenticate: 50,
            success_bonus: 1,
            byzantine_penalty: 20,
        }
    }
}

/// Byzantine-detection heuristic weights and thresholds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Weight for contradictory messages.
    pub contradiction_weight: u32,
    /// Weight for suspiciously regular timing.
    pub timing_weight: u32,
    /// Weight for message flooding.
    pub spam_weight: u32,
    /// Weight for cross-node collusion patterns.
    pub collusion_weight: u32,
    /// Composite score at which a node is flagged Byzantine.
    pub flag_threshold: u32,
    /// Suspicion level at which a node is excluded from consensus.
    pub suspicion_exclusion: u32,
    /// Inter-message variance floor (ms^2) below which cadence is automated.
    pub timing_variance_floor: f64,
    /// Messages within the spam window that count as flooding.
    pub spam_max_messages: usize,
    /// Trailing spam window in seconds.
    pub spam_window_secs: u64,
    /// Token-wise similarity above which two nodes are colluding.
    pub collusion_similarity: f64,
    /// Bounded per-node message history length.
    pub history_limit: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            contradiction_weight: 30,
            timing_weight: 25,
            spam_weight: 20,
            collusion_weight: 40,
            flag_threshold: 50,
            suspicion_exclusion: 50,
            timing_variance_floor: 100.0,
            spam_max_messages: 50,
            spam_window_secs: 60,
            collusion_similarity: 0.8,
            history_limit: 100,
        }
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Number of threshold-signing / consensus participants.
    pub total_nodes: usize,
    /// Quorum size (`t` of `n`). Must satisfy `1 <= t <= n`.
    pub threshold: usize,
    /// Default per-agent request ceilings.
    pub rate_limits: RateLimits,
    /// Reputation tunables.
    pub reputation: ReputationConfig,
    /// Byzantine-detection tunables.
    pub detection: DetectionConfig,
    /// Auth token lifetime in seconds.
    pub token_ttl_secs: u64,
}

impl SecurityConfig {
    /// The canonical consensus threshold for `n` participants:
    /// `floor(2n/3) + 1`.
    pub fn consensus_threshold(total_nodes: usize) -> usize {
        (2 * total_nodes) / 3 + 1
    }

    /// Development preset: 3 nodes, quorum of 2, loose limits.
    pub fn development() -> Self {
        Self {
            total_nodes: 3,
            threshold: 2,
            rate_limits: RateLimits::loose(),
            reputation: ReputationConfig::default(),
            detection: DetectionConfig::default(),
            token_ttl_secs: 3_600,
        }
    }

    /// Production preset: 7 nodes, quorum of 5, moderate limits.
    pub fn production() -> Self {
        Self {
            total_nodes: 7,
            threshold: 5,
            rate_limits: RateLimits::default(),
            reputation: ReputationConfig::default(),
            detection: DetectionConfig::default(),
            token_ttl_secs: 3_600,
        }
    }

    /// High-security preset: 9 nodes, quorum of 7, strict limits.
    pub fn high_security() -> Self {
        Self {
            total_nodes: 9,
            threshold: 7,
            rate_limits: RateLimits::strict(),
            reputation: ReputationConfig::default(),
            detection: DetectionConfig::default(),
            token_ttl_secs: 3_600,
        }
    }

    /// Validates the threshold invariant `1 <= t <= n`.
    ///
    /// Violating this at configuration time is a fatal construction error.
    pub fn validate(&self) -> Result<(), SecurityError> {
        if self.total_nodes == 0 {
            return Err(SecurityError::Config(
                "total_nodes must be at least 1".to_string(),
            ));
        }
        if self.threshold == 0 || self.threshold > self.total_nodes {
            return Err(SecurityError::Config(format!(
                "threshold {} outside 1..={}",
                self.threshold, self.total_nodes
            )));
        }
        Ok(())
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self::production()
    }
}

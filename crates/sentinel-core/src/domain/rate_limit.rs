//! # Multi-Window Rate Limiter
//!
//! Four independent lazily-reset counters per agent (second, minute, hour,
//! day). Not a true sliding window: each counter resets wholesale once its
//! window elapses, trading boundary-burst precision for O(1) memory and O(1)
//! checks per request.
//!
//! Windows are evaluated in strictly increasing granularity (second first)
//! and a check short-circuits at the first violated window; coarser windows
//! are not incremented once the request is rejected.

use parking_lot::RwLock;
use sentinel_types::{now_millis, AgentId, RateLimits, RateWindow};
use std::collections::HashMap;
use tracing::warn;

/// A rejected rate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateViolation {
    /// The first window whose limit was exceeded.
    pub window: RateWindow,
    /// Whole seconds until the violated window resets (always >= 1).
    pub retry_after_secs: u64,
}

#[derive(Debug, Clone, Copy, Default)]
struct WindowCounter {
    count: u32,
    reset_at_ms: u64,
    violations: u64,
}

#[derive(Debug, Clone)]
struct AgentRecord {
    limits: RateLimits,
    windows: [WindowCounter; 4],
}

impl AgentRecord {
    fn new(limits: RateLimits) -> Self {
        Self {
            limits,
            windows: [WindowCounter::default(); 4],
        }
    }
}

/// Per-agent request counters with per-agent limit overrides.
pub struct RateLimiter {
    default_limits: RateLimits,
    records: RwLock<HashMap<AgentId, AgentRecord>>,
}

impl RateLimiter {
    /// Create a limiter with the given default limits.
    pub fn new(default_limits: RateLimits) -> Self {
        Self {
            default_limits,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Override the window limits for one agent. Existing counters are kept;
    /// only the ceilings change.
    pub fn set_agent_limits(&self, agent_id: &str, limits: RateLimits) {
        let mut records = self.records.write();
        records
            .entry(agent_id.to_string())
            .or_insert_with(|| AgentRecord::new(limits))
            .limits = limits;
    }

    /// Record one request for `agent_id` and check it against every window.
    pub fn check(&self, agent_id: &str) -> Result<(), RateViolation> {
        self.check_at(agent_id, now_millis())
    }

    /// Clock-injectable variant of [`check`](Self::check) for deterministic
    /// tests.
    pub fn check_at(&self, agent_id: &str, now_ms: u64) -> Result<(), RateViolation> {
        let mut records = self.records.write();
        let record = records
            .entry(agent_id.to_string())
            .or_insert_with(|| AgentRecord::new(self.default_limits));

        for (slot, window) in RateWindow::ALL.iter().enumerate() {
            let limit = record.limits.limit(*window);
            let counter = &mut record.windows[slot];

            if now_ms >= counter.reset_at_ms {
                counter.count = 1;
                counter.reset_at_ms = now_ms + window.span_ms();
            } else {
                counter.count += 1;
            }

            if counter.count > limit {
                counter.violations += 1;
                let retry_after_secs = (counter.reset_at_ms - now_ms).div_ceil(1_000).max(1);
                warn!(
                    agent_id,
                    window = %window,
                    count = counter.count,
                    limit,
                    retry_after_secs,
                    "rate limit exceeded"
                );
                return Err(RateViolation {
                    window: *window,
                    retry_after_secs,
                });
            }
        }
        Ok(())
    }

    /// Violation counts per agent and window, for reporting. Violation
    /// counters accumulate independently of request counters and survive
    /// window resets.
    pub fn violation_report(&self) -> HashMap<AgentId, [(RateWindow, u64); 4]> {
        let records = self.records.read();
        records
            .iter()
            .map(|(agent, record)| {
                let mut row = [(RateWindow::Second, 0u64); 4];
                for (slot, window) in RateWindow::ALL.iter().enumerate() {
                    row[slot] = (*window, record.windows[slot].violations);
                }
                (agent.clone(), row)
            })
            .collect()
    }

    /// Total violations across all agents and windows.
    pub fn total_violations(&self) -> u64 {
        let records = self.records.read();
        records
            .values()
            .map(|r| r.windows.iter().map(|w| w.violations).sum::<u64>())
            .sum()
    }
}

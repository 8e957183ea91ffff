//! # Error Taxonomy
//!
//! Typed rejections for every pipeline stage. The recoverability contract per
//! variant:
//!
//! | Kind | Trigger | Recoverable? |
//! |------|---------|--------------|
//! | `Authentication` | unknown agent, bad challenge, low reputation | caller re-authenticates |
//! | `RateLimit` | window exceeded | after `retry_after_secs` |
//! | `Byzantine` | detection score over threshold | not within the session |
//! | `Cryptographic` | signature/decrypt mismatch | never retried silently |
//! | `Config` | invalid threshold or participant count | fatal at construction |
//! | `SystemShutdown` | request after emergency shutdown | operator restart only |

use crate::config::RateWindow;
use crate::entities::AgentId;
use thiserror::Error;

/// Authentication-stage failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The agent id is already present in the registry.
    #[error("agent already registered: {0}")]
    AlreadyRegistered(AgentId),

    /// No identity exists for the agent id.
    #[error("unknown agent: {0}")]
    UnknownAgent(AgentId),

    /// The identity was revoked.
    #[error("agent revoked: {0}")]
    Revoked(AgentId),

    /// Reputation below the authentication floor.
    #[error("reputation too low: {actual} < {required}")]
    ReputationTooLow {
        /// Current reputation.
        actual: u8,
        /// Minimum required to authenticate.
        required: u8,
    },

    /// The challenge signature did not verify against the agent's key.
    #[error("invalid challenge signature")]
    InvalidChallenge,

    /// The token is expired, unknown, or malformed.
    #[error("invalid or expired auth token")]
    InvalidToken,

    /// The token lacks a required permission.
    #[error("token missing permission: {0}")]
    MissingPermission(String),
}

/// Top-level error for the enforcement pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SecurityError {
    /// Stage 1 rejection.
    #[error("authentication failed: {0}")]
    Authentication(#[from] AuthError),

    /// Stage 2 rejection. Recoverable after `retry_after_secs`.
    #[error("rate limit exceeded for {window} window, retry after {retry_after_secs}s")]
    RateLimit {
        /// The first window whose limit was exceeded.
        window: RateWindow,
        /// Caller-driven retry hint in seconds (always > 0).
        retry_after_secs: u64,
    },

    /// Stage 3 rejection.
    #[error("byzantine behavior detected (score {score}): {}", reasons.join("; "))]
    Byzantine {
        /// Composite detection score.
        score: u32,
        /// Which heuristics fired.
        reasons: Vec<String>,
    },

    /// Stage 4 rejection, or any crypto-primitive mismatch.
    #[error("cryptographic check failed: {0}")]
    Cryptographic(String),

    /// Threshold-signing stage failure.
    #[error("threshold signing failed: {0}")]
    Threshold(String),

    /// External truth verification failed to produce an assessment.
    #[error("truth verification failed: {0}")]
    Verification(String),

    /// Invalid configuration at construction or `initialize`.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Request received after emergency shutdown.
    #[error("system shut down: {0}")]
    SystemShutdown(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_converts() {
        let err: SecurityError = AuthError::UnknownAgent("ghost".into()).into();
        assert!(matches!(
            err,
            SecurityError::Authentication(AuthError::UnknownAgent(_))
        ));
    }

    #[test]
    fn test_rate_limit_display_names_window() {
        let err = SecurityError::RateLimit {
            window: RateWindow::Second,
            retry_after_secs: 1,
        };
        assert!(err.to_string().contains("perSecond"));
    }

    #[test]
    fn test_byzantine_display_joins_reasons() {
        let err = SecurityError::Byzantine {
            score: 55,
            reasons: vec!["contradiction".into(), "spam".into()],
        };
        let text = err.to_string();
        assert!(text.contains("contradiction"));
        assert!(text.contains("spam"));
    }
}

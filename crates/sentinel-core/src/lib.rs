//! # sentinel-core
//!
//! Security enforcement pipeline for truth-verification requests.
//!
//! ## Architecture
//!
//! Every claim an autonomous agent submits passes one strictly ordered
//! pipeline, and any stage may short-circuit with a typed rejection:
//!
//! ```text
//! request ─→ authenticate ─→ rate-limit ─→ byzantine screen ─→ signature
//!        ─→ truth verification (external) ─→ threshold-sign ─→ audit
//!        ─→ metrics ─→ response
//! ```
//!
//! The [`EnforcementService`] owns one registry per concern (identities, rate
//! counters, node states, audit log, metrics), each behind its own lock, so a
//! rate-limit check for agent A never blocks an audit write for agent B.
//! Rejections are audited before the error propagates: the audit trail is the
//! system of record for attempts as well as successes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sentinel_core::{EnforcementService, StubTruthVerifier};
//! use sentinel_bus::InMemoryEventBus;
//! use sentinel_types::SecurityConfig;
//! use std::sync::Arc;
//!
//! let bus = Arc::new(InMemoryEventBus::new());
//! let service = EnforcementService::new(
//!     SecurityConfig::production(),
//!     StubTruthVerifier,
//!     bus,
//! )?;
//!
//! service.initialize(&participant_ids).await?;
//! let result = service.process_verification_request(request).await?;
//! ```

pub mod domain;
pub mod metrics;
pub mod ports;
pub mod report;
pub mod service;

// Re-export main types
pub use domain::audit::{verify_entries, AuditQuery, AuditTrail, ExportFormat, TrailVerification};
pub use domain::auth::AuthRegistry;
pub use domain::byzantine::{
    ByzantineRegistry, ConsensusOutcome, Detection, NodeMessage, SystemHealth,
};
pub use domain::rate_limit::{RateLimiter, RateViolation};
pub use domain::threshold::{PartialSignature, ThresholdSigner};
pub use metrics::{MetricsSnapshot, SecurityMetrics};
pub use ports::inbound::SecurityApi;
pub use ports::outbound::{StubTruthVerifier, TruthVerifier};
pub use report::{AuditSummary, SecurityReport, SecurityStatus, ThreatEntry};
pub use service::EnforcementService;

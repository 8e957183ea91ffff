//! # Sentinel Types
//!
//! Shared domain entities for the Agent Sentinel security pipeline.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every type that crosses a crate boundary
//!   (identities, requests, results, audit entries, configuration) is defined
//!   here.
//! - **Canonical Payloads**: opaque claim payloads are carried in a
//!   schema-versioned [`ClaimEnvelope`] with a deterministic byte encoding, so
//!   hashing and signing are reproducible across processes.
//! - **Typed Rejections**: every way the pipeline can reject a request is a
//!   variant of [`SecurityError`]; string-typed errors never cross the API.

pub mod config;
pub mod entities;
pub mod envelope;
pub mod errors;

pub use config::{DetectionConfig, RateLimits, RateWindow, ReputationConfig, SecurityConfig};
pub use entities::{
    now_millis, AgentId, AgentIdentity, AuditAction, AuditEntry, SecurityLevel, TruthAssessment,
    VerificationRequest, VerificationResult,
};
pub use envelope::ClaimEnvelope;
pub use errors::{AuthError, SecurityError};

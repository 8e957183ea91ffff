//! # Claim Envelope
//!
//! Schema-versioned wrapper for opaque claim payloads.
//!
//! Truth claims arrive from heterogeneous agents and are treated as opaque by
//! the security pipeline, but hashing and signing require a canonical,
//! reproducible serialization. The envelope fixes that encoding: big-endian
//! schema version followed by length-prefixed content type and payload.

use serde::{Deserialize, Serialize};

/// Current envelope schema version.
pub const ENVELOPE_VERSION: u16 = 1;

/// An opaque truth-claim payload with enough framing to hash and sign it
/// deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimEnvelope {
    /// Envelope schema version.
    pub schema_version: u16,
    /// MIME-style content type of the payload.
    pub content_type: String,
    /// The claim payload itself. Never interpreted by the pipeline.
    pub payload: String,
}

impl ClaimEnvelope {
    /// Wrap a JSON payload under the current schema version.
    pub fn json(payload: impl Into<String>) -> Self {
        Self {
            schema_version: ENVELOPE_VERSION,
            content_type: "application/json".to_string(),
            payload: payload.into(),
        }
    }

    /// Wrap a plain-text payload under the current schema version.
    pub fn text(payload: impl Into<String>) -> Self {
        Self {
            schema_version: ENVELOPE_VERSION,
            content_type: "text/plain".to_string(),
            payload: payload.into(),
        }
    }

    /// Canonical byte encoding used for hashing and signing.
    ///
    /// Layout: `version_be16 || len_be32(content_type) || content_type ||
    /// len_be32(payload) || payload`. Length prefixes prevent ambiguity
    /// between field boundaries.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let ct = self.content_type.as_bytes();
        let payload = self.payload.as_bytes();
        let mut out = Vec::with_capacity(2 + 8 + ct.len() + payload.len());
        out.extend_from_slice(&self.schema_version.to_be_bytes());
        out.extend_from_slice(&(ct.len() as u32).to_be_bytes());
        out.extend_from_slice(ct);
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(payload);
        out
    }
}

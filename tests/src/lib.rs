//! # Agent Sentinel Test Suite
//!
//! Unified test crate for cross-crate scenarios the per-crate unit tests
//! cannot cover.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── pipeline.rs        # End-to-end enforcement pipeline scenarios
//!     ├── adversarial.rs     # Contradictions, forgeries, floods
//!     ├── audit_integrity.rs # Tamper detection on exported trails
//!     └── consensus.rs       # Quorum and threshold-signature properties
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p sentinel-tests
//!
//! # By category
//! cargo test -p sentinel-tests integration::pipeline
//! cargo test -p sentinel-tests integration::adversarial
//! ```

#![allow(dead_code)]

pub mod integration;

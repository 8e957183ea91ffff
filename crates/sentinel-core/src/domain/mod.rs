//! Domain layer: one module per security concern.
//!
//! Each module owns exactly one registry and exposes synchronous operations;
//! the service layer composes them into the async pipeline.

pub mod audit;
pub mod auth;
pub mod byzantine;
pub mod rate_limit;
pub mod threshold;

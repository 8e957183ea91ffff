//! # Sentinel Bus - Security Event Bus
//!
//! Typed publish/subscribe channel between the enforcement core and its
//! consumers (middleware, logging layers, dashboards). The core never imports
//! a concrete emitter; it publishes through the [`EventPublisher`] trait and
//! consumers subscribe with an [`EventFilter`].
//!
//! ```text
//! ┌──────────────────┐                     ┌──────────────┐
//! │ Enforcement core │                     │  Middleware  │
//! │                  │     publish()       │              │
//! │                  │ ──────┐             │              │
//! └──────────────────┘       │             └──────────────┘
//!                            ▼                     ↑
//!                      ┌──────────────┐            │
//!                      │  Event Bus   │ ───────────┘
//!                      └──────────────┘  subscribe()
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod bus;
pub mod events;

// Re-export main types
pub use bus::{EventPublisher, InMemoryEventBus, Subscription, SubscriptionError};
pub use events::{EventFilter, SecurityEvent, SecurityTopic};

/// Maximum events buffered per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        assert_eq!(DEFAULT_CHANNEL_CAPACITY, 1000);
    }
}

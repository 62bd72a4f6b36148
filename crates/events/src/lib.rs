//! Outreach event bus.
//!
//! - [`EventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`] -- the event envelope (project mutations, failures).
//! - [`EventPersistence`] -- background service that writes every event to
//!   the `events` table for later diagnosis.

pub mod bus;
pub mod persistence;

pub use bus::{EventBus, PlatformEvent};
pub use persistence::EventPersistence;

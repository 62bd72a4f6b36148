//! Client-side project cache and mutation coordinator.
//!
//! [`ProjectCoordinator`] caches the project list, applies create / update /
//! delete optimistically, rolls back on failure and refreshes from the store
//! once each mutation settles. The store is reached through a
//! [`ResourceStoreClient`] binding ([`RestStore`] or [`TableStore`]), and
//! outcomes are reported to an [`ObservabilitySink`].

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod sink;
pub mod store;

pub use config::{ClientConfig, ConfigError, StoreBackend};
pub use coordinator::{ProjectCoordinator, DEFAULT_STALE_TIME};
pub use error::{CoordinatorError, Operation, StoreError};
pub use sink::{
    EventBusSink, FanoutSink, ObservabilitySink, OperationReport, ReportLevel, TracingSink,
};
pub use store::{ResourceStoreClient, RestStore, TableStore};

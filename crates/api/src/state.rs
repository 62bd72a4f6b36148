use std::sync::Arc;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is an `Arc` or a pool handle.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: outreach_db::DbPool,
    /// Server configuration (JWT secret is read by the auth extractors).
    pub config: Arc<ServerConfig>,
    /// Bus for `project.*` change events.
    pub event_bus: Arc<outreach_events::EventBus>,
}

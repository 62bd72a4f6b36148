//! Bindings to the remote system of record for projects.
//!
//! The coordinator only sees [`ResourceStoreClient`]. Two bindings exist and
//! exactly one is active per deployment:
//!
//! - [`RestStore`] -- the project HTTP API (`/api/projects`).
//! - [`TableStore`] -- direct access to the Postgres `projects` table.
//!
//! Wire and column naming differences are resolved inside each binding, so
//! everything past this boundary speaks [`Project`].

use async_trait::async_trait;
use outreach_core::project::{Project, ProjectDraft, ProjectId, ProjectPatch};

use crate::error::StoreError;

pub mod rest;
pub mod table;

pub use rest::RestStore;
pub use table::TableStore;

/// CRUD access to the project store.
#[async_trait]
pub trait ResourceStoreClient: Send + Sync {
    /// All projects. Bindings ask the store for newest-first order, but
    /// callers must not rely on it.
    async fn list(&self) -> Result<Vec<Project>, StoreError>;

    /// A single project. A missing one is an error for which
    /// [`StoreError::is_not_found`] holds.
    async fn get(&self, id: &ProjectId) -> Result<Project, StoreError>;

    /// Create a project; the store assigns `id` and timestamps.
    async fn create(&self, draft: &ProjectDraft) -> Result<Project, StoreError>;

    /// Merge `patch` into the stored project and return the new record.
    async fn update(&self, id: &ProjectId, patch: &ProjectPatch) -> Result<Project, StoreError>;

    /// Delete a project. Whether a missing id is an error is up to the store.
    async fn delete(&self, id: &ProjectId) -> Result<(), StoreError>;
}

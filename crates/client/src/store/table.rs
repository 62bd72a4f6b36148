//! Direct table binding over the Postgres `projects` table.

use async_trait::async_trait;
use outreach_core::project::{Project, ProjectDraft, ProjectId, ProjectPatch};
use outreach_db::repositories::ProjectRepo;
use outreach_db::DbPool;
use uuid::Uuid;

use super::ResourceStoreClient;
use crate::error::StoreError;

/// Table-style access: `select` / `insert` / `update` / `delete` on `projects`.
///
/// Deleting a row that does not exist succeeds, matching what a plain
/// `DELETE ... WHERE id = ?` reports. Reading or updating one is `NotFound`.
#[derive(Clone)]
pub struct TableStore {
    pool: DbPool,
}

impl TableStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Table ids are UUIDs; anything else cannot match a row.
fn row_id(id: &ProjectId) -> Option<Uuid> {
    id.as_str().parse().ok()
}

#[async_trait]
impl ResourceStoreClient for TableStore {
    async fn list(&self) -> Result<Vec<Project>, StoreError> {
        Ok(ProjectRepo::list(&self.pool).await?)
    }

    async fn get(&self, id: &ProjectId) -> Result<Project, StoreError> {
        let Some(uuid) = row_id(id) else {
            return Err(StoreError::NotFound(id.clone()));
        };
        ProjectRepo::find_by_id(&self.pool, uuid)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn create(&self, draft: &ProjectDraft) -> Result<Project, StoreError> {
        Ok(ProjectRepo::create(&self.pool, draft).await?)
    }

    async fn update(&self, id: &ProjectId, patch: &ProjectPatch) -> Result<Project, StoreError> {
        let Some(uuid) = row_id(id) else {
            return Err(StoreError::NotFound(id.clone()));
        };
        ProjectRepo::update(&self.pool, uuid, patch)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn delete(&self, id: &ProjectId) -> Result<(), StoreError> {
        let Some(uuid) = row_id(id) else {
            tracing::debug!(project_id = %id, "Delete of non-table id matched nothing");
            return Ok(());
        };
        if !ProjectRepo::delete(&self.pool, uuid).await? {
            tracing::debug!(project_id = %id, "Delete matched no row");
        }
        Ok(())
    }
}

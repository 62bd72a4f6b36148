//! Repository for the `projects` table.

use outreach_core::project::{Project, ProjectDraft, ProjectPatch};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::project::ProjectRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, title, description, category, status, img_url, year, created_at, updated_at";

/// Provides CRUD operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project, returning the created row.
    pub async fn create(pool: &PgPool, input: &ProjectDraft) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (title, description, category, status, img_url, year)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.category)
            .bind(&input.status)
            .bind(&input.image_url)
            .bind(&input.year)
            .fetch_one(pool)
            .await
            .map(Project::from)
    }

    /// Find a project by its ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        let row = sqlx::query_as::<_, ProjectRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(Project::from))
    }

    /// List all projects ordered by most recently created first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects ORDER BY created_at DESC");
        let rows = sqlx::query_as::<_, ProjectRow>(&query)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(Project::from).collect())
    }

    /// Update a project. Only non-`None` fields in `input` are applied;
    /// `updated_at` is refreshed by the table trigger.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        input: &ProjectPatch,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                status = COALESCE($5, status),
                img_url = COALESCE($6, img_url),
                year = COALESCE($7, year)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProjectRow>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.category)
            .bind(&input.status)
            .bind(&input.image_url)
            .bind(&input.year)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(Project::from))
    }

    /// Delete a project by ID. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

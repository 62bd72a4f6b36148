//! Project row model.

use outreach_core::project::{Project, ProjectId};
use outreach_core::types::Timestamp;
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `projects` table.
///
/// The image column is stored as `img_url`; the domain type calls it
/// `image_url`.
#[derive(Debug, Clone, FromRow)]
pub struct ProjectRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub img_url: Option<String>,
    pub year: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Project {
            id: ProjectId::from(row.id),
            title: row.title,
            description: row.description,
            category: row.category,
            status: row.status,
            image_url: row.img_url,
            year: row.year,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

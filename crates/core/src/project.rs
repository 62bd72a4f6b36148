//! Project entity, create/update inputs, and list helpers.
//!
//! Lists of projects handed to consumers are always ordered by `created_at`
//! descending (newest first). The helpers here keep that ordering intact
//! when entries are inserted, merged, or removed locally.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Prefix carried by ids synthesized locally before the store assigns one.
pub const PROVISIONAL_ID_PREFIX: &str = "tmp-";

// ---------------------------------------------------------------------------
// ProjectId
// ---------------------------------------------------------------------------

/// Opaque project identifier assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a `tmp-<uuid>` id for an optimistically created project.
    pub fn provisional() -> Self {
        Self(format!("{PROVISIONAL_ID_PREFIX}{}", Uuid::new_v4()))
    }

    /// Whether this id was synthesized locally rather than assigned by the store.
    pub fn is_provisional(&self) -> bool {
        self.0.starts_with(PROVISIONAL_ID_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ProjectId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ProjectId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<Uuid> for ProjectId {
    fn from(value: Uuid) -> Self {
        Self(value.to_string())
    }
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

/// A project record as owned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub image_url: Option<String>,
    pub year: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Project {
    /// Build a locally visible stand-in for `draft` before the store confirms it.
    pub fn provisional(draft: &ProjectDraft, now: Timestamp) -> Self {
        Self {
            id: ProjectId::provisional(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            category: draft.category.clone(),
            status: draft.status.clone(),
            image_url: draft.image_url.clone(),
            year: draft.year.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge the non-`None` fields of `patch` into this record.
    ///
    /// `id` and `created_at` never change; `updated_at` is set to `now`.
    pub fn apply_patch(&mut self, patch: &ProjectPatch, now: Timestamp) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = Some(description.clone());
        }
        if let Some(category) = &patch.category {
            self.category = Some(category.clone());
        }
        if let Some(status) = &patch.status {
            self.status = Some(status.clone());
        }
        if let Some(image_url) = &patch.image_url {
            self.image_url = Some(image_url.clone());
        }
        if let Some(year) = &patch.year {
            self.year = Some(year.clone());
        }
        self.updated_at = now;
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Input for creating a project. `id` and timestamps are assigned by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ProjectDraft {
    #[validate(custom(function = not_blank))]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(url)]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
}

impl ProjectDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Validate the draft, mapping failures into [`CoreError::Validation`].
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate().map_err(CoreError::from)
    }
}

/// Partial update for a project. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ProjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = not_blank))]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(url)]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
}

impl ProjectPatch {
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate().map_err(CoreError::from)
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message(Cow::Borrowed("Title is required")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// List helpers
// ---------------------------------------------------------------------------

/// Sort newest first. The sort is stable, so equal timestamps keep store order.
pub fn sort_newest_first(projects: &mut [Project]) {
    projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Insert `project` at the position its `created_at` dictates.
///
/// Any existing entry with the same id is replaced, so the list never holds
/// two entries for one id.
pub fn insert_ordered(projects: &mut Vec<Project>, project: Project) {
    projects.retain(|p| p.id != project.id);
    let pos = projects.partition_point(|p| p.created_at > project.created_at);
    projects.insert(pos, project);
}

/// Drop later entries whose id already appeared earlier in the list.
pub fn dedup_by_id(projects: &mut Vec<Project>) {
    let mut seen = HashSet::new();
    projects.retain(|p| seen.insert(p.id.clone()));
}

/// Remove the entry with `id`. Returns whether anything was removed.
pub fn remove_by_id(projects: &mut Vec<Project>, id: &ProjectId) -> bool {
    let before = projects.len();
    projects.retain(|p| &p.id != id);
    projects.len() != before
}

/// Client-side narrowing of a project list by category and free-text search.
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    /// Exact category match. `None` (or `"all"`) matches everything.
    pub category: Option<String>,
    /// Case-insensitive substring match against title and description.
    pub search: Option<String>,
}

impl ProjectFilter {
    pub fn matches(&self, project: &Project) -> bool {
        let category_ok = match self.category.as_deref() {
            None | Some("all") => true,
            Some(category) => project.category.as_deref() == Some(category),
        };

        let search_ok = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                project.title.to_lowercase().contains(&term)
                    || project
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&term))
            }
        };

        category_ok && search_ok
    }

    /// Keep matching projects, preserving order.
    pub fn apply(&self, projects: &[Project]) -> Vec<Project> {
        projects.iter().filter(|p| self.matches(p)).cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

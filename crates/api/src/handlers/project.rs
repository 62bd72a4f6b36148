//! Handlers for the `/projects` resource.
//!
//! Reads are public. Mutations require an admin token and publish a
//! `project.<verb>` event carrying the acting user.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use outreach_core::project::{Project, ProjectDraft, ProjectPatch};
use outreach_db::repositories::ProjectRepo;
use outreach_events::PlatformEvent;
use serde_json::json;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Row ids are UUIDs; any other id cannot name a project.
fn parse_id(id: &str) -> AppResult<Uuid> {
    id.parse().map_err(|_| AppError::project_not_found(id))
}

fn publish(state: &AppState, event_type: &str, project_id: &str, actor: &str, payload: serde_json::Value) {
    state.event_bus.publish(
        PlatformEvent::new(event_type)
            .with_source("project", project_id)
            .with_actor(actor)
            .with_payload(payload),
    );
}

/// POST /api/projects
pub async fn create(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<ProjectDraft>,
) -> AppResult<(StatusCode, Json<DataResponse<Project>>)> {
    input.check()?;
    let project = ProjectRepo::create(&state.pool, &input).await?;

    tracing::info!(project_id = %project.id, user_id = %user.user_id, "Project created");
    publish(
        &state,
        "project.created",
        project.id.as_str(),
        &user.user_id,
        json!({ "title": project.title }),
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

/// GET /api/projects
pub async fn list(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<Project>>>> {
    let projects = ProjectRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// GET /api/projects/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = ProjectRepo::find_by_id(&state.pool, parse_id(&id)?)
        .await?
        .ok_or_else(|| AppError::project_not_found(&id))?;
    Ok(Json(DataResponse { data: project }))
}

/// PUT /api/projects/{id}
pub async fn update(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ProjectPatch>,
) -> AppResult<Json<DataResponse<Project>>> {
    input.check()?;
    let project = ProjectRepo::update(&state.pool, parse_id(&id)?, &input)
        .await?
        .ok_or_else(|| AppError::project_not_found(&id))?;

    tracing::info!(project_id = %project.id, user_id = %user.user_id, "Project updated");
    publish(
        &state,
        "project.updated",
        project.id.as_str(),
        &user.user_id,
        json!({ "changes": input }),
    );
    Ok(Json(DataResponse { data: project }))
}

/// DELETE /api/projects/{id}
pub async fn delete(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    if !ProjectRepo::delete(&state.pool, parse_id(&id)?).await? {
        return Err(AppError::project_not_found(id));
    }

    tracing::info!(project_id = %id, user_id = %user.user_id, "Project deleted");
    publish(&state, "project.deleted", &id, &user.user_id, json!({}));
    Ok(StatusCode::NO_CONTENT)
}

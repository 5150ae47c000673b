use axum::{extract::State, http::StatusCode};

use super::record_activity;
use crate::{
    AppState,
    api::extract::{Json, Path}, analytics,
    api::models::{
        analytics::ProjectTokenReport,
        projects::{ProjectCreate, ProjectResponse},
    },
    db::models::{activity::ActivityCreateDBRequest, projects::ProjectCreateDBRequest, usage::UsageFilter},
    errors::{Error, ErrorBody, Result},
    types::{ActivityAction, ProjectId},
};

#[utoipa::path(
    get,
    path = "/api/projects",
    tag = "projects",
    summary = "List projects",
    responses(
        (status = 200, description = "All projects, newest first", body = Vec<ProjectResponse>),
        (status = 500, description = "Store failure", body = ErrorBody),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn list_projects(State(state): State<AppState>) -> Result<Json<Vec<ProjectResponse>>> {
    let projects = state.store.list_projects().await?;
    Ok(Json(projects.into_iter().map(ProjectResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/projects",
    tag = "projects",
    summary = "Create project",
    request_body = ProjectCreate,
    responses(
        (status = 201, description = "Project created", body = ProjectResponse),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn create_project(State(state): State<AppState>, Json(create): Json<ProjectCreate>) -> Result<(StatusCode, Json<ProjectResponse>)> {
    if create.name.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Project name cannot be empty".to_string(),
        });
    }

    let project = state.store.create_project(&ProjectCreateDBRequest::from(create)).await?;

    record_activity(
        state.store.as_ref(),
        ActivityCreateDBRequest {
            project_id: project.id,
            task_id: None,
            agent_id: None,
            action: ActivityAction::Created,
            description: Some(format!("Project \"{}\" was created", project.name)),
            metadata: None,
        },
    )
    .await;

    Ok((StatusCode::CREATED, Json(ProjectResponse::from(project))))
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    tag = "projects",
    summary = "Get project",
    params(("id" = String, Path, description = "Project ID", format = "uuid")),
    responses(
        (status = 200, description = "Project details", body = ProjectResponse),
        (status = 404, description = "Project not found", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn get_project(State(state): State<AppState>, Path(id): Path<ProjectId>) -> Result<Json<ProjectResponse>> {
    match state.store.get_project(id).await? {
        Some(project) => Ok(Json(ProjectResponse::from(project))),
        None => Err(Error::NotFound {
            resource: "Project".to_string(),
            id: id.to_string(),
        }),
    }
}

/// Token usage of one project. A project without usage, or an unknown id, reports zeros.
#[utoipa::path(
    get,
    path = "/api/projects/{id}/tokens",
    tag = "projects",
    summary = "Project token report",
    params(("id" = String, Path, description = "Project ID", format = "uuid")),
    responses(
        (status = 200, description = "Usage totals and cost per model", body = ProjectTokenReport),
        (status = 500, description = "Store failure", body = ErrorBody),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn get_project_tokens(State(state): State<AppState>, Path(id): Path<ProjectId>) -> Result<Json<ProjectTokenReport>> {
    let filter = UsageFilter {
        project_id: Some(id),
        ..Default::default()
    };
    let records = state.store.list_usage(&filter).await?;
    Ok(Json(analytics::project_report(&records, id)))
}

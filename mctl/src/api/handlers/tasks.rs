use axum::{extract::State, http::StatusCode};
use chrono::Utc;

use super::record_activity;
use crate::{
    AppState,
    api::extract::{Json, Path, Query}, analytics,
    api::models::{
        analytics::TaskTokenReport,
        tasks::{DeleteResponse, ListTasksQuery, TaskCreate, TaskResponse, TaskUpdate},
    },
    db::{
        errors::DbError,
        models::{
            activity::ActivityCreateDBRequest,
            tasks::{TaskCreateDBRequest, TaskDBResponse, TaskFilter, TaskUpdateDBRequest},
            usage::UsageFilter,
        },
    },
    errors::{Error, ErrorBody, Result},
    types::{ActivityAction, TaskId, TaskStatus, abbrev_uuid},
};

fn task_not_found(id: TaskId) -> Error {
    Error::NotFound {
        resource: "Task".to_string(),
        id: id.to_string(),
    }
}

/// Action and description recorded for an update, derived from the status it sets (if any)
fn update_activity(task: &TaskDBResponse, status: Option<TaskStatus>) -> (ActivityAction, String) {
    match status {
        Some(TaskStatus::Done) => (ActivityAction::Completed, format!("Task \"{}\" was completed", task.title)),
        Some(status) => (
            ActivityAction::StatusChanged,
            format!("Task \"{}\" status changed to {}", task.title, status),
        ),
        None => (ActivityAction::Updated, format!("Task \"{}\" was updated", task.title)),
    }
}

#[utoipa::path(
    get,
    path = "/api/tasks",
    tag = "tasks",
    summary = "List tasks",
    params(ListTasksQuery),
    responses(
        (status = 200, description = "Matching tasks, newest first", body = Vec<TaskResponse>),
        (status = 500, description = "Store failure", body = ErrorBody),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn list_tasks(State(state): State<AppState>, Query(query): Query<ListTasksQuery>) -> Result<Json<Vec<TaskResponse>>> {
    let tasks = state.store.list_tasks(&TaskFilter::from(query)).await?;
    Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/tasks",
    tag = "tasks",
    summary = "Create task",
    request_body = TaskCreate,
    responses(
        (status = 201, description = "Task created", body = TaskResponse),
        (status = 400, description = "Invalid request or unknown project", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn create_task(State(state): State<AppState>, Json(create): Json<TaskCreate>) -> Result<(StatusCode, Json<TaskResponse>)> {
    if create.title.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Task title cannot be empty".to_string(),
        });
    }

    let task = state.store.create_task(&TaskCreateDBRequest::from(create)).await?;

    record_activity(
        state.store.as_ref(),
        ActivityCreateDBRequest {
            project_id: task.project_id,
            task_id: Some(task.id),
            agent_id: Some(task.agent_id.clone()),
            action: ActivityAction::Created,
            description: Some(format!("Task \"{}\" was created", task.title)),
            metadata: None,
        },
    )
    .await;

    Ok((StatusCode::CREATED, Json(TaskResponse::from(task))))
}

#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    tag = "tasks",
    summary = "Get task",
    params(("id" = String, Path, description = "Task ID", format = "uuid")),
    responses(
        (status = 200, description = "Task details", body = TaskResponse),
        (status = 404, description = "Task not found", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn get_task(State(state): State<AppState>, Path(id): Path<TaskId>) -> Result<Json<TaskResponse>> {
    let task = state.store.get_task(id).await?.ok_or_else(|| task_not_found(id))?;
    Ok(Json(TaskResponse::from(task)))
}

/// Partially update a task.
///
/// Moving a task to `done` without a `completed_at` stamps the current time. The applied patch is
/// recorded as the activity entry's metadata.
#[utoipa::path(
    patch,
    path = "/api/tasks/{id}",
    tag = "tasks",
    summary = "Update task",
    params(("id" = String, Path, description = "Task ID", format = "uuid")),
    request_body = TaskUpdate,
    responses(
        (status = 200, description = "Updated task", body = TaskResponse),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 404, description = "Task not found", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn update_task(State(state): State<AppState>, Path(id): Path<TaskId>, Json(update): Json<TaskUpdate>) -> Result<Json<TaskResponse>> {
    if update.title.as_deref().is_some_and(|title| title.trim().is_empty()) {
        return Err(Error::BadRequest {
            message: "Task title cannot be empty".to_string(),
        });
    }

    let update = update.with_completion_stamp(Utc::now());
    let metadata = serde_json::to_value(&update).ok();
    let status = update.status;

    let task = state
        .store
        .update_task(id, &TaskUpdateDBRequest::from(update))
        .await
        .map_err(|e| match e {
            DbError::NotFound => task_not_found(id),
            other => Error::Database(other),
        })?;

    let (action, description) = update_activity(&task, status);
    record_activity(
        state.store.as_ref(),
        ActivityCreateDBRequest {
            project_id: task.project_id,
            task_id: Some(task.id),
            agent_id: Some(task.agent_id.clone()),
            action,
            description: Some(description),
            metadata,
        },
    )
    .await;

    Ok(Json(TaskResponse::from(task)))
}

#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    tag = "tasks",
    summary = "Delete task",
    params(("id" = String, Path, description = "Task ID", format = "uuid")),
    responses(
        (status = 200, description = "Task deleted along with its chat thread", body = DeleteResponse),
        (status = 404, description = "Task not found", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn delete_task(State(state): State<AppState>, Path(id): Path<TaskId>) -> Result<Json<DeleteResponse>> {
    if !state.store.delete_task(id).await? {
        return Err(task_not_found(id));
    }
    tracing::debug!(task_id = %abbrev_uuid(&id), "Deleted task");
    Ok(Json(DeleteResponse { success: true }))
}

/// Token usage of one task with its full history, newest first. Unknown tasks report zeros.
#[utoipa::path(
    get,
    path = "/api/tasks/{id}/tokens",
    tag = "tasks",
    summary = "Task token report",
    params(("id" = String, Path, description = "Task ID", format = "uuid")),
    responses(
        (status = 200, description = "Usage totals and history", body = TaskTokenReport),
        (status = 500, description = "Store failure", body = ErrorBody),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn get_task_tokens(State(state): State<AppState>, Path(id): Path<TaskId>) -> Result<Json<TaskTokenReport>> {
    let filter = UsageFilter {
        task_id: Some(id),
        ..Default::default()
    };
    let records = state.store.list_usage(&filter).await?;
    Ok(Json(analytics::task_report(&records, id)))
}

#[cfg(test)]
mod tests {
    use crate::api::models::{analytics::TaskTokenReport, tasks::TaskResponse};
    use crate::test_utils::*;
    use crate::types::{ActivityAction, TaskPriority, TaskStatus};
    use axum::http::StatusCode;
    use chrono::{Duration, Utc};
    use serde_json::json;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_create_task_applies_defaults() {
        let store = InMemoryStore::new();
        let project = seed_project(&store, "Apollo");
        let server = create_test_server(store.clone());

        let response = server
            .post("/api/tasks")
            .json(&json!({"project_id": project.id, "title": "Write docs", "agent_id": "claw"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let task: TaskResponse = response.json();
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert_eq!(task.completed_at, None);

        let activity = store.activity();
        assert_eq!(activity.len(), 1);
        assert_eq!(activity[0].task_id, Some(task.id));
        assert_eq!(activity[0].agent_id.as_deref(), Some("claw"));
        assert_eq!(activity[0].description.as_deref(), Some("Task \"Write docs\" was created"));
    }

    #[tokio::test]
    async fn test_create_task_for_unknown_project_is_bad_request() {
        let server = create_test_server(InMemoryStore::new());
        let response = server
            .post("/api/tasks")
            .json(&json!({"project_id": Uuid::new_v4(), "title": "Orphan", "agent_id": "claw"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_tasks_filters() {
        let store = InMemoryStore::new();
        let apollo = seed_project(&store, "Apollo");
        let gemini = seed_project(&store, "Gemini");
        seed_task(&store, apollo.id, "A1", "claw");
        seed_task(&store, apollo.id, "A2", "pixel");
        seed_task(&store, gemini.id, "G1", "claw");
        let server = create_test_server(store);

        let all: Vec<TaskResponse> = server.get("/api/tasks").await.json();
        assert_eq!(all.len(), 3);

        let apollo_tasks: Vec<TaskResponse> = server.get("/api/tasks").add_query_param("project_id", apollo.id).await.json();
        assert_eq!(apollo_tasks.len(), 2);

        let claw_in_apollo: Vec<TaskResponse> = server
            .get("/api/tasks")
            .add_query_param("project_id", apollo.id)
            .add_query_param("agent_id", "claw")
            .await
            .json();
        assert_eq!(claw_in_apollo.len(), 1);
        assert_eq!(claw_in_apollo[0].title, "A1");
    }

    #[tokio::test]
    async fn test_malformed_filter_gets_error_json() {
        let server = create_test_server(InMemoryStore::new());
        let response = server.get("/api/tasks?project_id=xyz").await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert!(body["error"].as_str().unwrap().contains("query string"));
    }

    #[tokio::test]
    async fn test_get_missing_task_is_not_found() {
        let server = create_test_server(InMemoryStore::new());
        server.get(&format!("/api/tasks/{}", Uuid::new_v4())).await.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_patch_to_done_stamps_completion() {
        let store = InMemoryStore::new();
        let project = seed_project(&store, "Apollo");
        let task = seed_task(&store, project.id, "Write docs", "claw");
        let server = create_test_server(store.clone());

        let before = Utc::now();
        let response = server.patch(&format!("/api/tasks/{}", task.id)).json(&json!({"status": "done"})).await;
        response.assert_status_ok();
        let updated: TaskResponse = response.json();
        assert_eq!(updated.status, TaskStatus::Done);
        assert!(updated.completed_at.is_some_and(|at| at >= before));

        let activity = store.activity();
        assert_eq!(activity[0].action, ActivityAction::Completed);
        assert_eq!(activity[0].description.as_deref(), Some("Task \"Write docs\" was completed"));
        let metadata = activity[0].metadata.as_ref().unwrap();
        assert_eq!(metadata["status"], json!("done"));
        assert!(metadata["completed_at"].is_string());
    }

    #[tokio::test]
    async fn test_patch_status_change_and_plain_update() {
        let store = InMemoryStore::new();
        let project = seed_project(&store, "Apollo");
        let task = seed_task(&store, project.id, "Write docs", "claw");
        let server = create_test_server(store.clone());

        server
            .patch(&format!("/api/tasks/{}", task.id))
            .json(&json!({"status": "in-progress"}))
            .await
            .assert_status_ok();
        server
            .patch(&format!("/api/tasks/{}", task.id))
            .json(&json!({"priority": "urgent", "assigned_to": "oscar"}))
            .await
            .assert_status_ok();

        let activity = store.activity();
        assert_eq!(activity[0].action, ActivityAction::StatusChanged);
        assert_eq!(
            activity[0].description.as_deref(),
            Some("Task \"Write docs\" status changed to in-progress")
        );
        assert_eq!(activity[1].action, ActivityAction::Updated);
        assert_eq!(activity[1].metadata, Some(json!({"priority": "urgent", "assigned_to": "oscar"})));
    }

    #[tokio::test]
    async fn test_patch_null_clears_field() {
        let store = InMemoryStore::new();
        let project = seed_project(&store, "Apollo");
        let task = seed_task(&store, project.id, "Write docs", "claw");
        let server = create_test_server(store);

        let assigned: TaskResponse = server
            .patch(&format!("/api/tasks/{}", task.id))
            .json(&json!({"assigned_to": "oscar"}))
            .await
            .json();
        assert_eq!(assigned.assigned_to.as_deref(), Some("oscar"));

        let cleared: TaskResponse = server
            .patch(&format!("/api/tasks/{}", task.id))
            .json(&json!({"assigned_to": null}))
            .await
            .json();
        assert_eq!(cleared.assigned_to, None);
        assert_eq!(cleared.title, "Write docs");
    }

    #[tokio::test]
    async fn test_patch_missing_task_is_not_found() {
        let store = InMemoryStore::new();
        let server = create_test_server(store.clone());
        let response = server.patch(&format!("/api/tasks/{}", Uuid::new_v4())).json(&json!({"title": "x"})).await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert!(store.activity().is_empty());
    }

    #[tokio::test]
    async fn test_delete_task() {
        let store = InMemoryStore::new();
        let project = seed_project(&store, "Apollo");
        let task = seed_task(&store, project.id, "Write docs", "claw");
        let server = create_test_server(store);

        let response = server.delete(&format!("/api/tasks/{}", task.id)).await;
        response.assert_status_ok();
        assert_eq!(response.json::<serde_json::Value>(), json!({"success": true}));

        server.get(&format!("/api/tasks/{}", task.id)).await.assert_status(StatusCode::NOT_FOUND);
        server.delete(&format!("/api/tasks/{}", task.id)).await.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_task_tokens_history_newest_first() {
        let store = InMemoryStore::new();
        let project = seed_project(&store, "Apollo");
        let task = seed_task(&store, project.id, "Write docs", "claw");
        let now = Utc::now();
        store.insert_usage_records([
            usage_record(project.id, Some(task.id), "claw", None, (100, 10), "0.01", now - Duration::hours(2)),
            usage_record(project.id, Some(task.id), "claw", None, (200, 20), "0.02", now - Duration::hours(1)),
            usage_record(project.id, None, "claw", None, (999, 999), "0.50", now),
        ]);
        let server = create_test_server(store);

        let report: TaskTokenReport = server.get(&format!("/api/tasks/{}/tokens", task.id)).await.json();
        assert_eq!(report.total_tokens, 330);
        assert_eq!(report.total_cost, dec("0.03"));
        assert_eq!(report.history.len(), 2);
        assert!(report.history[0].timestamp > report.history[1].timestamp);
    }
}

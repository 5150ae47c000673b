use axum::{extract::State, http::StatusCode};

use crate::{
    AppState,
    api::extract::{Json, Path}, chat,
    api::models::messages::{TaskMessageCreate, TaskMessageResponse},
    db::{errors::DbError, models::messages::TaskMessageCreateDBRequest},
    errors::{Error, ErrorBody, Result},
    types::TaskId,
};

#[utoipa::path(
    get,
    path = "/api/tasks/{id}/messages",
    tag = "messages",
    summary = "List task messages",
    params(("id" = String, Path, description = "Task ID", format = "uuid")),
    responses(
        (status = 200, description = "The task's chat thread, oldest first", body = Vec<TaskMessageResponse>),
        (status = 500, description = "Store failure", body = ErrorBody),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn list_messages(State(state): State<AppState>, Path(id): Path<TaskId>) -> Result<Json<Vec<TaskMessageResponse>>> {
    let messages = state.store.list_messages(id).await?;
    Ok(Json(messages.into_iter().map(TaskMessageResponse::from).collect()))
}

/// Post a message on a task's thread.
///
/// Messages without a sender are attributed to the configured default sender. Unless the sender
/// is the agent itself, a placeholder agent reply follows a few seconds later when auto-reply is
/// enabled.
#[utoipa::path(
    post,
    path = "/api/tasks/{id}/messages",
    tag = "messages",
    summary = "Post task message",
    params(("id" = String, Path, description = "Task ID", format = "uuid")),
    request_body = TaskMessageCreate,
    responses(
        (status = 201, description = "Message stored", body = TaskMessageResponse),
        (status = 400, description = "Empty message", body = ErrorBody),
        (status = 404, description = "Task not found", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn create_message(
    State(state): State<AppState>,
    Path(id): Path<TaskId>,
    Json(create): Json<TaskMessageCreate>,
) -> Result<(StatusCode, Json<TaskMessageResponse>)> {
    if create.message.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Message cannot be empty".to_string(),
        });
    }

    let sender = create
        .sender
        .filter(|sender| !sender.trim().is_empty())
        .unwrap_or_else(|| state.config.chat.default_sender.clone());

    let request = TaskMessageCreateDBRequest {
        task_id: id,
        sender,
        message: create.message,
    };
    let message = state.store.create_message(&request).await.map_err(|e| match e {
        DbError::ForeignKeyViolation { .. } => Error::NotFound {
            resource: "Task".to_string(),
            id: id.to_string(),
        },
        other => Error::Database(other),
    })?;

    let auto_reply = &state.config.chat.auto_reply;
    if chat::wants_reply(auto_reply, &message.sender) {
        chat::spawn_auto_reply(state.store.clone(), auto_reply, id);
    }

    Ok((StatusCode::CREATED, Json(TaskMessageResponse::from(message))))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::api::models::messages::TaskMessageResponse;
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use serde_json::json;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_post_uses_default_sender() {
        let store = InMemoryStore::new();
        let project = seed_project(&store, "Apollo");
        let task = seed_task(&store, project.id, "Write docs", "claw");
        let server = create_test_server(store);

        let response = server
            .post(&format!("/api/tasks/{}/messages", task.id))
            .json(&json!({"message": "Can you add tests?"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let message: TaskMessageResponse = response.json();
        assert_eq!(message.sender, "oscar");
        assert_eq!(message.task_id, task.id);
    }

    #[tokio::test]
    async fn test_thread_is_oldest_first() {
        let store = InMemoryStore::new();
        let project = seed_project(&store, "Apollo");
        let task = seed_task(&store, project.id, "Write docs", "claw");
        let server = create_test_server(store);

        for text in ["first", "second", "third"] {
            server
                .post(&format!("/api/tasks/{}/messages", task.id))
                .json(&json!({"sender": "oscar", "message": text}))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let thread: Vec<TaskMessageResponse> = server.get(&format!("/api/tasks/{}/messages", task.id)).await.json();
        assert_eq!(
            thread.iter().map(|m| m.message.as_str()).collect::<Vec<_>>(),
            vec!["first", "second", "third"]
        );
    }

    #[tokio::test]
    async fn test_post_to_missing_task_is_not_found() {
        let server = create_test_server(InMemoryStore::new());
        let response = server
            .post(&format!("/api/tasks/{}/messages", Uuid::new_v4()))
            .json(&json!({"message": "hello?"}))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let store = InMemoryStore::new();
        let project = seed_project(&store, "Apollo");
        let task = seed_task(&store, project.id, "Write docs", "claw");
        let server = create_test_server(store);

        let response = server
            .post(&format!("/api/tasks/{}/messages", task.id))
            .json(&json!({"message": "   "}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_auto_reply_follows_user_message() {
        let store = InMemoryStore::new();
        let project = seed_project(&store, "Apollo");
        let task = seed_task(&store, project.id, "Write docs", "claw");
        let mut config = create_test_config();
        config.chat.auto_reply.enabled = true;
        config.chat.auto_reply.delay = Duration::from_millis(10);
        let server = create_test_server_with_config(store, config);

        server
            .post(&format!("/api/tasks/{}/messages", task.id))
            .json(&json!({"message": "Status?"}))
            .await
            .assert_status(StatusCode::CREATED);

        // delay plus at most one second of jitter
        tokio::time::sleep(Duration::from_millis(1500)).await;
        let thread: Vec<TaskMessageResponse> = server.get(&format!("/api/tasks/{}/messages", task.id)).await.json();
        assert_eq!(thread.len(), 2);
        assert_eq!(thread[1].sender, "agent");
    }

    #[tokio::test]
    async fn test_agent_message_gets_no_reply() {
        let store = InMemoryStore::new();
        let project = seed_project(&store, "Apollo");
        let task = seed_task(&store, project.id, "Write docs", "claw");
        let mut config = create_test_config();
        config.chat.auto_reply.enabled = true;
        config.chat.auto_reply.delay = Duration::ZERO;
        let server = create_test_server_with_config(store, config);

        server
            .post(&format!("/api/tasks/{}/messages", task.id))
            .json(&json!({"sender": "agent", "message": "Done with the first pass."}))
            .await
            .assert_status(StatusCode::CREATED);

        tokio::time::sleep(Duration::from_millis(1100)).await;
        let thread: Vec<TaskMessageResponse> = server.get(&format!("/api/tasks/{}/messages", task.id)).await.json();
        assert_eq!(thread.len(), 1);
    }
}

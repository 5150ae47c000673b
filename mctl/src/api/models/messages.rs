//! API request/response models for the per-task chat thread.

use crate::db::models::messages::TaskMessageDBResponse;
use crate::types::{MessageId, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for posting a chat message on a task
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaskMessageCreate {
    /// Who is speaking; defaults to the configured sender
    #[schema(example = "oscar")]
    pub sender: Option<String>,
    #[schema(example = "Can you add a test for the empty case?")]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TaskMessageResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: MessageId,
    #[schema(value_type = String, format = "uuid")]
    pub task_id: TaskId,
    pub sender: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl From<TaskMessageDBResponse> for TaskMessageResponse {
    fn from(db: TaskMessageDBResponse) -> Self {
        Self {
            id: db.id,
            task_id: db.task_id,
            sender: db.sender,
            message: db.message,
            created_at: db.created_at,
        }
    }
}

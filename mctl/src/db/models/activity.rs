use crate::types::{ActivityAction, ActivityId, AgentId, ProjectId, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ActivityDBResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ActivityId,
    #[schema(value_type = String, format = "uuid")]
    pub project_id: ProjectId,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub task_id: Option<TaskId>,
    pub agent_id: Option<AgentId>,
    pub action: ActivityAction,
    pub description: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ActivityCreateDBRequest {
    pub project_id: ProjectId,
    pub task_id: Option<TaskId>,
    pub agent_id: Option<AgentId>,
    pub action: ActivityAction,
    pub description: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

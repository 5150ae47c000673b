use crate::types::{AgentId, ProjectId, TaskId, TaskPriority, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A kanban task within a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TaskDBResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: TaskId,
    #[schema(value_type = String, format = "uuid")]
    pub project_id: ProjectId,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub agent_id: AgentId,
    pub assigned_to: Option<String>,
    /// Task that must finish before this one can proceed
    #[schema(value_type = Option<String>, format = "uuid")]
    pub blocked_by: Option<TaskId>,
    pub blocker_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct TaskCreateDBRequest {
    pub project_id: ProjectId,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub agent_id: AgentId,
    pub assigned_to: Option<String>,
    pub blocked_by: Option<TaskId>,
    pub blocker_reason: Option<String>,
}

/// Partial update. For nullable columns, `None` leaves the value alone and `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdateDBRequest {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub agent_id: Option<AgentId>,
    pub assigned_to: Option<Option<String>>,
    pub blocked_by: Option<Option<TaskId>>,
    pub blocker_reason: Option<Option<String>>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub project_id: Option<ProjectId>,
    pub agent_id: Option<AgentId>,
}

impl TaskFilter {
    pub fn matches(&self, task: &TaskDBResponse) -> bool {
        self.project_id.is_none_or(|id| task.project_id == id) && self.agent_id.as_ref().is_none_or(|id| &task.agent_id == id)
    }
}

//! API request/response models for kanban tasks.

use crate::db::models::tasks::{TaskCreateDBRequest, TaskDBResponse, TaskFilter, TaskUpdateDBRequest};
use crate::types::{AgentId, ProjectId, TaskId, TaskPriority, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use utoipa::{IntoParams, ToSchema};

/// Query parameters for listing tasks
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ListTasksQuery {
    /// Only tasks in this project
    #[param(value_type = Option<String>, format = "uuid")]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub project_id: Option<ProjectId>,
    /// Only tasks owned by this agent
    pub agent_id: Option<AgentId>,
}

impl From<ListTasksQuery> for TaskFilter {
    fn from(query: ListTasksQuery) -> Self {
        Self {
            project_id: query.project_id,
            agent_id: query.agent_id,
        }
    }
}

/// Request body for creating a task
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaskCreate {
    #[schema(value_type = String, format = "uuid")]
    pub project_id: ProjectId,
    #[schema(example = "Wire up the billing page")]
    pub title: String,
    pub description: Option<String>,
    /// Defaults to `todo`
    #[serde(default)]
    pub status: Option<TaskStatus>,
    /// Defaults to `medium`
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[schema(example = "claw")]
    pub agent_id: AgentId,
    pub assigned_to: Option<String>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub blocked_by: Option<TaskId>,
    pub blocker_reason: Option<String>,
}

impl From<TaskCreate> for TaskCreateDBRequest {
    fn from(create: TaskCreate) -> Self {
        Self {
            project_id: create.project_id,
            title: create.title,
            description: create.description,
            status: create.status.unwrap_or_default(),
            priority: create.priority.unwrap_or_default(),
            agent_id: create.agent_id,
            assigned_to: create.assigned_to,
            blocked_by: create.blocked_by,
            blocker_reason: create.blocker_reason,
        }
    }
}

/// Partial update of a task. Omitted fields are left unchanged; for nullable fields an explicit
/// `null` clears the value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct TaskUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<AgentId>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub assigned_to: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub blocked_by: Option<Option<TaskId>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub blocker_reason: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub completed_at: Option<Option<DateTime<Utc>>>,
}

impl TaskUpdate {
    /// Moving a task to done without an explicit completion time completes it at `now`. A `null`
    /// completion time counts as no time.
    pub fn with_completion_stamp(mut self, now: DateTime<Utc>) -> Self {
        if self.status == Some(TaskStatus::Done) && !matches!(self.completed_at, Some(Some(_))) {
            self.completed_at = Some(Some(now));
        }
        self
    }
}

impl From<TaskUpdate> for TaskUpdateDBRequest {
    fn from(update: TaskUpdate) -> Self {
        Self {
            title: update.title,
            description: update.description,
            status: update.status,
            priority: update.priority,
            agent_id: update.agent_id,
            assigned_to: update.assigned_to,
            blocked_by: update.blocked_by,
            blocker_reason: update.blocker_reason,
            completed_at: update.completed_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TaskResponse {
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
    #[schema(value_type = Option<String>, format = "uuid")]
    pub blocked_by: Option<TaskId>,
    pub blocker_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<TaskDBResponse> for TaskResponse {
    fn from(db: TaskDBResponse) -> Self {
        Self {
            id: db.id,
            project_id: db.project_id,
            title: db.title,
            description: db.description,
            status: db.status,
            priority: db.priority,
            agent_id: db.agent_id,
            assigned_to: db.assigned_to,
            blocked_by: db.blocked_by,
            blocker_reason: db.blocker_reason,
            created_at: db.created_at,
            updated_at: db.updated_at,
            completed_at: db.completed_at,
        }
    }
}

/// Body returned by a successful delete
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
}

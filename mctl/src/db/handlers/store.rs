//! The store trait every backing store implements.

use crate::db::errors::Result;
use crate::db::models::{
    activity::{ActivityCreateDBRequest, ActivityDBResponse},
    agents::AgentDBResponse,
    messages::{TaskMessageCreateDBRequest, TaskMessageDBResponse},
    projects::{ProjectCreateDBRequest, ProjectDBResponse},
    tasks::{TaskCreateDBRequest, TaskDBResponse, TaskFilter, TaskUpdateDBRequest},
    usage::{UsageCreateDBRequest, UsageFilter, UsageRecord},
};
use crate::types::{ProjectId, TaskId};

/// Data access for everything the dashboard reads and writes.
///
/// Reads return a snapshot at call time; nothing is cached between calls. Callers joining several
/// sources (usage against project names, say) accept that the snapshots are not taken in one
/// transaction.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Usage rows matching the filter, ordered by timestamp ascending
    async fn list_usage(&self, filter: &UsageFilter) -> Result<Vec<UsageRecord>>;

    /// Append usage rows, returning how many were written
    async fn insert_usage(&self, records: &[UsageCreateDBRequest]) -> Result<u64>;

    /// All projects, newest first
    async fn list_projects(&self) -> Result<Vec<ProjectDBResponse>>;

    async fn get_project(&self, id: ProjectId) -> Result<Option<ProjectDBResponse>>;

    async fn create_project(&self, request: &ProjectCreateDBRequest) -> Result<ProjectDBResponse>;

    /// Tasks matching the filter, newest first
    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<TaskDBResponse>>;

    async fn get_task(&self, id: TaskId) -> Result<Option<TaskDBResponse>>;

    /// Create a task. Fails with `ForeignKeyViolation` when the project does not exist.
    async fn create_task(&self, request: &TaskCreateDBRequest) -> Result<TaskDBResponse>;

    /// Apply a partial update. Fails with `NotFound` when the task does not exist.
    async fn update_task(&self, id: TaskId, request: &TaskUpdateDBRequest) -> Result<TaskDBResponse>;

    /// Delete a task, returning whether a row was removed
    async fn delete_task(&self, id: TaskId) -> Result<bool>;

    /// A task's chat thread, oldest first
    async fn list_messages(&self, task_id: TaskId) -> Result<Vec<TaskMessageDBResponse>>;

    /// Fails with `ForeignKeyViolation` when the task does not exist.
    async fn create_message(&self, request: &TaskMessageCreateDBRequest) -> Result<TaskMessageDBResponse>;

    /// All agents ordered by name
    async fn list_agents(&self) -> Result<Vec<AgentDBResponse>>;

    async fn get_agent(&self, id: &str) -> Result<Option<AgentDBResponse>>;

    async fn log_activity(&self, request: &ActivityCreateDBRequest) -> Result<ActivityDBResponse>;
}

//! In-memory [`Store`] implementation.
//!
//! Tables are plain vectors guarded by a `parking_lot::RwLock`. It mirrors the constraints of the
//! PostgreSQL schema that handlers rely on (foreign keys on tasks and messages, cascading task
//! deletes). Suitable for tests and for running the dashboard without a database; everything is
//! lost on restart.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use super::store::Store;
use crate::db::errors::{DbError, Result};
use crate::db::models::{
    activity::{ActivityCreateDBRequest, ActivityDBResponse},
    agents::AgentDBResponse,
    messages::{TaskMessageCreateDBRequest, TaskMessageDBResponse},
    projects::{ProjectCreateDBRequest, ProjectDBResponse},
    tasks::{TaskCreateDBRequest, TaskDBResponse, TaskFilter, TaskUpdateDBRequest},
    usage::{UsageCreateDBRequest, UsageFilter, UsageRecord},
};
use crate::types::{ProjectId, TaskId};

#[derive(Default)]
struct Tables {
    projects: Vec<ProjectDBResponse>,
    tasks: Vec<TaskDBResponse>,
    messages: Vec<TaskMessageDBResponse>,
    agents: Vec<AgentDBResponse>,
    activity: Vec<ActivityDBResponse>,
    usage: Vec<UsageRecord>,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
    /// When set, every operation fails with this message
    failure: Arc<RwLock<Option<String>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a project row as-is, keeping its id and timestamps
    pub fn insert_project(&self, project: ProjectDBResponse) {
        self.tables.write().projects.push(project);
    }

    pub fn insert_task(&self, task: TaskDBResponse) {
        self.tables.write().tasks.push(task);
    }

    pub fn insert_agent(&self, agent: AgentDBResponse) {
        self.tables.write().agents.push(agent);
    }

    pub fn insert_usage_records(&self, records: impl IntoIterator<Item = UsageRecord>) {
        self.tables.write().usage.extend(records);
    }

    /// Activity entries in insertion order
    pub fn activity(&self) -> Vec<ActivityDBResponse> {
        self.tables.read().activity.clone()
    }

    /// Make every subsequent operation fail (or succeed again with `None`)
    pub fn set_failure(&self, message: Option<&str>) {
        *self.failure.write() = message.map(str::to_string);
    }

    fn check_failure(&self) -> Result<()> {
        match self.failure.read().as_ref() {
            Some(message) => Err(DbError::Other(anyhow::anyhow!(message.clone()))),
            None => Ok(()),
        }
    }
}

/// Newest first; among equal timestamps the later insert comes first
fn newest_first<T: Clone, K: Ord>(rows: &[T], key: impl Fn(&T) -> K) -> Vec<T> {
    let mut rows: Vec<T> = rows.iter().rev().cloned().collect();
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
    rows
}

#[async_trait::async_trait]
impl Store for InMemoryStore {
    async fn list_usage(&self, filter: &UsageFilter) -> Result<Vec<UsageRecord>> {
        self.check_failure()?;
        let mut records: Vec<UsageRecord> = self.tables.read().usage.iter().filter(|r| filter.matches(r)).cloned().collect();
        records.sort_by_key(|r| r.timestamp);
        Ok(records)
    }

    async fn insert_usage(&self, records: &[UsageCreateDBRequest]) -> Result<u64> {
        self.check_failure()?;
        let mut tables = self.tables.write();
        for record in records {
            tables.usage.push(UsageRecord {
                id: Uuid::new_v4(),
                project_id: record.project_id,
                task_id: record.task_id,
                agent_id: record.agent_id.clone(),
                model: record.model.clone(),
                input_tokens: record.input_tokens,
                output_tokens: record.output_tokens,
                cost_usd: record.cost_usd,
                timestamp: record.timestamp,
            });
        }
        Ok(records.len() as u64)
    }

    async fn list_projects(&self) -> Result<Vec<ProjectDBResponse>> {
        self.check_failure()?;
        Ok(newest_first(&self.tables.read().projects, |p| p.created_at))
    }

    async fn get_project(&self, id: ProjectId) -> Result<Option<ProjectDBResponse>> {
        self.check_failure()?;
        Ok(self.tables.read().projects.iter().find(|p| p.id == id).cloned())
    }

    async fn create_project(&self, request: &ProjectCreateDBRequest) -> Result<ProjectDBResponse> {
        self.check_failure()?;
        let now = Utc::now();
        let project = ProjectDBResponse {
            id: Uuid::new_v4(),
            name: request.name.clone(),
            description: request.description.clone(),
            status: request.status,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().projects.push(project.clone());
        Ok(project)
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<TaskDBResponse>> {
        self.check_failure()?;
        let tables = self.tables.read();
        let matching: Vec<TaskDBResponse> = tables.tasks.iter().filter(|t| filter.matches(t)).cloned().collect();
        Ok(newest_first(&matching, |t| t.created_at))
    }

    async fn get_task(&self, id: TaskId) -> Result<Option<TaskDBResponse>> {
        self.check_failure()?;
        Ok(self.tables.read().tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn create_task(&self, request: &TaskCreateDBRequest) -> Result<TaskDBResponse> {
        self.check_failure()?;
        let mut tables = self.tables.write();
        if !tables.projects.iter().any(|p| p.id == request.project_id) {
            return Err(DbError::ForeignKeyViolation {
                constraint: Some("tasks_project_id_fkey".to_string()),
                table: Some("tasks".to_string()),
                message: format!("project {} does not exist", request.project_id),
            });
        }

        let now = Utc::now();
        let task = TaskDBResponse {
            id: Uuid::new_v4(),
            project_id: request.project_id,
            title: request.title.clone(),
            description: request.description.clone(),
            status: request.status,
            priority: request.priority,
            agent_id: request.agent_id.clone(),
            assigned_to: request.assigned_to.clone(),
            blocked_by: request.blocked_by,
            blocker_reason: request.blocker_reason.clone(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        tables.tasks.push(task.clone());
        Ok(task)
    }

    async fn update_task(&self, id: TaskId, request: &TaskUpdateDBRequest) -> Result<TaskDBResponse> {
        self.check_failure()?;
        let mut tables = self.tables.write();
        let task = tables.tasks.iter_mut().find(|t| t.id == id).ok_or(DbError::NotFound)?;

        if let Some(title) = &request.title {
            task.title = title.clone();
        }
        if let Some(description) = &request.description {
            task.description = description.clone();
        }
        if let Some(status) = request.status {
            task.status = status;
        }
        if let Some(priority) = request.priority {
            task.priority = priority;
        }
        if let Some(agent_id) = &request.agent_id {
            task.agent_id = agent_id.clone();
        }
        if let Some(assigned_to) = &request.assigned_to {
            task.assigned_to = assigned_to.clone();
        }
        if let Some(blocked_by) = request.blocked_by {
            task.blocked_by = blocked_by;
        }
        if let Some(blocker_reason) = &request.blocker_reason {
            task.blocker_reason = blocker_reason.clone();
        }
        if let Some(completed_at) = request.completed_at {
            task.completed_at = completed_at;
        }
        task.updated_at = Utc::now();

        Ok(task.clone())
    }

    async fn delete_task(&self, id: TaskId) -> Result<bool> {
        self.check_failure()?;
        let mut tables = self.tables.write();
        let before = tables.tasks.len();
        tables.tasks.retain(|t| t.id != id);
        let removed = tables.tasks.len() < before;
        if removed {
            // ON DELETE CASCADE / SET NULL
            tables.messages.retain(|m| m.task_id != id);
            for task in tables.tasks.iter_mut().filter(|t| t.blocked_by == Some(id)) {
                task.blocked_by = None;
            }
            for entry in tables.activity.iter_mut().filter(|a| a.task_id == Some(id)) {
                entry.task_id = None;
            }
        }
        Ok(removed)
    }

    async fn list_messages(&self, task_id: TaskId) -> Result<Vec<TaskMessageDBResponse>> {
        self.check_failure()?;
        let mut messages: Vec<TaskMessageDBResponse> =
            self.tables.read().messages.iter().filter(|m| m.task_id == task_id).cloned().collect();
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    async fn create_message(&self, request: &TaskMessageCreateDBRequest) -> Result<TaskMessageDBResponse> {
        self.check_failure()?;
        let mut tables = self.tables.write();
        if !tables.tasks.iter().any(|t| t.id == request.task_id) {
            return Err(DbError::ForeignKeyViolation {
                constraint: Some("task_messages_task_id_fkey".to_string()),
                table: Some("task_messages".to_string()),
                message: format!("task {} does not exist", request.task_id),
            });
        }

        let message = TaskMessageDBResponse {
            id: Uuid::new_v4(),
            task_id: request.task_id,
            sender: request.sender.clone(),
            message: request.message.clone(),
            created_at: Utc::now(),
        };
        tables.messages.push(message.clone());
        Ok(message)
    }

    async fn list_agents(&self) -> Result<Vec<AgentDBResponse>> {
        self.check_failure()?;
        let mut agents = self.tables.read().agents.clone();
        agents.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(agents)
    }

    async fn get_agent(&self, id: &str) -> Result<Option<AgentDBResponse>> {
        self.check_failure()?;
        Ok(self.tables.read().agents.iter().find(|a| a.id == id).cloned())
    }

    async fn log_activity(&self, request: &ActivityCreateDBRequest) -> Result<ActivityDBResponse> {
        self.check_failure()?;
        let entry = ActivityDBResponse {
            id: Uuid::new_v4(),
            project_id: request.project_id,
            task_id: request.task_id,
            agent_id: request.agent_id.clone(),
            action: request.action,
            description: request.description.clone(),
            metadata: request.metadata.clone(),
            created_at: Utc::now(),
        };
        self.tables.write().activity.push(entry.clone());
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ProjectStatus, TaskPriority, TaskStatus};

    fn task_request(project_id: ProjectId, title: &str) -> TaskCreateDBRequest {
        TaskCreateDBRequest {
            project_id,
            title: title.to_string(),
            description: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            agent_id: "claw".to_string(),
            assigned_to: None,
            blocked_by: None,
            blocker_reason: None,
        }
    }

    async fn project(store: &InMemoryStore) -> ProjectDBResponse {
        store
            .create_project(&ProjectCreateDBRequest {
                name: "Apollo".to_string(),
                description: None,
                status: ProjectStatus::Active,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_task_requires_existing_project() {
        let store = InMemoryStore::new();
        let err = store.create_task(&task_request(Uuid::new_v4(), "orphan")).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_tasks_listed_newest_first() {
        let store = InMemoryStore::new();
        let project = project(&store).await;
        let first = store.create_task(&task_request(project.id, "first")).await.unwrap();
        let second = store.create_task(&task_request(project.id, "second")).await.unwrap();

        let tasks = store.list_tasks(&TaskFilter::default()).await.unwrap();
        assert_eq!(tasks.iter().map(|t| t.id).collect::<Vec<_>>(), vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_update_clears_nullable_fields() {
        let store = InMemoryStore::new();
        let project = project(&store).await;
        let mut request = task_request(project.id, "blocked");
        request.blocker_reason = Some("waiting on review".to_string());
        let task = store.create_task(&request).await.unwrap();

        let updated = store
            .update_task(
                task.id,
                &TaskUpdateDBRequest {
                    blocker_reason: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.blocker_reason, None);
        assert_eq!(updated.title, "blocked");
    }

    #[tokio::test]
    async fn test_update_missing_task_is_not_found() {
        let store = InMemoryStore::new();
        let err = store.update_task(Uuid::new_v4(), &TaskUpdateDBRequest::default()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[tokio::test]
    async fn test_delete_cascades_to_messages() {
        let store = InMemoryStore::new();
        let project = project(&store).await;
        let task = store.create_task(&task_request(project.id, "chatty")).await.unwrap();
        store
            .create_message(&TaskMessageCreateDBRequest {
                task_id: task.id,
                sender: "oscar".to_string(),
                message: "hi".to_string(),
            })
            .await
            .unwrap();

        assert!(store.delete_task(task.id).await.unwrap());
        assert!(store.list_messages(task.id).await.unwrap().is_empty());
        assert!(!store.delete_task(task.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = InMemoryStore::new();
        store.set_failure(Some("connection reset by peer"));
        let err = store.list_usage(&UsageFilter::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "connection reset by peer");

        store.set_failure(None);
        assert!(store.list_usage(&UsageFilter::default()).await.is_ok());
    }
}

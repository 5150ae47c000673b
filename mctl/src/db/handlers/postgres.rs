//! PostgreSQL-backed [`Store`].

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
use sqlx::PgPool;
use tracing::instrument;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl Store for PgStore {
    #[instrument(skip(self), err)]
    async fn list_usage(&self, filter: &UsageFilter) -> Result<Vec<UsageRecord>> {
        let records = sqlx::query_as::<_, UsageRecord>(
            r#"
            SELECT id, project_id, task_id, agent_id, model, input_tokens, output_tokens, cost_usd, timestamp
            FROM token_usage
            WHERE ($1::uuid IS NULL OR project_id = $1)
              AND ($2::uuid IS NULL OR task_id = $2)
              AND ($3::text IS NULL OR agent_id = $3)
              AND ($4::timestamptz IS NULL OR timestamp >= $4)
            ORDER BY timestamp ASC
            "#,
        )
        .bind(filter.project_id)
        .bind(filter.task_id)
        .bind(filter.agent_id.as_deref())
        .bind(filter.since)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    #[instrument(skip(self, records), fields(count = records.len()), err)]
    async fn insert_usage(&self, records: &[UsageCreateDBRequest]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for record in records {
            let result = sqlx::query(
                r#"
                INSERT INTO token_usage (project_id, task_id, agent_id, model, input_tokens, output_tokens, cost_usd, timestamp)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(record.project_id)
            .bind(record.task_id)
            .bind(&record.agent_id)
            .bind(record.model.as_deref())
            .bind(record.input_tokens)
            .bind(record.output_tokens)
            .bind(record.cost_usd)
            .bind(record.timestamp)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }

    #[instrument(skip(self), err)]
    async fn list_projects(&self) -> Result<Vec<ProjectDBResponse>> {
        let projects = sqlx::query_as::<_, ProjectDBResponse>("SELECT * FROM projects ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(projects)
    }

    #[instrument(skip(self), err)]
    async fn get_project(&self, id: ProjectId) -> Result<Option<ProjectDBResponse>> {
        let project = sqlx::query_as::<_, ProjectDBResponse>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(project)
    }

    #[instrument(skip(self), err)]
    async fn create_project(&self, request: &ProjectCreateDBRequest) -> Result<ProjectDBResponse> {
        let project = sqlx::query_as::<_, ProjectDBResponse>(
            r#"
            INSERT INTO projects (name, description, status)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(request.description.as_deref())
        .bind(request.status)
        .fetch_one(&self.pool)
        .await?;
        Ok(project)
    }

    #[instrument(skip(self), err)]
    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<TaskDBResponse>> {
        let tasks = sqlx::query_as::<_, TaskDBResponse>(
            r#"
            SELECT * FROM tasks
            WHERE ($1::uuid IS NULL OR project_id = $1)
              AND ($2::text IS NULL OR agent_id = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.project_id)
        .bind(filter.agent_id.as_deref())
        .fetch_all(&self.pool)
        .await?;
        Ok(tasks)
    }

    #[instrument(skip(self), err)]
    async fn get_task(&self, id: TaskId) -> Result<Option<TaskDBResponse>> {
        let task = sqlx::query_as::<_, TaskDBResponse>("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    #[instrument(skip(self), err)]
    async fn create_task(&self, request: &TaskCreateDBRequest) -> Result<TaskDBResponse> {
        let task = sqlx::query_as::<_, TaskDBResponse>(
            r#"
            INSERT INTO tasks (project_id, title, description, status, priority, agent_id, assigned_to, blocked_by, blocker_reason)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(request.project_id)
        .bind(&request.title)
        .bind(request.description.as_deref())
        .bind(request.status)
        .bind(request.priority)
        .bind(&request.agent_id)
        .bind(request.assigned_to.as_deref())
        .bind(request.blocked_by)
        .bind(request.blocker_reason.as_deref())
        .fetch_one(&self.pool)
        .await?;
        Ok(task)
    }

    #[instrument(skip(self), err)]
    async fn update_task(&self, id: TaskId, request: &TaskUpdateDBRequest) -> Result<TaskDBResponse> {
        let task = sqlx::query_as::<_, TaskDBResponse>(
            r#"
            UPDATE tasks SET
                title = COALESCE($2, title),
                description = CASE WHEN $3 THEN $4 ELSE description END,
                status = COALESCE($5, status),
                priority = COALESCE($6, priority),
                agent_id = COALESCE($7, agent_id),
                assigned_to = CASE WHEN $8 THEN $9 ELSE assigned_to END,
                blocked_by = CASE WHEN $10 THEN $11 ELSE blocked_by END,
                blocker_reason = CASE WHEN $12 THEN $13 ELSE blocker_reason END,
                completed_at = CASE WHEN $14 THEN $15 ELSE completed_at END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.title.as_deref())
        // description
        .bind(request.description.is_some())
        .bind(request.description.as_ref().and_then(|inner| inner.as_deref()))
        .bind(request.status)
        .bind(request.priority)
        .bind(request.agent_id.as_deref())
        // assigned_to
        .bind(request.assigned_to.is_some())
        .bind(request.assigned_to.as_ref().and_then(|inner| inner.as_deref()))
        // blocked_by
        .bind(request.blocked_by.is_some())
        .bind(request.blocked_by.flatten())
        // blocker_reason
        .bind(request.blocker_reason.is_some())
        .bind(request.blocker_reason.as_ref().and_then(|inner| inner.as_deref()))
        // completed_at
        .bind(request.completed_at.is_some())
        .bind(request.completed_at.flatten())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)?;
        Ok(task)
    }

    #[instrument(skip(self), err)]
    async fn delete_task(&self, id: TaskId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn list_messages(&self, task_id: TaskId) -> Result<Vec<TaskMessageDBResponse>> {
        let messages =
            sqlx::query_as::<_, TaskMessageDBResponse>("SELECT * FROM task_messages WHERE task_id = $1 ORDER BY created_at ASC")
                .bind(task_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(messages)
    }

    #[instrument(skip(self), err)]
    async fn create_message(&self, request: &TaskMessageCreateDBRequest) -> Result<TaskMessageDBResponse> {
        let message = sqlx::query_as::<_, TaskMessageDBResponse>(
            r#"
            INSERT INTO task_messages (task_id, sender, message)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(request.task_id)
        .bind(&request.sender)
        .bind(&request.message)
        .fetch_one(&self.pool)
        .await?;
        Ok(message)
    }

    #[instrument(skip(self), err)]
    async fn list_agents(&self) -> Result<Vec<AgentDBResponse>> {
        let agents = sqlx::query_as::<_, AgentDBResponse>("SELECT * FROM agents ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(agents)
    }

    #[instrument(skip(self), err)]
    async fn get_agent(&self, id: &str) -> Result<Option<AgentDBResponse>> {
        let agent = sqlx::query_as::<_, AgentDBResponse>("SELECT * FROM agents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(agent)
    }

    #[instrument(skip(self), err)]
    async fn log_activity(&self, request: &ActivityCreateDBRequest) -> Result<ActivityDBResponse> {
        let entry = sqlx::query_as::<_, ActivityDBResponse>(
            r#"
            INSERT INTO activity_log (project_id, task_id, agent_id, action, description, metadata)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(request.project_id)
        .bind(request.task_id)
        .bind(request.agent_id.as_deref())
        .bind(request.action)
        .bind(request.description.as_deref())
        .bind(request.metadata.as_ref())
        .fetch_one(&self.pool)
        .await?;
        Ok(entry)
    }
}

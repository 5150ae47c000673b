//! Database models for token usage events.

use crate::types::{AgentId, ProjectId, TaskId, UsageId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// One logged event of token consumption and cost attributed to a project/task/agent/model.
///
/// Rows are immutable once written; the process that logs agent activity owns them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UsageRecord {
    #[schema(value_type = String, format = "uuid")]
    pub id: UsageId,
    #[schema(value_type = String, format = "uuid")]
    pub project_id: ProjectId,
    /// Usage not tied to a specific task has no task id
    #[schema(value_type = Option<String>, format = "uuid")]
    pub task_id: Option<TaskId>,
    pub agent_id: AgentId,
    pub model: Option<String>,
    pub input_tokens: i64,
    pub output_tokens: i64,
    #[schema(value_type = f64)]
    pub cost_usd: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Insertion payload for usage rows (used by the seeder)
#[derive(Debug, Clone)]
pub struct UsageCreateDBRequest {
    pub project_id: ProjectId,
    pub task_id: Option<TaskId>,
    pub agent_id: AgentId,
    pub model: Option<String>,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub cost_usd: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Filter applied when reading usage rows from the store
#[derive(Debug, Clone, Default)]
pub struct UsageFilter {
    pub project_id: Option<ProjectId>,
    pub task_id: Option<TaskId>,
    pub agent_id: Option<AgentId>,
    /// Only rows with `timestamp >= since`
    pub since: Option<DateTime<Utc>>,
}

impl UsageFilter {
    pub fn matches(&self, record: &UsageRecord) -> bool {
        self.project_id.is_none_or(|id| record.project_id == id)
            && self.task_id.is_none_or(|id| record.task_id == Some(id))
            && self.agent_id.as_ref().is_none_or(|id| &record.agent_id == id)
            && self.since.is_none_or(|since| record.timestamp >= since)
    }
}

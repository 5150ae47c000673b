use crate::types::{AgentId, AgentStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AgentDBResponse {
    pub id: AgentId,
    pub name: String,
    pub emoji: Option<String>,
    pub description: Option<String>,
    pub default_model: Option<String>,
    pub status: AgentStatus,
    pub created_at: DateTime<Utc>,
}

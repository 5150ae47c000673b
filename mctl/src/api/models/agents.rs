//! API response models for the agent roster.

use crate::db::models::agents::AgentDBResponse;
use crate::types::{AgentId, AgentStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AgentResponse {
    #[schema(example = "claw")]
    pub id: AgentId,
    pub name: String,
    pub emoji: Option<String>,
    pub description: Option<String>,
    /// Model the agent runs on unless a task says otherwise
    pub default_model: Option<String>,
    pub status: AgentStatus,
    pub created_at: DateTime<Utc>,
}

impl From<AgentDBResponse> for AgentResponse {
    fn from(db: AgentDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            emoji: db.emoji,
            description: db.description,
            default_model: db.default_model,
            status: db.status,
            created_at: db.created_at,
        }
    }
}

//! API request/response models for projects.

use crate::db::models::projects::{ProjectCreateDBRequest, ProjectDBResponse};
use crate::types::{ProjectId, ProjectStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for creating a project
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProjectCreate {
    #[schema(example = "Apollo")]
    pub name: String,
    #[schema(example = "Landing page rewrite")]
    pub description: Option<String>,
    /// Defaults to `active`
    #[serde(default)]
    pub status: Option<ProjectStatus>,
}

impl From<ProjectCreate> for ProjectCreateDBRequest {
    fn from(create: ProjectCreate) -> Self {
        Self {
            name: create.name,
            description: create.description,
            status: create.status.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProjectResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ProjectId,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProjectDBResponse> for ProjectResponse {
    fn from(db: ProjectDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            description: db.description,
            status: db.status,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

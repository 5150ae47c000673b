//! OpenAPI documentation for the `/api/*` surface.
//!
//! The document is served at `/api-docs/openapi.json` and rendered by Scalar at `/api/docs`.

use utoipa::OpenApi;

use crate::{api, db, errors, types};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Mission Control",
        description = "Projects, kanban tasks and agents, with token usage analytics for the agents working on them.",
    ),
    paths(
        api::handlers::analytics::get_overview,
        api::handlers::analytics::get_by_day,
        api::handlers::analytics::get_by_agent,
        api::handlers::analytics::get_agent_usage,
        api::handlers::analytics::get_by_model,
        api::handlers::analytics::get_top_projects,
        api::handlers::analytics::get_top_tasks,
        api::handlers::projects::list_projects,
        api::handlers::projects::create_project,
        api::handlers::projects::get_project,
        api::handlers::projects::get_project_tokens,
        api::handlers::tasks::list_tasks,
        api::handlers::tasks::create_task,
        api::handlers::tasks::get_task,
        api::handlers::tasks::update_task,
        api::handlers::tasks::delete_task,
        api::handlers::tasks::get_task_tokens,
        api::handlers::messages::list_messages,
        api::handlers::messages::create_message,
        api::handlers::agents::list_agents,
        api::handlers::agents::get_agent,
    ),
    components(
        schemas(
            api::models::analytics::OverviewSummary,
            api::models::analytics::DailyBucket,
            api::models::analytics::AgentBucket,
            api::models::analytics::AgentSummary,
            api::models::analytics::AgentUsageResponse,
            api::models::analytics::ModelBucket,
            api::models::analytics::ProjectRanking,
            api::models::analytics::TaskRanking,
            api::models::analytics::ProjectTokenReport,
            api::models::analytics::TaskTokenReport,
            api::models::projects::ProjectCreate,
            api::models::projects::ProjectResponse,
            api::models::tasks::TaskCreate,
            api::models::tasks::TaskUpdate,
            api::models::tasks::TaskResponse,
            api::models::tasks::DeleteResponse,
            api::models::messages::TaskMessageCreate,
            api::models::messages::TaskMessageResponse,
            api::models::agents::AgentResponse,
            db::models::usage::UsageRecord,
            errors::ErrorBody,
            types::ProjectStatus,
            types::TaskStatus,
            types::TaskPriority,
            types::AgentStatus,
        )
    ),
    tags(
        (name = "analytics", description = "Token usage aggregation over all logged agent activity"),
        (name = "projects", description = "Projects and their token reports"),
        (name = "tasks", description = "Kanban tasks and their token reports"),
        (name = "messages", description = "Per-task chat thread"),
        (name = "agents", description = "Agent roster"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_route_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/analytics/overview",
            "/api/analytics/by-agent",
            "/api/analytics/agents/{agent_id}",
            "/api/projects/{id}/tokens",
            "/api/tasks/{id}",
            "/api/tasks/{id}/messages",
            "/api/agents/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn test_costs_documented_as_numbers() {
        let json = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let cost = &json["components"]["schemas"]["OverviewSummary"]["properties"]["total_cost"];
        assert_eq!(cost["type"], "number");
    }
}

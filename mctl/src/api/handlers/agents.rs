use axum::extract::State;

use crate::{
    AppState,
    api::extract::{Json, Path},
    api::models::agents::AgentResponse,
    errors::{Error, ErrorBody, Result},
    types::AgentId,
};

#[utoipa::path(
    get,
    path = "/api/agents",
    tag = "agents",
    summary = "List agents",
    responses(
        (status = 200, description = "All agents ordered by name", body = Vec<AgentResponse>),
        (status = 500, description = "Store failure", body = ErrorBody),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn list_agents(State(state): State<AppState>) -> Result<Json<Vec<AgentResponse>>> {
    let agents = state.store.list_agents().await?;
    Ok(Json(agents.into_iter().map(AgentResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/agents/{id}",
    tag = "agents",
    summary = "Get agent",
    params(("id" = String, Path, description = "Agent identifier")),
    responses(
        (status = 200, description = "Agent details", body = AgentResponse),
        (status = 404, description = "Agent not found", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn get_agent(State(state): State<AppState>, Path(id): Path<AgentId>) -> Result<Json<AgentResponse>> {
    let agent = state.store.get_agent(&id).await?.ok_or_else(|| Error::NotFound {
        resource: "Agent".to_string(),
        id: id.clone(),
    })?;
    Ok(Json(AgentResponse::from(agent)))
}

#[cfg(test)]
mod tests {
    use crate::api::models::agents::AgentResponse;
    use crate::test_utils::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_list_agents_sorted_by_name() {
        let store = InMemoryStore::new();
        seed_agent(&store, "pixel", "Pixel");
        seed_agent(&store, "claw", "Claw");
        let server = create_test_server(store);

        let agents: Vec<AgentResponse> = server.get("/api/agents").await.json();
        assert_eq!(agents.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(), vec!["claw", "pixel"]);
    }

    #[tokio::test]
    async fn test_get_agent() {
        let store = InMemoryStore::new();
        seed_agent(&store, "claw", "Claw");
        let server = create_test_server(store);

        let agent: AgentResponse = server.get("/api/agents/claw").await.json();
        assert_eq!(agent.name, "Claw");

        let response = server.get("/api/agents/ghost").await;
        response.assert_status(StatusCode::NOT_FOUND);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "Agent with ID ghost not found");
    }
}

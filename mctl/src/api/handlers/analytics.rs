//! Token usage analytics handlers
//!
//! Each request reads a fresh snapshot of usage records from the store and hands it to the pure
//! aggregation functions in [`crate::analytics`]. A store failure fails the whole request; nothing
//! is partially aggregated.

use std::collections::HashMap;

use axum::extract::State;
use chrono::{Duration, Utc};
use tracing::debug;

use crate::{
    AppState, analytics,
    api::extract::{Json, Path, Query},
    api::models::analytics::{
        AgentFilterQuery, AgentSummary, AgentUsageResponse, DailyBucket, ModelBucket, OverviewSummary, ProjectRanking, TaskRanking,
    },
    db::models::{tasks::TaskFilter, usage::UsageFilter},
    errors::{Error, ErrorBody},
    types::{AgentId, ProjectId, TaskId},
};

fn agent_filter(agent_id: Option<AgentId>) -> UsageFilter {
    UsageFilter {
        agent_id,
        ..Default::default()
    }
}

/// Headline usage totals
#[utoipa::path(
    get,
    path = "/api/analytics/overview",
    responses(
        (status = 200, description = "Usage totals across all records", body = OverviewSummary),
        (status = 500, description = "Store failure", body = ErrorBody),
    ),
    tag = "analytics",
)]
#[tracing::instrument(skip_all)]
pub async fn get_overview(State(state): State<AppState>) -> Result<Json<OverviewSummary>, Error> {
    let records = state.store.list_usage(&UsageFilter::default()).await?;
    Ok(Json(analytics::overview(&records, Utc::now())))
}

/// Usage per UTC day over the trailing window, oldest first
#[utoipa::path(
    get,
    path = "/api/analytics/by-day",
    responses(
        (status = 200, description = "Daily usage buckets", body = Vec<DailyBucket>),
        (status = 500, description = "Store failure", body = ErrorBody),
    ),
    tag = "analytics",
)]
#[tracing::instrument(skip_all)]
pub async fn get_by_day(State(state): State<AppState>) -> Result<Json<Vec<DailyBucket>>, Error> {
    let now = Utc::now();
    let days = state.config.analytics.trailing_days;
    let filter = UsageFilter {
        since: Some(now - Duration::days(i64::from(days))),
        ..Default::default()
    };

    let records = state.store.list_usage(&filter).await?;
    Ok(Json(analytics::by_day(&records, now, days)))
}

/// Usage per agent, or a single agent's summary when `agent_id` is given
///
/// Without `agent_id` the response is an array of agent buckets ordered by cost. With it, the
/// response is one [`AgentSummary`] object; `/api/analytics/agents/{agent_id}` returns the same
/// object from a dedicated path.
#[utoipa::path(
    get,
    path = "/api/analytics/by-agent",
    params(AgentFilterQuery),
    responses(
        (status = 200, description = "Per-agent breakdown, or one agent's summary", body = AgentUsageResponse),
        (status = 500, description = "Store failure", body = ErrorBody),
    ),
    tag = "analytics",
)]
#[tracing::instrument(skip_all)]
pub async fn get_by_agent(
    State(state): State<AppState>,
    Query(query): Query<AgentFilterQuery>,
) -> Result<Json<AgentUsageResponse>, Error> {
    match query.agent_id {
        Some(agent_id) => {
            debug!(agent_id = %agent_id, "Summarising single agent");
            let records = state.store.list_usage(&agent_filter(Some(agent_id.clone()))).await?;
            Ok(Json(AgentUsageResponse::Single(analytics::agent_summary(&records, &agent_id))))
        }
        None => {
            let records = state.store.list_usage(&UsageFilter::default()).await?;
            Ok(Json(AgentUsageResponse::Breakdown(analytics::by_agent(&records))))
        }
    }
}

/// One agent's usage summary. Agents without usage report zeros.
#[utoipa::path(
    get,
    path = "/api/analytics/agents/{agent_id}",
    params(("agent_id" = String, Path, description = "Agent identifier")),
    responses(
        (status = 200, description = "Agent usage summary", body = AgentSummary),
        (status = 500, description = "Store failure", body = ErrorBody),
    ),
    tag = "analytics",
)]
#[tracing::instrument(skip_all)]
pub async fn get_agent_usage(State(state): State<AppState>, Path(agent_id): Path<AgentId>) -> Result<Json<AgentSummary>, Error> {
    let records = state.store.list_usage(&agent_filter(Some(agent_id.clone()))).await?;
    Ok(Json(analytics::agent_summary(&records, &agent_id)))
}

/// Usage per model, optionally restricted to one agent
#[utoipa::path(
    get,
    path = "/api/analytics/by-model",
    params(AgentFilterQuery),
    responses(
        (status = 200, description = "Per-model usage buckets ordered by cost", body = Vec<ModelBucket>),
        (status = 500, description = "Store failure", body = ErrorBody),
    ),
    tag = "analytics",
)]
#[tracing::instrument(skip_all)]
pub async fn get_by_model(State(state): State<AppState>, Query(query): Query<AgentFilterQuery>) -> Result<Json<Vec<ModelBucket>>, Error> {
    let records = state.store.list_usage(&agent_filter(query.agent_id)).await?;
    Ok(Json(analytics::by_model(&records)))
}

/// Projects ranked by spend
#[utoipa::path(
    get,
    path = "/api/analytics/top-projects",
    responses(
        (status = 200, description = "Projects ordered by cost", body = Vec<ProjectRanking>),
        (status = 500, description = "Store failure", body = ErrorBody),
    ),
    tag = "analytics",
)]
#[tracing::instrument(skip_all)]
pub async fn get_top_projects(State(state): State<AppState>) -> Result<Json<Vec<ProjectRanking>>, Error> {
    let usage_filter = UsageFilter::default();
    let (records, projects) = tokio::try_join!(state.store.list_usage(&usage_filter), state.store.list_projects())?;

    let names: HashMap<ProjectId, String> = projects.into_iter().map(|p| (p.id, p.name)).collect();
    Ok(Json(analytics::top_projects(&records, &names)))
}

/// The most expensive tasks
#[utoipa::path(
    get,
    path = "/api/analytics/top-tasks",
    responses(
        (status = 200, description = "Tasks ordered by cost, truncated to the configured limit", body = Vec<TaskRanking>),
        (status = 500, description = "Store failure", body = ErrorBody),
    ),
    tag = "analytics",
)]
#[tracing::instrument(skip_all)]
pub async fn get_top_tasks(State(state): State<AppState>) -> Result<Json<Vec<TaskRanking>>, Error> {
    let usage_filter = UsageFilter::default();
    let task_filter = TaskFilter::default();
    let (records, tasks, projects) = tokio::try_join!(
        state.store.list_usage(&usage_filter),
        state.store.list_tasks(&task_filter),
        state.store.list_projects()
    )?;

    let titles: HashMap<TaskId, String> = tasks.into_iter().map(|t| (t.id, t.title)).collect();
    let names: HashMap<ProjectId, String> = projects.into_iter().map(|p| (p.id, p.name)).collect();
    Ok(Json(analytics::top_tasks(
        &records,
        &titles,
        &names,
        state.config.analytics.top_tasks_limit,
    )))
}

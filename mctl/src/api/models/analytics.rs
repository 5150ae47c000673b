//! API response models for token usage analytics.
//!
//! Every type here is derived from a snapshot of usage records and never persisted. Costs are
//! exact decimals and serialise as JSON numbers.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::db::models::usage::UsageRecord;
use crate::types::{AgentId, ProjectId, TaskId};

/// Headline numbers across all usage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OverviewSummary {
    pub total_tokens: i64,
    pub total_input: i64,
    pub total_output: i64,
    #[schema(value_type = f64)]
    pub total_cost: Decimal,
    /// Tokens used since the start of the current calendar month (UTC)
    pub this_month_tokens: i64,
    #[schema(value_type = f64)]
    pub this_month_cost: Decimal,
    /// Total tokens divided by the number of distinct tasks with usage, rounded; 0 when there are none
    pub avg_tokens_per_task: i64,
    pub record_count: usize,
}

/// Usage summed over one UTC calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DailyBucket {
    pub date: NaiveDate,
    pub input_tokens: i64,
    pub output_tokens: i64,
    #[schema(value_type = f64)]
    pub cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AgentBucket {
    pub agent_id: AgentId,
    pub total_tokens: i64,
    #[schema(value_type = f64)]
    pub total_cost: Decimal,
}

/// Usage of a single agent. An agent without usage reports zeros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AgentSummary {
    pub agent_id: AgentId,
    pub total_tokens: i64,
    #[schema(value_type = f64)]
    pub total_cost: Decimal,
    /// Distinct tasks the agent has usage against
    pub task_count: usize,
}

/// Response of the by-agent endpoint: the full breakdown, or one summary when filtered to an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum AgentUsageResponse {
    Breakdown(Vec<AgentBucket>),
    Single(AgentSummary),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ModelBucket {
    /// Model name, `"unknown"` for usage logged without one
    pub model: String,
    pub total_tokens: i64,
    #[schema(value_type = f64)]
    pub total_cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProjectRanking {
    #[schema(value_type = String, format = "uuid")]
    pub project_id: ProjectId,
    /// Project name, `"Unknown"` when the project no longer exists
    pub name: String,
    pub total_tokens: i64,
    #[schema(value_type = f64)]
    pub total_cost: Decimal,
    pub tasks_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TaskRanking {
    #[schema(value_type = String, format = "uuid")]
    pub task_id: TaskId,
    /// Task title, `"Unknown Task"` when the task no longer exists
    pub title: String,
    #[schema(value_type = String, format = "uuid")]
    pub project_id: ProjectId,
    pub project_name: String,
    /// Agent on the first usage record seen for the task
    pub agent_id: AgentId,
    pub total_tokens: i64,
    #[schema(value_type = f64)]
    pub total_cost: Decimal,
}

/// Token usage of one project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProjectTokenReport {
    pub total_tokens: i64,
    pub total_input: i64,
    pub total_output: i64,
    #[schema(value_type = f64)]
    pub total_cost: Decimal,
    /// Summed cost per model name
    #[schema(value_type = BTreeMap<String, f64>)]
    pub by_model: BTreeMap<String, Decimal>,
    pub record_count: usize,
}

/// Token usage of one task, with its records newest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TaskTokenReport {
    pub total_tokens: i64,
    pub total_input: i64,
    pub total_output: i64,
    #[schema(value_type = f64)]
    pub total_cost: Decimal,
    pub history: Vec<UsageRecord>,
}

/// Optional agent filter accepted by the by-agent and by-model endpoints
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AgentFilterQuery {
    /// Restrict to a single agent
    pub agent_id: Option<AgentId>,
}

//! Test utilities for handler and aggregation tests (available with `test-utils` feature).
//!
//! Everything runs against [`InMemoryStore`], so no database is needed. Seeding helpers write rows
//! straight into the store tables and keep the ids they are given.

use std::sync::Arc;

use axum_test::TestServer;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

pub use crate::db::handlers::InMemoryStore;
use crate::{
    AppState,
    config::{Config, DatabaseConfig},
    db::models::{
        agents::AgentDBResponse,
        projects::ProjectDBResponse,
        tasks::TaskDBResponse,
        usage::UsageRecord,
    },
    types::{AgentStatus, ProjectId, ProjectStatus, TaskId, TaskPriority, TaskStatus},
};

pub fn create_test_config() -> Config {
    let mut config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database: DatabaseConfig::Memory,
        enable_metrics: false,
        ..Default::default()
    };
    // Replies are exercised explicitly by the chat tests
    config.chat.auto_reply.enabled = false;
    config
}

pub fn create_test_server(store: InMemoryStore) -> TestServer {
    create_test_server_with_config(store, create_test_config())
}

pub fn create_test_server_with_config(store: InMemoryStore, config: Config) -> TestServer {
    let state = AppState::builder().store(Arc::new(store)).config(config).build();
    let router = crate::build_router(&state).expect("Failed to build router");
    TestServer::new(router).expect("Failed to create test server")
}

pub fn seed_project(store: &InMemoryStore, name: &str) -> ProjectDBResponse {
    let now = Utc::now();
    let project = ProjectDBResponse {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: None,
        status: ProjectStatus::Active,
        created_at: now,
        updated_at: now,
    };
    store.insert_project(project.clone());
    project
}

pub fn seed_task(store: &InMemoryStore, project_id: ProjectId, title: &str, agent_id: &str) -> TaskDBResponse {
    let now = Utc::now();
    let task = TaskDBResponse {
        id: Uuid::new_v4(),
        project_id,
        title: title.to_string(),
        description: None,
        status: TaskStatus::Todo,
        priority: TaskPriority::Medium,
        agent_id: agent_id.to_string(),
        assigned_to: None,
        blocked_by: None,
        blocker_reason: None,
        created_at: now,
        updated_at: now,
        completed_at: None,
    };
    store.insert_task(task.clone());
    task
}

pub fn seed_agent(store: &InMemoryStore, id: &str, name: &str) -> AgentDBResponse {
    let agent = AgentDBResponse {
        id: id.to_string(),
        name: name.to_string(),
        emoji: None,
        description: None,
        default_model: Some("claude-sonnet-4".to_string()),
        status: AgentStatus::Online,
        created_at: Utc::now(),
    };
    store.insert_agent(agent.clone());
    agent
}

/// Build a usage row; `tokens` is `(input, output)` and `cost` a decimal literal
pub fn usage_record(
    project_id: ProjectId,
    task_id: Option<TaskId>,
    agent_id: &str,
    model: Option<&str>,
    tokens: (i64, i64),
    cost: &str,
    timestamp: DateTime<Utc>,
) -> UsageRecord {
    UsageRecord {
        id: Uuid::new_v4(),
        project_id,
        task_id,
        agent_id: agent_id.to_string(),
        model: model.map(str::to_string),
        input_tokens: tokens.0,
        output_tokens: tokens.1,
        cost_usd: dec(cost),
        timestamp,
    }
}

pub fn dec(literal: &str) -> Decimal {
    literal.parse().expect("invalid decimal literal")
}

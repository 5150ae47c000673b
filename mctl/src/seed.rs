//! Random usage records for local development.
//!
//! `mctl --seed-usage N` spreads N records over the tasks that already exist, with timestamps in
//! the trailing 30 days, so the analytics endpoints have something to show.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::prelude::SliceRandom;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{info, instrument, warn};

use crate::db::handlers::Store;
use crate::db::models::{
    tasks::{TaskDBResponse, TaskFilter},
    usage::UsageCreateDBRequest,
};

const SEED_MODELS: &[&str] = &[
    "claude-sonnet-4-20250514",
    "claude-opus-4-20250514",
    "kimi-k2",
    "gpt-4o",
    "gemini-2.5-pro",
];

/// Days back the generated timestamps reach
const SEED_WINDOW_DAYS: i64 = 30;

/// USD per million (input, output) tokens. Opus models are priced higher; everything else uses
/// the standard rate.
fn price_per_million(model: &str) -> (Decimal, Decimal) {
    if model.contains("opus") {
        (Decimal::from(15), Decimal::from(75))
    } else {
        (Decimal::from(3), Decimal::from(15))
    }
}

/// Cost of a call, rounded half up to four decimal places
pub fn estimate_cost(model: &str, input_tokens: i64, output_tokens: i64) -> Decimal {
    let (input_rate, output_rate) = price_per_million(model);
    let raw = (Decimal::from(input_tokens) * input_rate + Decimal::from(output_tokens) * output_rate) / Decimal::from(1_000_000);
    raw.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
}

/// Generate `count` records against `tasks`. Empty when there are no tasks.
pub fn generate_usage(tasks: &[TaskDBResponse], count: usize, now: DateTime<Utc>, rng: &mut impl Rng) -> Vec<UsageCreateDBRequest> {
    let mut records = Vec::with_capacity(if tasks.is_empty() { 0 } else { count });
    for _ in 0..count {
        let (Some(task), Some(model)) = (tasks.choose(rng), SEED_MODELS.choose(rng)) else {
            break;
        };

        let offset_secs = rng.gen_range(0..SEED_WINDOW_DAYS * 86_400);
        let input_tokens = rng.gen_range(1_000..50_000);
        let output_tokens = rng.gen_range(500..20_500);

        records.push(UsageCreateDBRequest {
            project_id: task.project_id,
            task_id: Some(task.id),
            agent_id: task.agent_id.clone(),
            model: Some(model.to_string()),
            input_tokens,
            output_tokens,
            cost_usd: estimate_cost(model, input_tokens, output_tokens),
            timestamp: now - Duration::seconds(offset_secs),
        });
    }
    records
}

/// Insert `count` random usage records over the existing tasks, returning how many were written
#[instrument(skip(store))]
pub async fn seed_usage(store: &dyn Store, count: usize) -> anyhow::Result<u64> {
    let tasks = store.list_tasks(&TaskFilter::default()).await?;
    if tasks.is_empty() {
        warn!("No tasks found; create some before seeding usage");
        return Ok(0);
    }

    let records = generate_usage(&tasks, count, Utc::now(), &mut rand::thread_rng());
    let inserted = store.insert_usage(&records).await?;
    info!("Seeded {} token_usage records across {} tasks", inserted, tasks.len());
    Ok(inserted)
}

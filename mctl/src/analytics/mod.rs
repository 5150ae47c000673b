//! Aggregation of token usage records.
//!
//! Everything in here is a pure function over a slice of [`UsageRecord`]s read by the caller,
//! plus whatever name lookups and clock reading the aggregation needs. Nothing is cached between
//! calls, so two requests never observe each other.
//!
//! - [`summary`]: overview, by-day, by-agent and by-model groupings
//! - [`rankings`]: top projects and top tasks, joined against name lookups
//! - [`reports`]: project- and task-scoped token reports
//!
//! Partitioning is lossless: summing the buckets of any grouping gives the same totals as the
//! overview over the same records.

pub mod rankings;
pub mod reports;
pub mod summary;

pub use rankings::{top_projects, top_tasks};
pub use reports::{project_report, task_report};
pub use summary::{agent_summary, by_agent, by_day, by_model, overview};

use rust_decimal::Decimal;

use crate::db::models::usage::UsageRecord;

/// Model name used for records logged without one
pub const UNKNOWN_MODEL: &str = "unknown";
/// Placeholder for a project id with no matching project
pub const UNKNOWN_PROJECT: &str = "Unknown";
/// Placeholder for a task id with no matching task
pub const UNKNOWN_TASK: &str = "Unknown Task";

/// Running sums over a group of records
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Totals {
    pub input: i64,
    pub output: i64,
    pub cost: Decimal,
}

impl Totals {
    pub fn add(&mut self, record: &UsageRecord) {
        self.input += record.input_tokens;
        self.output += record.output_tokens;
        self.cost += record.cost_usd;
    }

    pub fn tokens(&self) -> i64 {
        self.input + self.output
    }

    pub fn of<'a>(records: impl IntoIterator<Item = &'a UsageRecord>) -> Self {
        let mut totals = Self::default();
        for record in records {
            totals.add(record);
        }
        totals
    }
}

pub(crate) fn model_key(record: &UsageRecord) -> &str {
    record.model.as_deref().unwrap_or(UNKNOWN_MODEL)
}

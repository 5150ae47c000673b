//! Token reports scoped to a single project or task.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use rust_decimal::Decimal;

use super::{Totals, model_key};
use crate::api::models::analytics::{ProjectTokenReport, TaskTokenReport};
use crate::db::models::usage::UsageRecord;
use crate::types::{ProjectId, TaskId};

pub fn project_report(records: &[UsageRecord], project_id: ProjectId) -> ProjectTokenReport {
    let own: Vec<&UsageRecord> = records.iter().filter(|r| r.project_id == project_id).collect();
    let totals = Totals::of(own.iter().copied());

    ProjectTokenReport {
        total_tokens: totals.tokens(),
        total_input: totals.input,
        total_output: totals.output,
        total_cost: totals.cost,
        by_model: cost_by_model(own.iter().copied()),
        record_count: own.len(),
    }
}

pub fn task_report(records: &[UsageRecord], task_id: TaskId) -> TaskTokenReport {
    let mut history: Vec<UsageRecord> = records.iter().filter(|r| r.task_id == Some(task_id)).cloned().collect();
    history.sort_by_key(|r| Reverse(r.timestamp));
    let totals = Totals::of(&history);

    TaskTokenReport {
        total_tokens: totals.tokens(),
        total_input: totals.input,
        total_output: totals.output,
        total_cost: totals.cost,
        history,
    }
}

/// Cost per model across a set of records
pub fn cost_by_model<'a>(records: impl IntoIterator<Item = &'a UsageRecord>) -> BTreeMap<String, Decimal> {
    let mut costs = BTreeMap::new();
    for record in records {
        *costs.entry(model_key(record).to_string()).or_insert(Decimal::ZERO) += record.cost_usd;
    }
    costs
}

//! Projects and tasks ranked by spend.

use std::collections::{BTreeMap, HashMap, HashSet};

use super::{Totals, UNKNOWN_PROJECT, UNKNOWN_TASK};
use crate::api::models::analytics::{ProjectRanking, TaskRanking};
use crate::db::models::usage::UsageRecord;
use crate::types::{AgentId, ProjectId, TaskId};

fn project_name(names: &HashMap<ProjectId, String>, id: &ProjectId) -> String {
    names.get(id).cloned().unwrap_or_else(|| UNKNOWN_PROJECT.to_string())
}

/// Every project with usage, most expensive first.
///
/// `names` maps project ids to names; ids without an entry are labelled "Unknown".
pub fn top_projects(records: &[UsageRecord], names: &HashMap<ProjectId, String>) -> Vec<ProjectRanking> {
    let mut groups: BTreeMap<ProjectId, (Totals, HashSet<TaskId>)> = BTreeMap::new();
    for record in records {
        let (totals, tasks) = groups.entry(record.project_id).or_default();
        totals.add(record);
        tasks.extend(record.task_id);
    }

    let mut rankings: Vec<ProjectRanking> = groups
        .into_iter()
        .map(|(project_id, (totals, tasks))| ProjectRanking {
            project_id,
            name: project_name(names, &project_id),
            total_tokens: totals.tokens(),
            total_cost: totals.cost,
            tasks_count: tasks.len(),
        })
        .collect();
    rankings.sort_by(|a, b| b.total_cost.cmp(&a.total_cost).then_with(|| a.project_id.cmp(&b.project_id)));
    rankings
}

struct TaskGroup {
    project_id: ProjectId,
    agent_id: AgentId,
    totals: Totals,
}

/// The `limit` most expensive tasks. Records without a task are skipped.
///
/// A task's project and agent come from the first of its records in `records`.
pub fn top_tasks(
    records: &[UsageRecord],
    titles: &HashMap<TaskId, String>,
    project_names: &HashMap<ProjectId, String>,
    limit: usize,
) -> Vec<TaskRanking> {
    let mut groups: BTreeMap<TaskId, TaskGroup> = BTreeMap::new();
    for record in records {
        let Some(task_id) = record.task_id else {
            continue;
        };
        groups
            .entry(task_id)
            .or_insert_with(|| TaskGroup {
                project_id: record.project_id,
                agent_id: record.agent_id.clone(),
                totals: Totals::default(),
            })
            .totals
            .add(record);
    }

    let mut rankings: Vec<TaskRanking> = groups
        .into_iter()
        .map(|(task_id, group)| TaskRanking {
            task_id,
            title: titles.get(&task_id).cloned().unwrap_or_else(|| UNKNOWN_TASK.to_string()),
            project_id: group.project_id,
            project_name: project_name(project_names, &group.project_id),
            agent_id: group.agent_id,
            total_tokens: group.totals.tokens(),
            total_cost: group.totals.cost,
        })
        .collect();
    rankings.sort_by(|a, b| b.total_cost.cmp(&a.total_cost).then_with(|| a.task_id.cmp(&b.task_id)));
    rankings.truncate(limit);
    rankings
}

//! Overview and dimensional groupings of usage.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};

use super::{Totals, model_key};
use crate::api::models::analytics::{AgentBucket, AgentSummary, DailyBucket, ModelBucket, OverviewSummary};
use crate::db::models::usage::UsageRecord;
use crate::types::TaskId;

/// Midnight UTC on the first day of `now`'s month
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now.date_naive();
    today.with_day(1).unwrap_or(today).and_time(NaiveTime::MIN).and_utc()
}

fn distinct_tasks<'a>(records: impl IntoIterator<Item = &'a UsageRecord>) -> usize {
    records.into_iter().filter_map(|r| r.task_id).collect::<HashSet<TaskId>>().len()
}

/// `total / count` rounded half up; both are non-negative
fn rounded_average(total: i64, count: usize) -> i64 {
    if count == 0 {
        return 0;
    }
    let count = count as i64;
    (2 * total + count) / (2 * count)
}

pub fn overview(records: &[UsageRecord], now: DateTime<Utc>) -> OverviewSummary {
    let totals = Totals::of(records);
    let since = month_start(now);
    let this_month = Totals::of(records.iter().filter(|r| r.timestamp >= since && r.timestamp < now));

    OverviewSummary {
        total_tokens: totals.tokens(),
        total_input: totals.input,
        total_output: totals.output,
        total_cost: totals.cost,
        this_month_tokens: this_month.tokens(),
        this_month_cost: this_month.cost,
        avg_tokens_per_task: rounded_average(totals.tokens(), distinct_tasks(records)),
        record_count: records.len(),
    }
}

/// Per-day totals over the trailing `days` days, oldest day first
pub fn by_day(records: &[UsageRecord], now: DateTime<Utc>, days: u32) -> Vec<DailyBucket> {
    let cutoff = now - Duration::days(i64::from(days));
    let mut groups: BTreeMap<NaiveDate, Totals> = BTreeMap::new();
    for record in records.iter().filter(|r| r.timestamp >= cutoff) {
        groups.entry(record.timestamp.date_naive()).or_default().add(record);
    }

    groups
        .into_iter()
        .map(|(date, totals)| DailyBucket {
            date,
            input_tokens: totals.input,
            output_tokens: totals.output,
            cost: totals.cost,
        })
        .collect()
}

/// Per-agent totals, most expensive first
pub fn by_agent(records: &[UsageRecord]) -> Vec<AgentBucket> {
    let mut groups: BTreeMap<&str, Totals> = BTreeMap::new();
    for record in records {
        groups.entry(record.agent_id.as_str()).or_default().add(record);
    }

    let mut buckets: Vec<AgentBucket> = groups
        .into_iter()
        .map(|(agent_id, totals)| AgentBucket {
            agent_id: agent_id.to_string(),
            total_tokens: totals.tokens(),
            total_cost: totals.cost,
        })
        .collect();
    buckets.sort_by(|a, b| b.total_cost.cmp(&a.total_cost).then_with(|| a.agent_id.cmp(&b.agent_id)));
    buckets
}

/// Summary of one agent's usage. Records of other agents are ignored.
pub fn agent_summary(records: &[UsageRecord], agent_id: &str) -> AgentSummary {
    let own = || records.iter().filter(|r| r.agent_id == agent_id);
    let totals = Totals::of(own());

    AgentSummary {
        agent_id: agent_id.to_string(),
        total_tokens: totals.tokens(),
        total_cost: totals.cost,
        task_count: distinct_tasks(own()),
    }
}

/// Per-model totals, most expensive first
pub fn by_model(records: &[UsageRecord]) -> Vec<ModelBucket> {
    let mut groups: BTreeMap<&str, Totals> = BTreeMap::new();
    for record in records {
        groups.entry(model_key(record)).or_default().add(record);
    }

    let mut buckets: Vec<ModelBucket> = groups
        .into_iter()
        .map(|(model, totals)| ModelBucket {
            model: model.to_string(),
            total_tokens: totals.tokens(),
            total_cost: totals.cost,
        })
        .collect();
    buckets.sort_by(|a, b| b.total_cost.cmp(&a.total_cost).then_with(|| a.model.cmp(&b.model)));
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{dec, usage_record as record};
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap()
    }

    fn sample() -> Vec<UsageRecord> {
        let project = Uuid::new_v4();
        let (t1, t2) = (Uuid::new_v4(), Uuid::new_v4());
        vec![
            record(project, Some(t1), "claw", Some("claude-opus-4"), (1200, 300), "0.0405", now() - Duration::days(40)),
            record(project, Some(t1), "claw", Some("claude-sonnet-4"), (400, 100), "0.0027", now() - Duration::days(20)),
            record(project, Some(t2), "pixel", None, (50, 25), "0.0005", now() - Duration::days(2)),
            record(project, None, "pixel", Some("claude-sonnet-4"), (800, 200), "0.0054", now() - Duration::hours(3)),
            record(project, Some(t2), "scout", Some("claude-opus-4"), (10, 10), "0.0009", now() - Duration::hours(1)),
        ]
    }

    #[test]
    fn test_single_record_overview() {
        let records = vec![record(Uuid::new_v4(), Some(Uuid::new_v4()), "claw", None, (1000, 500), "0.01", now())];
        let summary = overview(&records, now());
        assert_eq!(summary.total_tokens, 1500);
        assert_eq!(summary.total_cost, dec("0.01"));
        assert_eq!(summary.record_count, 1);
        assert_eq!(summary.avg_tokens_per_task, 1500);
    }

    #[test]
    fn test_empty_overview_is_zero() {
        assert_eq!(overview(&[], now()), OverviewSummary::default());
    }

    #[test]
    fn test_average_is_zero_without_task_linked_records() {
        let records = vec![
            record(Uuid::new_v4(), None, "claw", None, (100, 100), "0.001", now() - Duration::hours(1)),
            record(Uuid::new_v4(), None, "claw", None, (300, 0), "0.002", now() - Duration::hours(2)),
        ];
        let summary = overview(&records, now());
        assert_eq!(summary.record_count, 2);
        assert_eq!(summary.avg_tokens_per_task, 0);
    }

    #[test]
    fn test_average_rounds_half_up() {
        let project = Uuid::new_v4();
        let records = vec![
            record(project, Some(Uuid::new_v4()), "claw", None, (2, 0), "0", now()),
            record(project, Some(Uuid::new_v4()), "claw", None, (1, 0), "0", now()),
        ];
        // 3 tokens over 2 tasks
        assert_eq!(overview(&records, now()).avg_tokens_per_task, 2);
    }

    #[test]
    fn test_this_month_window() {
        let project = Uuid::new_v4();
        let records = vec![
            // last day of February
            record(project, None, "claw", None, (100, 0), "0.01", Utc.with_ymd_and_hms(2025, 2, 28, 23, 59, 59).unwrap()),
            // first instant of March
            record(project, None, "claw", None, (10, 0), "0.02", Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()),
            // not yet happened
            record(project, None, "claw", None, (1, 0), "0.04", now() + Duration::minutes(5)),
        ];
        let summary = overview(&records, now());
        assert_eq!(summary.this_month_tokens, 10);
        assert_eq!(summary.this_month_cost, dec("0.02"));
        assert!(summary.this_month_tokens <= summary.total_tokens);
    }

    #[test]
    fn test_month_start() {
        assert_eq!(month_start(now()), Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_by_day_excludes_old_records_and_sorts_ascending() {
        let buckets = by_day(&sample(), now(), 30);
        let cutoff = (now() - Duration::days(30)).date_naive();

        assert_eq!(buckets.len(), 3);
        assert!(buckets.iter().all(|b| b.date >= cutoff));
        assert!(buckets.windows(2).all(|w| w[0].date <= w[1].date));

        // the two records from today share a bucket
        let today = buckets.last().unwrap();
        assert_eq!(today.date, now().date_naive());
        assert_eq!(today.input_tokens, 810);
        assert_eq!(today.output_tokens, 210);
        assert_eq!(today.cost, dec("0.0063"));
    }

    #[test]
    fn test_by_day_window_includes_its_first_instant() {
        let project = Uuid::new_v4();
        let cutoff = now() - Duration::days(30);
        let records = vec![
            record(project, None, "claw", None, (7, 0), "0", cutoff),
            record(project, None, "claw", None, (1, 0), "0", cutoff - Duration::seconds(1)),
        ];
        let buckets = by_day(&records, now(), 30);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].date, cutoff.date_naive());
        assert_eq!(buckets[0].input_tokens, 7);
    }

    #[test]
    fn test_by_day_groups_by_utc_date() {
        let project = Uuid::new_v4();
        let records = vec![
            record(project, None, "claw", None, (1, 0), "0", Utc.with_ymd_and_hms(2025, 3, 10, 23, 30, 0).unwrap()),
            record(project, None, "claw", None, (1, 0), "0", Utc.with_ymd_and_hms(2025, 3, 11, 0, 30, 0).unwrap()),
        ];
        let buckets = by_day(&records, now(), 30);
        assert_eq!(
            buckets.iter().map(|b| b.date).collect::<Vec<_>>(),
            vec![NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(), NaiveDate::from_ymd_opt(2025, 3, 11).unwrap()]
        );
    }

    #[test]
    fn test_partitions_sum_to_overview() {
        let records = sample();
        let summary = overview(&records, now());

        let agents = by_agent(&records);
        let models = by_model(&records);
        assert_eq!(agents.iter().map(|b| b.total_tokens).sum::<i64>(), summary.total_tokens);
        assert_eq!(models.iter().map(|b| b.total_tokens).sum::<i64>(), summary.total_tokens);
        assert_eq!(agents.iter().map(|b| b.total_cost).sum::<Decimal>(), summary.total_cost);
        assert_eq!(models.iter().map(|b| b.total_cost).sum::<Decimal>(), summary.total_cost);

        let days = by_day(&records, now(), 3650);
        let day_tokens: i64 = days.iter().map(|b| b.input_tokens + b.output_tokens).sum();
        assert_eq!(day_tokens, summary.total_tokens);
    }

    #[test]
    fn test_by_agent_sorted_by_cost() {
        let buckets = by_agent(&sample());
        assert_eq!(
            buckets.iter().map(|b| b.agent_id.as_str()).collect::<Vec<_>>(),
            vec!["claw", "pixel", "scout"]
        );
        assert_eq!(buckets[0].total_tokens, 2000);
        assert_eq!(buckets[0].total_cost, dec("0.0432"));
    }

    #[test]
    fn test_cost_ties_break_by_key() {
        let project = Uuid::new_v4();
        let records = vec![
            record(project, None, "zed", Some("b-model"), (1, 0), "0.5", now()),
            record(project, None, "amy", Some("a-model"), (1, 0), "0.5", now()),
        ];
        assert_eq!(by_agent(&records)[0].agent_id, "amy");
        assert_eq!(by_model(&records)[0].model, "a-model");
    }

    #[test]
    fn test_by_model_buckets_missing_model_as_unknown() {
        let buckets = by_model(&sample());
        let unknown = buckets.iter().find(|b| b.model == "unknown").unwrap();
        assert_eq!(unknown.total_tokens, 75);
        assert_eq!(buckets[0].model, "claude-opus-4");
    }

    #[test]
    fn test_agent_summary_counts_distinct_tasks() {
        let summary = agent_summary(&sample(), "pixel");
        assert_eq!(summary.total_tokens, 1075);
        assert_eq!(summary.total_cost, dec("0.0059"));
        // one task-linked record plus one without a task
        assert_eq!(summary.task_count, 1);
    }

    #[test]
    fn test_agent_filtered_models_sum_to_agent_summary() {
        let records = sample();
        for agent in ["claw", "pixel", "scout"] {
            let own: Vec<UsageRecord> = records.iter().filter(|r| r.agent_id == agent).cloned().collect();
            let models = by_model(&own);
            let summary = agent_summary(&records, agent);
            assert_eq!(models.iter().map(|b| b.total_tokens).sum::<i64>(), summary.total_tokens);
            assert_eq!(models.iter().map(|b| b.total_cost).sum::<Decimal>(), summary.total_cost);
        }
    }

    #[test]
    fn test_agent_summary_for_unknown_agent_is_zero() {
        let summary = agent_summary(&sample(), "nobody");
        assert_eq!(
            summary,
            AgentSummary {
                agent_id: "nobody".to_string(),
                total_tokens: 0,
                total_cost: Decimal::ZERO,
                task_count: 0,
            }
        );
    }
}

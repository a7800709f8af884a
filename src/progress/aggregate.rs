use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::Serialize;
use tracing::instrument;

use crate::store::entities::TaskEntity;

use super::keys::{day_key, iso_week_start_key, month_key};

/// How much history the summary keeps per bucket size. Truncation happens
/// after sorting, so these always keep the most recent entries.
const DAILY_WINDOW: usize = 30;
const WEEKLY_WINDOW: usize = 12;
const MONTHLY_WINDOW: usize = 12;

#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TaskTotal {
    pub task_id: String,
    pub name: String,
    pub total_minutes: i64,
}

#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct DailyPoint {
    pub date: String,
    pub minutes: i64,
}

#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyPoint {
    pub week_start: String,
    pub minutes: i64,
}

#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct MonthlyPoint {
    pub month: String,
    pub minutes: i64,
}

#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub today_minutes: i64,
    pub this_week_minutes: i64,
    pub this_month_minutes: i64,
    pub all_time_minutes: i64,
}

/// The aggregated view of all session history. Derived data only, always
/// recomputable from the tasks themselves.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub per_task: Vec<TaskTotal>,
    pub daily: Vec<DailyPoint>,
    pub weekly: Vec<WeeklyPoint>,
    pub monthly: Vec<MonthlyPoint>,
    pub totals: Totals,
}

/// Computes the progress summary for a snapshot of tasks as of `now`.
///
/// `now` is captured once by the caller so every bucket comparison inside a
/// single computation agrees on what "today" is. The function reads the
/// snapshot, never mutates it, and performs no I/O; the same input always
/// produces the same output.
///
/// Sessions with a missing date are bucketed under `now`. Sessions with an
/// invalid or non-positive duration contribute zero everywhere and are not
/// an error.
#[instrument(skip(tasks), fields(task_count = tasks.len()))]
pub fn compute_summary(tasks: &[TaskEntity], now: DateTime<Utc>) -> ProgressSummary {
    let today_key = day_key(now);
    let week_key_ref = iso_week_start_key(now);
    let month_key_ref = month_key(now);

    let mut per_task = Vec::with_capacity(tasks.len());
    let mut daily_map = BTreeMap::<String, i64>::new();
    let mut weekly_map = BTreeMap::<String, i64>::new();
    let mut monthly_map = BTreeMap::<String, i64>::new();
    let mut totals = Totals::default();

    for task in tasks {
        let total = task.total_minutes();
        per_task.push(TaskTotal {
            task_id: task.id.to_string(),
            name: task.name.clone(),
            total_minutes: total,
        });
        totals.all_time_minutes += total;

        for session in &task.sessions {
            let minutes = session.minutes_or_zero();
            let moment = session.date.unwrap_or(now);

            let dk = day_key(moment);
            let wk = iso_week_start_key(moment);
            let mk = month_key(moment);

            if dk == today_key {
                totals.today_minutes += minutes;
            }
            if wk == week_key_ref {
                totals.this_week_minutes += minutes;
            }
            if mk == month_key_ref {
                totals.this_month_minutes += minutes;
            }

            *daily_map.entry(dk).or_insert(0) += minutes;
            *weekly_map.entry(wk).or_insert(0) += minutes;
            *monthly_map.entry(mk).or_insert(0) += minutes;
        }
    }

    ProgressSummary {
        per_task,
        daily: trailing(daily_map, DAILY_WINDOW)
            .map(|(date, minutes)| DailyPoint { date, minutes })
            .collect(),
        weekly: trailing(weekly_map, WEEKLY_WINDOW)
            .map(|(week_start, minutes)| WeeklyPoint { week_start, minutes })
            .collect(),
        monthly: trailing(monthly_map, MONTHLY_WINDOW)
            .map(|(month, minutes)| MonthlyPoint { month, minutes })
            .collect(),
        totals,
    }
}

/// Keeps only the last `window` entries of an already key-sorted map. The
/// ISO key formats sort lexicographically in chronological order.
fn trailing(map: BTreeMap<String, i64>, window: usize) -> impl Iterator<Item = (String, i64)> {
    let skip = map.len().saturating_sub(window);
    map.into_iter().skip(skip)
}

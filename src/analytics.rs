//! Read-only aggregates over the task lists.

use std::collections::BTreeMap;

use chrono::{Local, NaiveDate, TimeZone};
use serde::Serialize;

use crate::models::{AppState, Priority};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListStats {
    pub list_id: String,
    pub name: String,
    pub icon: String,
    pub total: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub completed: usize,
    pub per_list: Vec<ListStats>,
    /// Counts keyed by effective priority; priorities with no tasks are left out.
    pub by_priority: BTreeMap<Priority, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCompletion {
    pub date: NaiveDate,
    pub total: usize,
    pub completed: usize,
    /// Percentage in `0.0..=100.0`.
    pub completion_rate: f64,
}

pub fn summarize(state: &AppState) -> Summary {
    let per_list: Vec<ListStats> = state
        .lists
        .iter()
        .map(|list| ListStats {
            list_id: list.id.clone(),
            name: list.name.clone(),
            icon: list.icon.clone(),
            total: list.tasks.len(),
            completed: list.completed_count(),
        })
        .collect();

    let mut by_priority = BTreeMap::new();
    for task in state.all_tasks() {
        *by_priority.entry(task.effective_priority()).or_insert(0) += 1;
    }

    Summary {
        total: per_list.iter().map(|l| l.total).sum(),
        completed: per_list.iter().map(|l| l.completed).sum(),
        per_list,
        by_priority,
    }
}

/// Tasks bucketed by the local calendar day they were created on, oldest day first.
pub fn completion_timeline(state: &AppState) -> Vec<DailyCompletion> {
    completion_timeline_in(state, &Local)
}

pub fn completion_timeline_in<Tz: TimeZone>(state: &AppState, tz: &Tz) -> Vec<DailyCompletion> {
    let mut days: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();
    for task in state.all_tasks() {
        let Some(created) = tz.timestamp_millis_opt(task.created_at).single() else {
            log::debug!("task {} has unrepresentable created_at", task.id);
            continue;
        };
        let day = days.entry(created.date_naive()).or_insert((0, 0));
        day.0 += 1;
        if task.completed {
            day.1 += 1;
        }
    }
    days.into_iter()
        .map(|(date, (total, completed))| DailyCompletion {
            date,
            total,
            completed,
            completion_rate: completed as f64 / total as f64 * 100.0,
        })
        .collect()
}

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use crate::models::{AppState, Priority, Task};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Pending,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    DateAsc,
    #[default]
    DateDesc,
    Priority,
    Status,
}

/// Cross-list task view with filters and ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TaskQuery {
    #[serde(default)]
    pub status: StatusFilter,
    /// `None` matches every priority.
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub sort: SortOrder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskRow {
    pub task: Task,
    pub list_name: String,
    pub list_icon: String,
}

impl TaskQuery {
    pub fn matches(&self, task: &Task) -> bool {
        let status_ok = match self.status {
            StatusFilter::All => true,
            StatusFilter::Completed => task.completed,
            StatusFilter::Pending => !task.completed,
        };
        let priority_ok = self
            .priority
            .map_or(true, |wanted| task.effective_priority() == wanted);
        let needle = self.search.trim().to_lowercase();
        let search_ok = needle.is_empty() || task.title.to_lowercase().contains(&needle);
        status_ok && priority_ok && search_ok
    }

    /// Matching tasks from every list. Sorting is stable, so ties keep list order.
    pub fn run(&self, state: &AppState) -> Vec<TaskRow> {
        let mut rows: Vec<TaskRow> = state
            .lists
            .iter()
            .flat_map(|list| {
                list.tasks
                    .iter()
                    .filter(|task| self.matches(task))
                    .map(|task| TaskRow {
                        task: task.clone(),
                        list_name: list.name.clone(),
                        list_icon: list.icon.clone(),
                    })
            })
            .collect();

        match self.sort {
            SortOrder::DateAsc => rows.sort_by_key(|row| row.task.created_at),
            SortOrder::DateDesc => rows.sort_by_key(|row| Reverse(row.task.created_at)),
            SortOrder::Priority => {
                rows.sort_by_key(|row| row.task.effective_priority().urgency_rank())
            }
            SortOrder::Status => rows.sort_by_key(|row| row.task.completed),
        }
        rows
    }
}

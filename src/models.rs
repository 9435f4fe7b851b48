use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::DomainError;

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

pub const SCHEMA_VERSION: u32 = 1;

/// Icons offered when creating a list; the first entry is preselected.
pub const DEFAULT_ICONS: [(&str, &str); 5] = [
    ("📝", "Tasks"),
    ("🏠", "Home"),
    ("💼", "Work"),
    ("📚", "Study"),
    ("🎯", "Goals"),
];

static LAST_CREATED_AT: AtomicI64 = AtomicI64::new(0);

/// Random v4 UUID rendered as a string.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Wall-clock milliseconds, bumped so that successive calls in this process never repeat
/// or go backwards.
pub fn next_created_at() -> Timestamp {
    let now = Utc::now().timestamp_millis();
    let mut prev = LAST_CREATED_AT.load(Ordering::Relaxed);
    loop {
        let next = now.max(prev + 1);
        match LAST_CREATED_AT.compare_exchange_weak(prev, next, Ordering::Relaxed, Ordering::Relaxed)
        {
            Ok(_) => return next,
            Err(actual) => prev = actual,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Sort key with the most urgent priority first.
    pub fn urgency_rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    pub list_id: String,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl Task {
    /// Builds a fresh, uncompleted task for `list_id`. The title is trimmed and must not be
    /// blank.
    pub fn new(
        list_id: impl Into<String>,
        title: &str,
        priority: Option<Priority>,
    ) -> Result<Self, DomainError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DomainError::BlankText { field: "title" });
        }
        Ok(Self {
            id: new_id(),
            title: title.to_string(),
            completed: false,
            list_id: list_id.into(),
            created_at: next_created_at(),
            priority,
        })
    }

    pub fn effective_priority(&self) -> Priority {
        self.priority.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TaskList {
    pub id: String,
    pub name: String,
    pub icon: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl TaskList {
    pub fn new(name: &str, icon: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::BlankText { field: "name" });
        }
        Ok(Self {
            id: new_id(),
            name: name.to_string(),
            icon: icon.into(),
            tasks: Vec::new(),
        })
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    pub fn remaining_count(&self) -> usize {
        self.tasks.len() - self.completed_count()
    }
}

/// Durations are seconds. Values are signed because the store merges whatever the settings
/// surface sends; see `input` for the validating boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct PomodoroSettings {
    pub work_duration: i64,
    pub break_duration: i64,
    pub long_break_duration: i64,
    pub long_break_interval: i64,
}

impl Default for PomodoroSettings {
    fn default() -> Self {
        Self {
            work_duration: 25 * 60,
            break_duration: 5 * 60,
            long_break_duration: 15 * 60,
            long_break_interval: 4,
        }
    }
}

/// Partial update for [`PomodoroSettings`]; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct PomodoroSettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_duration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_duration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_break_duration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_break_interval: Option<i64>,
}

impl PomodoroSettingsPatch {
    pub fn merge_into(&self, settings: &mut PomodoroSettings) {
        if let Some(value) = self.work_duration {
            settings.work_duration = value;
        }
        if let Some(value) = self.break_duration {
            settings.break_duration = value;
        }
        if let Some(value) = self.long_break_duration {
            settings.long_break_duration = value;
        }
        if let Some(value) = self.long_break_interval {
            settings.long_break_interval = value;
        }
    }
}

/// Root aggregate held by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct AppState {
    #[serde(default)]
    pub lists: Vec<TaskList>,
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default)]
    pub pomodoro_settings: PomodoroSettings,
    /// Detached copy of the task picked for focused work. Deleting the task does not clear it.
    #[serde(default)]
    pub current_task: Option<Task>,
}

impl AppState {
    pub fn list(&self, list_id: &str) -> Option<&TaskList> {
        self.lists.iter().find(|list| list.id == list_id)
    }

    /// Tasks owned by `list_id`, empty when the list does not exist.
    pub fn tasks_in(&self, list_id: &str) -> &[Task] {
        self.list(list_id)
            .map(|list| list.tasks.as_slice())
            .unwrap_or(&[])
    }

    pub fn all_tasks(&self) -> impl Iterator<Item = &Task> {
        self.lists.iter().flat_map(|list| list.tasks.iter())
    }

    pub fn contains_task(&self, task_id: &str) -> bool {
        self.all_tasks().any(|task| task.id == task_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct StateFile {
    pub schema_version: u32,
    pub state: AppState,
}

impl From<&AppState> for StateFile {
    fn from(state: &AppState) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            state: state.clone(),
        }
    }
}

//! Mutations over [`AppState`]. Every operation takes the current state by reference and
//! returns a new one, so a rejected call leaves the caller's state untouched.

use crate::models::{AppState, PomodoroSettingsPatch, Task, TaskList};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    DuplicateId { kind: &'static str, id: String },
    UnknownList { list_id: String },
    MismatchedList { task_id: String, list_id: String },
    BlankText { field: &'static str },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainError::DuplicateId { kind, id } => write!(f, "duplicate {kind} id: {id}"),
            DomainError::UnknownList { list_id } => write!(f, "unknown list: {list_id}"),
            DomainError::MismatchedList { task_id, list_id } => {
                write!(f, "task {task_id} does not belong to list {list_id}")
            }
            DomainError::BlankText { field } => write!(f, "{field} must not be blank"),
        }
    }
}

impl std::error::Error for DomainError {}

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    AddList(TaskList),
    RemoveList { id: String },
    AddTask(Task),
    ToggleTask { task_id: String, list_id: String },
    RemoveTask { task_id: String, list_id: String },
    SetCurrentTask(Option<Task>),
    ToggleDarkMode,
    UpdatePomodoroSettings(PomodoroSettingsPatch),
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::AddList(_) => "add_list",
            Mutation::RemoveList { .. } => "remove_list",
            Mutation::AddTask(_) => "add_task",
            Mutation::ToggleTask { .. } => "toggle_task",
            Mutation::RemoveTask { .. } => "remove_task",
            Mutation::SetCurrentTask(_) => "set_current_task",
            Mutation::ToggleDarkMode => "toggle_dark_mode",
            Mutation::UpdatePomodoroSettings(_) => "update_pomodoro_settings",
        }
    }

    pub fn apply(self, state: &AppState) -> Result<AppState, DomainError> {
        match self {
            Mutation::AddList(list) => add_list(state, list),
            Mutation::RemoveList { id } => Ok(remove_list(state, &id)),
            Mutation::AddTask(task) => add_task(state, task),
            Mutation::ToggleTask { task_id, list_id } => Ok(toggle_task(state, &task_id, &list_id)),
            Mutation::RemoveTask { task_id, list_id } => Ok(remove_task(state, &task_id, &list_id)),
            Mutation::SetCurrentTask(task) => Ok(set_current_task(state, task.as_ref())),
            Mutation::ToggleDarkMode => Ok(toggle_dark_mode(state)),
            Mutation::UpdatePomodoroSettings(patch) => Ok(update_pomodoro_settings(state, &patch)),
        }
    }
}

/// Appends `list`. Any tasks it already carries must point back at it.
pub fn add_list(state: &AppState, list: TaskList) -> Result<AppState, DomainError> {
    if state.lists.iter().any(|existing| existing.id == list.id) {
        return Err(DomainError::DuplicateId {
            kind: "list",
            id: list.id,
        });
    }
    if list.name.trim().is_empty() {
        return Err(DomainError::BlankText { field: "name" });
    }
    if let Some(stray) = list.tasks.iter().find(|task| task.list_id != list.id) {
        return Err(DomainError::MismatchedList {
            task_id: stray.id.clone(),
            list_id: list.id.clone(),
        });
    }
    for (index, task) in list.tasks.iter().enumerate() {
        let repeated_inside = list.tasks[..index].iter().any(|t| t.id == task.id);
        if repeated_inside || state.contains_task(&task.id) {
            return Err(DomainError::DuplicateId {
                kind: "task",
                id: task.id.clone(),
            });
        }
    }
    let mut next = state.clone();
    next.lists.push(list);
    Ok(next)
}

/// Drops the list and every task it owns. Absent ids are ignored.
pub fn remove_list(state: &AppState, id: &str) -> AppState {
    let mut next = state.clone();
    next.lists.retain(|list| list.id != id);
    next
}

pub fn add_task(state: &AppState, task: Task) -> Result<AppState, DomainError> {
    if task.title.trim().is_empty() {
        return Err(DomainError::BlankText { field: "title" });
    }
    if state.contains_task(&task.id) {
        return Err(DomainError::DuplicateId {
            kind: "task",
            id: task.id,
        });
    }
    let mut next = state.clone();
    match next.lists.iter_mut().find(|list| list.id == task.list_id) {
        Some(list) => list.tasks.push(task),
        None => {
            return Err(DomainError::UnknownList {
                list_id: task.list_id,
            })
        }
    }
    Ok(next)
}

/// Flips completion on the task matching both ids; anything else is a no-op.
pub fn toggle_task(state: &AppState, task_id: &str, list_id: &str) -> AppState {
    let mut next = state.clone();
    if let Some(task) = next
        .lists
        .iter_mut()
        .filter(|list| list.id == list_id)
        .flat_map(|list| list.tasks.iter_mut())
        .find(|task| task.id == task_id)
    {
        task.completed = !task.completed;
    }
    next
}

pub fn remove_task(state: &AppState, task_id: &str, list_id: &str) -> AppState {
    let mut next = state.clone();
    if let Some(list) = next.lists.iter_mut().find(|list| list.id == list_id) {
        list.tasks.retain(|task| task.id != task_id);
    }
    next
}

/// Stores a copy of `task`; later edits to the original are not reflected here.
pub fn set_current_task(state: &AppState, task: Option<&Task>) -> AppState {
    let mut next = state.clone();
    next.current_task = task.cloned();
    next
}

pub fn toggle_dark_mode(state: &AppState) -> AppState {
    let mut next = state.clone();
    next.dark_mode = !next.dark_mode;
    next
}

/// Shallow merge; values are taken as given, including zero or negative ones.
pub fn update_pomodoro_settings(state: &AppState, patch: &PomodoroSettingsPatch) -> AppState {
    let mut next = state.clone();
    patch.merge_into(&mut next.pomodoro_settings);
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PomodoroSettings, Priority};

    fn make_list(id: &str) -> TaskList {
        TaskList {
            id: id.to_string(),
            name: format!("list-{id}"),
            icon: "📝".to_string(),
            tasks: Vec::new(),
        }
    }

    fn make_task(id: &str, list_id: &str) -> Task {
        Task {
            id: id.to_string(),
            title: format!("task-{id}"),
            completed: false,
            list_id: list_id.to_string(),
            created_at: 1000,
            priority: None,
        }
    }

    fn state_with(list_ids: &[&str]) -> AppState {
        let mut state = AppState::default();
        for id in list_ids {
            state = add_list(&state, make_list(id)).unwrap();
        }
        state
    }

    #[test]
    fn home_list_scenario_toggles_first_task() {
        let state = AppState::default();
        let state = add_list(
            &state,
            TaskList {
                id: "L1".into(),
                name: "Home".into(),
                icon: "🏠".into(),
                tasks: Vec::new(),
            },
        )
        .unwrap();
        let state = add_task(
            &state,
            Task {
                id: "T1".into(),
                title: "Buy milk".into(),
                completed: false,
                list_id: "L1".into(),
                created_at: 1000,
                priority: Some(Priority::Low),
            },
        )
        .unwrap();
        let state = toggle_task(&state, "T1", "L1");
        assert!(state.lists[0].tasks[0].completed);
    }

    #[test]
    fn add_list_rejects_duplicate_id() {
        let state = state_with(&["a"]);
        let err = add_list(&state, make_list("a")).unwrap_err();
        assert_eq!(
            err,
            DomainError::DuplicateId {
                kind: "list",
                id: "a".into()
            }
        );
        assert_eq!(state.lists.len(), 1);
    }

    #[test]
    fn add_list_rejects_tasks_owned_by_another_list() {
        let state = state_with(&["a"]);
        let mut list = make_list("b");
        list.tasks.push(make_task("t1", "a"));
        let err = add_list(&state, list).unwrap_err();
        assert!(matches!(err, DomainError::MismatchedList { .. }));

        let mut list = make_list("b");
        list.tasks.push(make_task("t1", "b"));
        list.tasks.push(make_task("t1", "b"));
        assert!(matches!(
            add_list(&state, list).unwrap_err(),
            DomainError::DuplicateId { kind: "task", .. }
        ));

        let mut blank = make_list("c");
        blank.name = "  ".into();
        assert!(matches!(
            add_list(&state, blank).unwrap_err(),
            DomainError::BlankText { field: "name" }
        ));
    }

    #[test]
    fn add_task_to_unknown_list_fails_and_leaves_state_unchanged() {
        let state = state_with(&["a"]);
        let before = state.clone();
        let err = add_task(&state, make_task("t1", "missing")).unwrap_err();
        assert_eq!(
            err,
            DomainError::UnknownList {
                list_id: "missing".into()
            }
        );
        assert_eq!(state, before);
    }

    #[test]
    fn add_task_rejects_duplicate_and_blank() {
        let state = state_with(&["a", "b"]);
        let state = add_task(&state, make_task("t1", "a")).unwrap();
        assert!(matches!(
            add_task(&state, make_task("t1", "b")).unwrap_err(),
            DomainError::DuplicateId { kind: "task", .. }
        ));

        let mut blank = make_task("t2", "a");
        blank.title = " ".into();
        assert!(matches!(
            add_task(&state, blank).unwrap_err(),
            DomainError::BlankText { field: "title" }
        ));
    }

    #[test]
    fn add_task_appends_in_insertion_order() {
        let state = state_with(&["a"]);
        let state = add_task(&state, make_task("t1", "a")).unwrap();
        let state = add_task(&state, make_task("t2", "a")).unwrap();
        let ids: Vec<_> = state.tasks_in("a").iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2"]);
    }

    #[test]
    fn remove_list_cascades_and_ignores_missing() {
        let state = state_with(&["a", "b"]);
        let state = add_task(&state, make_task("t1", "a")).unwrap();
        let state = add_task(&state, make_task("t2", "b")).unwrap();

        let state = remove_list(&state, "a");
        assert!(state.tasks_in("a").is_empty());
        assert!(state.all_tasks().all(|t| t.list_id == "b"));
        assert_eq!(state.lists.len(), 1);

        let unchanged = remove_list(&state, "nope");
        assert_eq!(unchanged, state);
    }

    #[test]
    fn toggle_twice_restores_completion() {
        let state = state_with(&["a"]);
        let state = add_task(&state, make_task("t1", "a")).unwrap();
        let once = toggle_task(&state, "t1", "a");
        assert!(once.tasks_in("a")[0].completed);
        let twice = toggle_task(&once, "t1", "a");
        assert_eq!(twice, state);
    }

    #[test]
    fn toggle_and_remove_with_wrong_list_are_noops() {
        let state = state_with(&["a", "b"]);
        let state = add_task(&state, make_task("t1", "a")).unwrap();
        assert_eq!(toggle_task(&state, "t1", "b"), state);
        assert_eq!(toggle_task(&state, "missing", "a"), state);
        assert_eq!(remove_task(&state, "t1", "b"), state);

        let removed = remove_task(&state, "t1", "a");
        assert!(removed.tasks_in("a").is_empty());
        assert_eq!(remove_task(&removed, "t1", "a"), removed);
    }

    #[test]
    fn referential_integrity_holds_across_mixed_operations() {
        let mut state = state_with(&["a", "b", "c"]);
        for (i, list) in ["a", "b", "c", "a", "x", "b"].iter().enumerate() {
            if let Ok(next) = add_task(&state, make_task(&format!("t{i}"), list)) {
                state = next;
            }
        }
        state = remove_task(&state, "t0", "a");
        state = remove_list(&state, "b");
        state = remove_task(&state, "t2", "c");
        for task in state.all_tasks() {
            assert_eq!(
                state.lists.iter().filter(|l| l.id == task.list_id).count(),
                1
            );
        }
        assert_eq!(state.all_tasks().count(), 1);
    }

    #[test]
    fn current_task_is_a_detached_copy() {
        let state = state_with(&["a"]);
        let state = add_task(&state, make_task("t1", "a")).unwrap();
        let picked = state.tasks_in("a")[0].clone();
        let state = set_current_task(&state, Some(&picked));

        let state = toggle_task(&state, "t1", "a");
        let current = state.current_task.as_ref().unwrap();
        assert!(!current.completed);

        // Deleting the task leaves the snapshot in place.
        let state = remove_list(&state, "a");
        assert_eq!(state.current_task.as_ref().unwrap().id, "t1");

        let cleared = set_current_task(&state, None);
        assert!(cleared.current_task.is_none());
    }

    #[test]
    fn dark_mode_flips() {
        let state = AppState::default();
        let dark = toggle_dark_mode(&state);
        assert!(dark.dark_mode);
        assert!(!toggle_dark_mode(&dark).dark_mode);
    }

    #[test]
    fn settings_update_changes_only_given_fields() {
        let state = AppState::default();
        let patch = PomodoroSettingsPatch {
            break_duration: Some(600),
            ..PomodoroSettingsPatch::default()
        };
        let next = update_pomodoro_settings(&state, &patch);
        assert_eq!(
            next.pomodoro_settings,
            PomodoroSettings {
                break_duration: 600,
                ..PomodoroSettings::default()
            }
        );

        // Garbage values pass through untouched.
        let patch = PomodoroSettingsPatch {
            work_duration: Some(-60),
            ..PomodoroSettingsPatch::default()
        };
        assert_eq!(
            update_pomodoro_settings(&next, &patch)
                .pomodoro_settings
                .work_duration,
            -60
        );
    }

    #[test]
    fn mutation_apply_dispatches_to_operations() {
        let state = Mutation::AddList(make_list("a"))
            .apply(&AppState::default())
            .unwrap();
        let state = Mutation::AddTask(make_task("t1", "a")).apply(&state).unwrap();
        let state = Mutation::ToggleTask {
            task_id: "t1".into(),
            list_id: "a".into(),
        }
        .apply(&state)
        .unwrap();
        assert!(state.tasks_in("a")[0].completed);

        let err = Mutation::AddTask(make_task("t2", "zzz"))
            .apply(&state)
            .unwrap_err();
        assert!(matches!(err, DomainError::UnknownList { .. }));
        assert_eq!(Mutation::ToggleDarkMode.name(), "toggle_dark_mode");
    }

    #[test]
    fn display_messages_name_the_offending_id() {
        let err = DomainError::UnknownList {
            list_id: "L9".into(),
        };
        assert_eq!(err.to_string(), "unknown list: L9");
        let err = DomainError::DuplicateId {
            kind: "list",
            id: "L1".into(),
        };
        assert_eq!(err.to_string(), "duplicate list id: L1");
    }
}

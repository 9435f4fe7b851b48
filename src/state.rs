use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use crate::domain::{DomainError, Mutation};
use crate::models::{AppState, StateFile};
use crate::storage::{Storage, StorageError};

/// Result of a successful dispatch. `warning` carries a failed write: the in-memory state
/// has moved on and the durable copy lags until the next write succeeds.
#[derive(Debug)]
pub struct Dispatched {
    pub state: Arc<AppState>,
    pub warning: Option<StorageError>,
}

/// Owner of the application state. Clones share the same state; all writes funnel through
/// [`Store::dispatch`], readers get immutable snapshots.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    writer: Mutex<Storage>,
    snapshot: watch::Sender<Arc<AppState>>,
}

impl Store {
    pub fn new(storage: Storage, initial: AppState) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(initial));
        Self {
            inner: Arc::new(StoreInner {
                writer: Mutex::new(storage),
                snapshot,
            }),
        }
    }

    /// Rehydrates from the durable slot under `root`, or starts from defaults.
    pub fn open(root: PathBuf) -> Result<Self, StorageError> {
        let storage = Storage::new(root);
        storage.ensure_dirs()?;
        let (state, defaulted) = storage.load_state_or_default();
        log::info!(
            "store opened path={} defaulted={} lists={}",
            storage.state_path().display(),
            defaulted,
            state.lists.len()
        );
        Ok(Self::new(storage, state))
    }

    pub fn state(&self) -> Arc<AppState> {
        self.inner.snapshot.borrow().clone()
    }

    /// Receiver that is marked changed after every successful dispatch.
    pub fn subscribe(&self) -> watch::Receiver<Arc<AppState>> {
        self.inner.snapshot.subscribe()
    }

    pub fn dispatch(&self, mutation: Mutation) -> Result<Dispatched, DomainError> {
        let storage = self.inner.writer.lock().expect("store writer poisoned");
        let name = mutation.name();
        let current = self.state();
        let next = match mutation.apply(&current) {
            Ok(next) => Arc::new(next),
            Err(error) => {
                log::debug!("dispatch rejected mutation={name} error={error}");
                return Err(error);
            }
        };

        let warning = match storage.save_state(&StateFile::from(next.as_ref())) {
            Ok(()) => None,
            Err(error) => {
                log::warn!(
                    "state write failed mutation={name} path={}: {error}",
                    storage.state_path().display()
                );
                Some(error)
            }
        };
        self.inner.snapshot.send_replace(next.clone());
        log::debug!("dispatch applied mutation={name}");
        Ok(Dispatched {
            state: next,
            warning,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PomodoroSettingsPatch, Priority, Task, TaskList};
    use std::fs;

    fn make_list(id: &str) -> TaskList {
        TaskList {
            id: id.to_string(),
            name: format!("list-{id}"),
            icon: "🏠".to_string(),
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
            priority: Some(Priority::Low),
        }
    }

    #[test]
    fn open_on_empty_dir_starts_from_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("data")).unwrap();
        assert_eq!(*store.state(), AppState::default());
    }

    #[test]
    fn dispatch_writes_through_and_reopen_rehydrates() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().to_path_buf()).unwrap();

        let out = store.dispatch(Mutation::AddList(make_list("L1"))).unwrap();
        assert!(out.warning.is_none());
        store
            .dispatch(Mutation::AddTask(make_task("T1", "L1")))
            .unwrap();
        store
            .dispatch(Mutation::ToggleTask {
                task_id: "T1".into(),
                list_id: "L1".into(),
            })
            .unwrap();
        store.dispatch(Mutation::ToggleDarkMode).unwrap();

        let reopened = Store::open(dir.path().to_path_buf()).unwrap();
        assert_eq!(*reopened.state(), *store.state());
        assert!(reopened.state().lists[0].tasks[0].completed);
        assert!(reopened.state().dark_mode);
    }

    #[test]
    fn rejected_dispatch_keeps_state_and_skips_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().to_path_buf()).unwrap();
        store.dispatch(Mutation::AddList(make_list("L1"))).unwrap();
        let before = store.state();
        let written = fs::read_to_string(dir.path().join("todo-pomodoro-storage.json")).unwrap();

        let err = store
            .dispatch(Mutation::AddTask(make_task("T1", "nope")))
            .unwrap_err();
        assert!(matches!(err, DomainError::UnknownList { .. }));
        assert_eq!(*store.state(), *before);
        let after = fs::read_to_string(dir.path().join("todo-pomodoro-storage.json")).unwrap();
        assert_eq!(written, after);

        let err = store
            .dispatch(Mutation::AddList(make_list("L1")))
            .unwrap_err();
        assert!(matches!(err, DomainError::DuplicateId { .. }));
    }

    #[test]
    fn failed_write_is_a_warning_and_state_still_moves() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().to_path_buf()).unwrap();
        fs::create_dir_all(dir.path().join("todo-pomodoro-storage.json")).unwrap();

        let out = store.dispatch(Mutation::ToggleDarkMode).unwrap();
        assert!(matches!(out.warning, Some(StorageError::Io(_))));
        assert!(out.state.dark_mode);
        assert!(store.state().dark_mode);
    }

    #[test]
    fn unreadable_slot_opens_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("todo-pomodoro-storage.json"), b"[]").unwrap();
        let store = Store::open(dir.path().to_path_buf()).unwrap();
        assert_eq!(*store.state(), AppState::default());
    }

    #[test]
    fn subscribers_see_each_successful_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().to_path_buf()).unwrap();
        let mut rx = store.subscribe();
        assert!(!rx.has_changed().unwrap());

        store
            .dispatch(Mutation::UpdatePomodoroSettings(PomodoroSettingsPatch {
                break_duration: Some(600),
                ..PomodoroSettingsPatch::default()
            }))
            .unwrap();
        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone();
        assert_eq!(seen.pomodoro_settings.break_duration, 600);
        assert_eq!(seen.pomodoro_settings.work_duration, 1500);

        // A rejected mutation does not notify.
        let _ = store.dispatch(Mutation::AddTask(make_task("T1", "nope")));
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn snapshots_are_not_live() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().to_path_buf()).unwrap();
        let before = store.state();
        store.dispatch(Mutation::AddList(make_list("L1"))).unwrap();
        assert!(before.lists.is_empty());
        assert_eq!(store.state().lists.len(), 1);
    }

    #[test]
    fn clones_share_one_state_and_serialize_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().to_path_buf()).unwrap();
        store.dispatch(Mutation::AddList(make_list("L1"))).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store
                        .dispatch(Mutation::AddTask(make_task(&format!("T{i}"), "L1")))
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.state().tasks_in("L1").len(), 8);

        let reopened = Store::open(dir.path().to_path_buf()).unwrap();
        assert_eq!(reopened.state().tasks_in("L1").len(), 8);
    }
}

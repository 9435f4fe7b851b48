//! Task lists, a Pomodoro timer and the persisted state behind them.
//!
//! Views read snapshots from [`Store`] and change state only through
//! [`Store::dispatch`]; the timer runs on [`TimerDriver`] and reads its durations from the
//! store on every tick.

pub mod analytics;
pub mod domain;
pub mod events;
pub mod input;
pub mod logging;
pub mod models;
pub mod query;
pub mod scheduler;
pub mod state;
pub mod storage;
pub mod timer;

use std::path::Path;

pub use crate::domain::{DomainError, Mutation};
pub use crate::models::{
    AppState, PomodoroSettings, PomodoroSettingsPatch, Priority, Task, TaskList,
};
pub use crate::scheduler::{Chime, TerminalBell, TimerDriver};
pub use crate::state::{Dispatched, Store};
pub use crate::storage::StorageError;

#[derive(Debug)]
pub enum BootError {
    Storage(StorageError),
    #[cfg(feature = "file-log")]
    Logging(flexi_logger::FlexiLoggerError),
}

impl std::fmt::Display for BootError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BootError::Storage(err) => write!(f, "storage error: {err}"),
            #[cfg(feature = "file-log")]
            BootError::Logging(err) => write!(f, "logging error: {err}"),
        }
    }
}

impl std::error::Error for BootError {}

impl From<StorageError> for BootError {
    fn from(value: StorageError) -> Self {
        BootError::Storage(value)
    }
}

#[cfg(feature = "file-log")]
impl From<flexi_logger::FlexiLoggerError> for BootError {
    fn from(value: flexi_logger::FlexiLoggerError) -> Self {
        BootError::Logging(value)
    }
}

/// Everything a host needs after process start.
pub struct App {
    pub store: Store,
    pub timer: TimerDriver,
    #[cfg(feature = "file-log")]
    _logger: flexi_logger::LoggerHandle,
}

/// Starts file logging, rehydrates the store from `data_dir` and wires the timer to it.
/// Must be called from inside a tokio runtime; the timer ticks on that runtime.
pub fn bootstrap(data_dir: &Path) -> Result<App, BootError> {
    #[cfg(feature = "file-log")]
    let logger = logging::init_logging(data_dir)?;

    let store = Store::open(data_dir.to_path_buf())?;
    let timer = TimerDriver::new(
        store.clone(),
        Box::new(TerminalBell),
        tokio::runtime::Handle::current(),
    );
    Ok(App {
        store,
        timer,
        #[cfg(feature = "file-log")]
        _logger: logger,
    })
}

use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::events::TimerEvent;
use crate::state::Store;
use crate::timer::PomodoroTimer;

const TICK: Duration = Duration::from_secs(1);
const EVENT_CAPACITY: usize = 64;

#[derive(Debug)]
pub struct ChimeError(pub String);

impl std::fmt::Display for ChimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "chime error: {}", self.0)
    }
}

impl std::error::Error for ChimeError {}

/// Audible cue played when a phase ends.
pub trait Chime: Send + Sync {
    fn play(&self) -> Result<(), ChimeError>;
}

/// Rings the terminal bell on stdout.
pub struct TerminalBell;

impl Chime for TerminalBell {
    fn play(&self) -> Result<(), ChimeError> {
        let mut out = std::io::stdout();
        out.write_all(b"\x07")
            .and_then(|_| out.flush())
            .map_err(|err| ChimeError(err.to_string()))
    }
}

/// Runs a [`PomodoroTimer`] off a one-second tokio interval.
///
/// Each `start` gets a fresh generation number. `pause` and `reset` bump the generation and
/// abort the ticker, and a tick only touches the timer while holding its lock with a matching
/// generation, so a tick that was already in flight cannot move a stopped timer.
pub struct TimerDriver {
    inner: Arc<DriverInner>,
    runtime: Handle,
}

struct DriverInner {
    store: Store,
    timer: Mutex<PomodoroTimer>,
    generation: AtomicU64,
    ticker: Mutex<Option<JoinHandle<()>>>,
    chime: Box<dyn Chime>,
    events: broadcast::Sender<TimerEvent>,
}

impl TimerDriver {
    pub fn new(store: Store, chime: Box<dyn Chime>, runtime: Handle) -> Self {
        let timer = PomodoroTimer::new(&store.state().pomodoro_settings);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(DriverInner {
                store,
                timer: Mutex::new(timer),
                generation: AtomicU64::new(0),
                ticker: Mutex::new(None),
                chime,
                events,
            }),
            runtime,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.inner.events.subscribe()
    }

    pub fn snapshot(&self) -> PomodoroTimer {
        self.inner.timer.lock().expect("timer poisoned").clone()
    }

    /// Returns `false` when the timer was already running.
    pub fn start(&self) -> bool {
        let mut timer = self.inner.timer.lock().expect("timer poisoned");
        if !timer.start() {
            return false;
        }
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let handle = self
            .runtime
            .spawn(run_ticks(Arc::clone(&self.inner), generation));
        if let Some(previous) = self
            .inner
            .ticker
            .lock()
            .expect("ticker poisoned")
            .replace(handle)
        {
            previous.abort();
        }
        log::info!(
            "timer started phase={:?} remaining={} generation={generation}",
            timer.phase(),
            timer.remaining()
        );
        true
    }

    /// Returns `false` when the timer was already idle.
    pub fn pause(&self) -> bool {
        let mut timer = self.inner.timer.lock().expect("timer poisoned");
        let paused = timer.pause();
        self.inner.cancel_ticker();
        if paused {
            log::info!(
                "timer paused phase={:?} remaining={}",
                timer.phase(),
                timer.remaining()
            );
        }
        paused
    }

    /// Start/pause button. Returns whether the timer is now running.
    pub fn toggle(&self) -> bool {
        if self.snapshot().is_running() {
            self.pause();
            false
        } else {
            self.start();
            true
        }
    }

    pub fn reset(&self) {
        let settings = self.inner.store.state().pomodoro_settings.clone();
        let mut timer = self.inner.timer.lock().expect("timer poisoned");
        timer.reset(&settings);
        self.inner.cancel_ticker();
        log::info!("timer reset remaining={}", timer.remaining());
    }

    pub fn set_sound_enabled(&self, enabled: bool) {
        self.inner
            .timer
            .lock()
            .expect("timer poisoned")
            .set_sound_enabled(enabled);
    }
}

impl Drop for TimerDriver {
    fn drop(&mut self) {
        self.inner.cancel_ticker();
    }
}

impl DriverInner {
    fn cancel_ticker(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self.ticker.lock().expect("ticker poisoned").take() {
            handle.abort();
        }
    }

    /// Feeds `seconds` of elapsed time into the timer. Returns `false` once this ticker has
    /// nothing left to do.
    fn process_tick(&self, generation: u64, seconds: u64) -> bool {
        let settings = self.store.state().pomodoro_settings.clone();
        let (event, ring) = {
            let mut timer = self.timer.lock().expect("timer poisoned");
            if self.generation.load(Ordering::SeqCst) != generation || !timer.is_running() {
                log::debug!("stale timer tick dropped generation={generation}");
                return false;
            }
            match timer.advance(seconds, &settings) {
                Some(change) => (TimerEvent::PhaseCompleted(change), timer.sound_enabled()),
                None => (
                    TimerEvent::Tick {
                        remaining: timer.remaining(),
                    },
                    false,
                ),
            }
        };
        let _ = self.events.send(event);

        let TimerEvent::PhaseCompleted(change) = event else {
            return true;
        };
        log::info!(
            "phase completed finished={:?} next={:?} sessions={}",
            change.finished,
            change.next,
            change.session_count
        );
        if ring {
            if let Err(error) = self.chime.play() {
                log::warn!("phase chime failed: {error}");
            }
        }
        false
    }
}

async fn run_ticks(inner: Arc<DriverInner>, generation: u64) {
    let mut interval = tokio::time::interval_at(Instant::now() + TICK, TICK);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last = Instant::now();
    let mut carry = Duration::ZERO;
    loop {
        interval.tick().await;
        let now = Instant::now();
        carry += now.saturating_duration_since(last);
        last = now;
        // Missed ticks are skipped; the whole seconds that passed are applied in one step.
        let seconds = carry.as_secs();
        if seconds == 0 {
            continue;
        }
        carry -= Duration::from_secs(seconds);
        if !inner.process_tick(generation, seconds) {
            break;
        }
    }
}

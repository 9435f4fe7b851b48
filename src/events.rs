use serde::Serialize;

use crate::timer::PhaseChange;

pub const EVENT_TIMER_TICK: &str = "timer_tick";
pub const EVENT_PHASE_COMPLETED: &str = "phase_completed";

/// Published by the timer driver for timer views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimerEvent {
    Tick { remaining: i64 },
    PhaseCompleted(PhaseChange),
}

impl TimerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            TimerEvent::Tick { .. } => EVENT_TIMER_TICK,
            TimerEvent::PhaseCompleted(_) => EVENT_PHASE_COMPLETED,
        }
    }
}

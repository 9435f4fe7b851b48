//! Pomodoro phase machine.
//!
//! The timer is either idle or running and is always in one phase. Every time the remaining
//! time reaches zero the machine stops, counts a finished work session, and loads the next
//! phase: a long break once `long_break_interval` sessions have finished, otherwise a short
//! break, and work again after any break.
//!
//! The machine is pure state; the one-second driver lives in `scheduler`.

use serde::Serialize;

use crate::models::PomodoroSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Work,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub fn is_break(self) -> bool {
        !matches!(self, Phase::Work)
    }

    /// Configured length of this phase in seconds.
    pub fn duration(self, settings: &PomodoroSettings) -> i64 {
        match self {
            Phase::Work => settings.work_duration,
            Phase::ShortBreak => settings.break_duration,
            Phase::LongBreak => settings.long_break_duration,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PhaseChange {
    pub finished: Phase,
    pub next: Phase,
    /// Work sessions counted toward the next long break, after this change.
    pub session_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PomodoroTimer {
    remaining: i64,
    running: bool,
    phase: Phase,
    session_count: u32,
    sound_enabled: bool,
}

impl PomodoroTimer {
    pub fn new(settings: &PomodoroSettings) -> Self {
        Self {
            remaining: settings.work_duration,
            running: false,
            phase: Phase::Work,
            session_count: 0,
            sound_enabled: true,
        }
    }

    pub fn remaining(&self) -> i64 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn session_count(&self) -> u32 {
        self.session_count
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.sound_enabled = enabled;
    }

    /// Returns `false` when already running.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        true
    }

    /// Stops counting down and keeps the remaining time. Returns `false` when already idle.
    pub fn pause(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        true
    }

    /// Start/pause button behavior. Returns whether the timer is now running.
    pub fn toggle(&mut self) -> bool {
        if self.running {
            self.pause();
        } else {
            self.start();
        }
        self.running
    }

    pub fn reset(&mut self, settings: &PomodoroSettings) {
        self.running = false;
        self.phase = Phase::Work;
        self.session_count = 0;
        self.remaining = settings.work_duration;
    }

    pub fn tick(&mut self, settings: &PomodoroSettings) -> Option<PhaseChange> {
        self.advance(1, settings)
    }

    /// Applies `seconds` of elapsed time in one step. Time beyond the end of the current phase
    /// is dropped, so a late catch-up produces exactly one phase change.
    pub fn advance(&mut self, seconds: u64, settings: &PomodoroSettings) -> Option<PhaseChange> {
        if !self.running || seconds == 0 {
            return None;
        }
        let step = i64::try_from(seconds).unwrap_or(i64::MAX);
        self.remaining = self.remaining.saturating_sub(step);
        if self.remaining > 0 {
            return None;
        }
        Some(self.finish_phase(settings))
    }

    /// Fraction of the current phase still to go, in `0.0..=1.0`.
    pub fn progress(&self, settings: &PomodoroSettings) -> f64 {
        let total = self.phase.duration(settings);
        if total <= 0 {
            return 0.0;
        }
        (self.remaining as f64 / total as f64).clamp(0.0, 1.0)
    }

    fn finish_phase(&mut self, settings: &PomodoroSettings) -> PhaseChange {
        self.running = false;
        let finished = self.phase;
        let next = match finished {
            Phase::Work => {
                self.session_count += 1;
                if i64::from(self.session_count) >= settings.long_break_interval {
                    self.session_count = 0;
                    Phase::LongBreak
                } else {
                    Phase::ShortBreak
                }
            }
            Phase::ShortBreak | Phase::LongBreak => Phase::Work,
        };
        self.phase = next;
        self.remaining = next.duration(settings);
        PhaseChange {
            finished,
            next,
            session_count: self.session_count,
        }
    }
}

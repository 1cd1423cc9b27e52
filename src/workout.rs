use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Timing discipline for a workout block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
pub enum TimerMode {
    /// `rounds` work intervals with rest between consecutive intervals.
    Interval,
    /// Same loop as `Interval`; conventionally 20s/10s x 8.
    Tabata,
    /// Every minute on the minute: `rounds` fixed 60s intervals.
    Emom,
    /// One continuous interval of `work_secs`, counting up by default.
    Amrap,
    /// One continuous interval of `work_secs`, counting down by default.
    TimeCap,
    /// Counts up from zero until explicitly stopped.
    Stopwatch,
    /// No timing at all; the screen just shows the exercises.
    NoTimer,
}

impl TimerMode {
    /// Modes that run a multi-interval round loop.
    pub fn is_rounds_based(&self) -> bool {
        matches!(self, TimerMode::Interval | TimerMode::Tabata | TimerMode::Emom)
    }

    /// Modes that run a single fixed-length interval.
    pub fn is_single_interval(&self) -> bool {
        matches!(self, TimerMode::Amrap | TimerMode::TimeCap)
    }

    pub fn requires_exercises(&self) -> bool {
        !matches!(self, TimerMode::Stopwatch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
pub enum Direction {
    Up,
    Down,
}

/// Declarative timing settings for one workout block.
///
/// Immutable input to an `IntervalClock`; validated before the clock can
/// start. Times are whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimerSettings {
    pub mode: TimerMode,
    pub work_secs: u32,
    pub rest_secs: u32,
    pub rounds: u32,
    pub prepare_secs: u32,
    pub direction: Direction,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            mode: TimerMode::Interval,
            work_secs: 30,
            rest_secs: 15,
            rounds: 3,
            prepare_secs: 10,
            direction: Direction::Down,
        }
    }
}

/// Invalid configuration caught at setup time, before `start()` is callable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("{0} requires at least one round")]
    ZeroRounds(TimerMode),
    #[error("{0} requires a non-zero work time")]
    ZeroWorkTime(TimerMode),
    #[error("{0} requires at least one exercise")]
    NoExercises(TimerMode),
}

/// A workout block: timing settings plus the ordered exercise list.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutPlan {
    pub settings: TimerSettings,
    pub exercises: Vec<String>,
}

impl WorkoutPlan {
    pub fn new(settings: TimerSettings, exercises: Vec<String>) -> Self {
        Self {
            settings,
            exercises,
        }
    }

    /// Number of work intervals the clock will run.
    pub fn interval_count(&self) -> u32 {
        match self.settings.mode {
            m if m.is_rounds_based() => self.settings.rounds,
            TimerMode::NoTimer => 0,
            _ => 1,
        }
    }

    /// Length of one work interval in seconds.
    pub fn work_interval_secs(&self) -> u32 {
        match self.settings.mode {
            TimerMode::Emom => 60,
            _ => self.settings.work_secs,
        }
    }

    /// Reject configurations the clock cannot meaningfully run.
    pub fn validate(&self) -> Result<(), SetupError> {
        let s = &self.settings;
        if s.mode.is_rounds_based() && s.rounds == 0 {
            return Err(SetupError::ZeroRounds(s.mode));
        }
        let needs_work_time =
            matches!(s.mode, TimerMode::Interval | TimerMode::Tabata) || s.mode.is_single_interval();
        if needs_work_time && s.work_secs == 0 {
            return Err(SetupError::ZeroWorkTime(s.mode));
        }
        if s.mode.requires_exercises() && self.exercises.is_empty() {
            return Err(SetupError::NoExercises(s.mode));
        }
        Ok(())
    }
}

use crate::workout::{Direction, TimerMode, WorkoutPlan};

const EPS: f64 = 1e-9;

/// How many trailing whole seconds of a phase get an audible countdown tick.
pub const COUNTDOWN_CUE_SECS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ClockStatus {
    Idle,
    Preparing,
    Running,
    Resting,
    Paused,
    Finished,
}

impl ClockStatus {
    /// True while the tick function advances time.
    pub fn is_ticking(&self) -> bool {
        matches!(
            self,
            ClockStatus::Preparing | ClockStatus::Running | ClockStatus::Resting
        )
    }
}

/// Boundary crossings the clock signals so the UI layer can sound cues.
/// The clock decides when; the sink decides how.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    IntervalStart,
    RestStart,
    /// Fired once for each of the last whole seconds of a finite phase.
    CountdownTick(u32),
    Finish,
}

/// Read-only snapshot of the clock, taken once per render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockState {
    pub status: ClockStatus,
    /// Seconds shown for the current phase; direction-aware.
    pub current_time: f64,
    pub phase_length: f64,
    /// 0-based index of the current work interval.
    pub current_round: u32,
    pub current_exercise: usize,
    pub laps_completed: u32,
    /// Running + resting time in seconds; excludes the prepare lead-in.
    pub total_elapsed: f64,
}

/// Finite-state interval clock.
///
/// Converts a workout block's declarative settings into a tick-by-tick
/// countdown. The clock never reads wall time: the driver calls
/// `tick(delta_secs)` at whatever resolution it renders at, and a tick that
/// overshoots a phase boundary carries its remainder into the next phase so
/// total durations stay exact.
///
/// Lead-in policy: after Preparing the clock always enters Running first;
/// Resting only ever occurs between two work intervals.
#[derive(Debug)]
pub struct IntervalClock {
    plan: WorkoutPlan,
    status: ClockStatus,
    resume_status: ClockStatus,
    /// Seconds left in the current finite phase. Unused while a Stopwatch runs.
    remaining: f64,
    phase_length: f64,
    intervals_done: u32,
    round_index: u32,
    exercise_index: usize,
    laps_completed: u32,
    total_elapsed: f64,
    cues: Vec<Cue>,
    finish_emitted: bool,
}

impl IntervalClock {
    pub fn new(plan: WorkoutPlan) -> Self {
        Self {
            plan,
            status: ClockStatus::Idle,
            resume_status: ClockStatus::Idle,
            remaining: 0.0,
            phase_length: 0.0,
            intervals_done: 0,
            round_index: 0,
            exercise_index: 0,
            laps_completed: 0,
            total_elapsed: 0.0,
            cues: Vec::new(),
            finish_emitted: false,
        }
    }

    pub fn plan(&self) -> &WorkoutPlan {
        &self.plan
    }

    pub fn status(&self) -> ClockStatus {
        self.status
    }

    /// Whether `start()` would do anything. The UI disables the start action
    /// when this is false rather than surfacing a runtime error.
    pub fn can_start(&self) -> bool {
        self.status == ClockStatus::Idle
            && self.plan.settings.mode != TimerMode::NoTimer
            && self.plan.validate().is_ok()
    }

    /// Idle -> Preparing (or straight into the first interval when there is
    /// no lead-in). No-op unless `can_start()`.
    pub fn start(&mut self) {
        if !self.can_start() {
            return;
        }
        if self.plan.settings.prepare_secs > 0 {
            self.status = ClockStatus::Preparing;
            self.phase_length = f64::from(self.plan.settings.prepare_secs);
            self.remaining = self.phase_length;
        } else {
            self.begin_interval();
        }
    }

    /// Freezes the tick without resetting elapsed counters.
    pub fn pause(&mut self) {
        if self.status.is_ticking() {
            self.resume_status = self.status;
            self.status = ClockStatus::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.status == ClockStatus::Paused {
            self.status = self.resume_status;
        }
    }

    /// Back to Idle with all counters zeroed.
    pub fn reset(&mut self) {
        let plan = self.plan.clone();
        *self = Self::new(plan);
    }

    /// Terminal stop for a run in flight; the only way a Stopwatch finishes.
    pub fn stop(&mut self) {
        if self.status.is_ticking() || self.status == ClockStatus::Paused {
            self.finish();
        }
    }

    /// Advances the clock by `dt` seconds. All state transitions happen
    /// synchronously in here or in the explicit calls above, never both at
    /// once: the caller is a single event-loop thread.
    pub fn tick(&mut self, dt: f64) {
        let mut dt = dt;
        while dt > EPS && self.status.is_ticking() {
            if self.status == ClockStatus::Running
                && self.plan.settings.mode == TimerMode::Stopwatch
            {
                self.total_elapsed += dt;
                return;
            }
            let step = dt.min(self.remaining);
            let before = self.remaining;
            self.remaining -= step;
            if self.status != ClockStatus::Preparing {
                self.total_elapsed += step;
            }
            self.emit_countdown_cues(before, self.remaining);
            dt -= step;
            if self.remaining <= EPS {
                self.advance_phase();
            }
        }
    }

    /// Drains the cues signalled since the last call.
    pub fn take_cues(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.cues)
    }

    pub fn state(&self) -> ClockState {
        ClockState {
            status: self.status,
            current_time: self.display_time(),
            phase_length: self.phase_length,
            current_round: self.round_index,
            current_exercise: self.exercise_index,
            laps_completed: self.laps_completed,
            total_elapsed: self.total_elapsed,
        }
    }

    fn display_time(&self) -> f64 {
        let shown_status = if self.status == ClockStatus::Paused {
            self.resume_status
        } else {
            self.status
        };
        match shown_status {
            ClockStatus::Running => match self.plan.settings.mode {
                TimerMode::Stopwatch => self.total_elapsed,
                _ => match self.plan.settings.direction {
                    Direction::Down => self.remaining,
                    Direction::Up => self.phase_length - self.remaining,
                },
            },
            // Prepare and rest always count down
            ClockStatus::Preparing | ClockStatus::Resting => self.remaining,
            ClockStatus::Finished => self.total_elapsed,
            _ => 0.0,
        }
    }

    fn emit_countdown_cues(&mut self, before: f64, after: f64) {
        let hi = (before - EPS).ceil() as i64;
        let lo = (after - EPS).ceil() as i64;
        for s in ((lo + 1)..=hi).rev() {
            if s >= 1 && s <= i64::from(COUNTDOWN_CUE_SECS) {
                self.cues.push(Cue::CountdownTick(s as u32));
            }
        }
    }

    fn begin_interval(&mut self) {
        let exercise_count = self.plan.exercises.len().max(1);
        self.status = ClockStatus::Running;
        self.round_index = self.intervals_done;
        self.exercise_index = self.intervals_done as usize % exercise_count;
        self.phase_length = f64::from(self.plan.work_interval_secs());
        self.remaining = self.phase_length;
        self.cues.push(Cue::IntervalStart);
    }

    fn advance_phase(&mut self) {
        match self.status {
            ClockStatus::Preparing => self.begin_interval(),
            ClockStatus::Running => self.finish_interval(),
            ClockStatus::Resting => self.begin_interval(),
            _ => {}
        }
    }

    fn finish_interval(&mut self) {
        let exercise_count = self.plan.exercises.len().max(1);
        self.intervals_done += 1;
        if self.intervals_done as usize % exercise_count == 0 {
            self.laps_completed += 1;
        }
        if self.intervals_done >= self.plan.interval_count() {
            self.finish();
        } else if self.plan.settings.rest_secs > 0
            && matches!(
                self.plan.settings.mode,
                TimerMode::Interval | TimerMode::Tabata
            )
        {
            self.status = ClockStatus::Resting;
            self.phase_length = f64::from(self.plan.settings.rest_secs);
            self.remaining = self.phase_length;
            self.cues.push(Cue::RestStart);
        } else {
            self.begin_interval();
        }
    }

    // Terminal; must signal exactly once per run.
    fn finish(&mut self) {
        self.status = ClockStatus::Finished;
        self.remaining = 0.0;
        if !self.finish_emitted {
            self.finish_emitted = true;
            self.cues.push(Cue::Finish);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workout::{Direction, TimerMode, TimerSettings};

    fn clock(settings: TimerSettings, exercises: &[&str]) -> IntervalClock {
        IntervalClock::new(WorkoutPlan::new(
            settings,
            exercises.iter().map(|e| e.to_string()).collect(),
        ))
    }

    fn interval_settings(rounds: u32, work: u32, rest: u32) -> TimerSettings {
        TimerSettings {
            mode: TimerMode::Interval,
            work_secs: work,
            rest_secs: rest,
            rounds,
            prepare_secs: 5,
            direction: Direction::Down,
        }
    }

    /// Drives whole-second ticks until Finished, returning tick count.
    fn run_to_finish(clock: &mut IntervalClock, max_ticks: u32) -> u32 {
        let mut ticks = 0;
        while clock.status() != ClockStatus::Finished {
            clock.tick(1.0);
            ticks += 1;
            assert!(ticks <= max_ticks, "clock never finished");
        }
        ticks
    }

    #[test]
    fn interval_total_running_duration() {
        // 3 rounds, 30s work, 15s rest -> 3*30 + 2*15 = 120s
        let mut c = clock(interval_settings(3, 30, 15), &["row"]);
        c.start();
        run_to_finish(&mut c, 1000);
        assert!((c.state().total_elapsed - 120.0).abs() < 1e-6);
    }

    #[test]
    fn interval_duration_formula_holds_across_configs() {
        for (rounds, work, rest) in [(1, 40, 20), (4, 20, 10), (8, 20, 0), (2, 45, 90)] {
            let mut c = clock(interval_settings(rounds, work, rest), &["a", "b"]);
            c.start();
            run_to_finish(&mut c, 10_000);
            let expected = f64::from(rounds * work + rounds.saturating_sub(1) * rest);
            assert!(
                (c.state().total_elapsed - expected).abs() < 1e-6,
                "{rounds}x{work}/{rest}: got {}",
                c.state().total_elapsed
            );
        }
    }

    #[test]
    fn prepare_time_is_excluded_from_total_elapsed() {
        let mut c = clock(interval_settings(1, 10, 0), &["squat"]);
        c.start();
        assert_eq!(c.status(), ClockStatus::Preparing);
        c.tick(5.0);
        assert_eq!(c.status(), ClockStatus::Running);
        assert!(c.state().total_elapsed.abs() < 1e-9);
    }

    #[test]
    fn running_always_follows_preparing() {
        // Even with rest configured, the lead-in goes straight to work.
        let mut c = clock(interval_settings(3, 30, 15), &["row"]);
        c.start();
        c.tick(5.0);
        assert_eq!(c.status(), ClockStatus::Running);
    }

    #[test]
    fn overshooting_tick_carries_into_next_phase() {
        let mut settings = interval_settings(2, 10, 5);
        settings.prepare_secs = 0;
        let mut c = clock(settings, &["ski"]);
        c.start();
        // 12s crosses the first work boundary and lands 2s into the rest
        c.tick(12.0);
        assert_eq!(c.status(), ClockStatus::Resting);
        assert!((c.state().current_time - 3.0).abs() < 1e-6);
        assert!((c.state().total_elapsed - 12.0).abs() < 1e-6);
    }

    #[test]
    fn exercise_index_wraps_and_laps_complete() {
        let mut settings = interval_settings(6, 10, 0);
        settings.prepare_secs = 0;
        let mut c = clock(settings, &["run", "row", "ski"]);
        c.start();
        let mut seen = vec![c.state().current_exercise];
        for _ in 0..5 {
            c.tick(10.0);
            if c.status() != ClockStatus::Finished {
                seen.push(c.state().current_exercise);
            }
        }
        assert_eq!(seen, vec![0, 1, 2, 0, 1, 2]);
        c.tick(10.0);
        assert_eq!(c.status(), ClockStatus::Finished);
        assert_eq!(c.state().laps_completed, 2);
    }

    #[test]
    fn emom_runs_exactly_n_minutes_with_n_interval_starts() {
        let settings = TimerSettings {
            mode: TimerMode::Emom,
            work_secs: 0, // ignored by Emom
            rest_secs: 15,
            rounds: 5,
            prepare_secs: 0,
            direction: Direction::Down,
        };
        let mut c = clock(settings, &["thrusters", "pullups"]);
        c.start();
        run_to_finish(&mut c, 10_000);
        assert!((c.state().total_elapsed - 300.0).abs() < 1e-6);
        let starts = c
            .take_cues()
            .into_iter()
            .filter(|cue| *cue == Cue::IntervalStart)
            .count();
        assert_eq!(starts, 5);
    }

    #[test]
    fn amrap_is_a_single_interval_with_count_up_display() {
        let settings = TimerSettings {
            mode: TimerMode::Amrap,
            work_secs: 600,
            rest_secs: 0,
            rounds: 7, // informational only
            prepare_secs: 0,
            direction: Direction::Up,
        };
        let mut c = clock(settings, &["wall balls"]);
        c.start();
        c.tick(90.0);
        assert_eq!(c.status(), ClockStatus::Running);
        assert!((c.state().current_time - 90.0).abs() < 1e-6);
        c.tick(510.0);
        assert_eq!(c.status(), ClockStatus::Finished);
        assert_eq!(c.state().current_round, 0);
    }

    #[test]
    fn time_cap_counts_down() {
        let settings = TimerSettings {
            mode: TimerMode::TimeCap,
            work_secs: 300,
            rest_secs: 0,
            rounds: 1,
            prepare_secs: 0,
            direction: Direction::Down,
        };
        let mut c = clock(settings, &["deadlifts"]);
        c.start();
        c.tick(60.0);
        assert!((c.state().current_time - 240.0).abs() < 1e-6);
    }

    #[test]
    fn stopwatch_counts_up_until_stopped() {
        let settings = TimerSettings {
            mode: TimerMode::Stopwatch,
            work_secs: 0,
            rest_secs: 0,
            rounds: 0,
            prepare_secs: 0,
            direction: Direction::Down,
        };
        let mut c = clock(settings, &[]);
        c.start();
        c.tick(3600.0);
        assert_eq!(c.status(), ClockStatus::Running);
        assert!((c.state().current_time - 3600.0).abs() < 1e-6);
        c.stop();
        assert_eq!(c.status(), ClockStatus::Finished);
        // stop() on a finished clock stays put and emits nothing further
        c.take_cues();
        c.stop();
        assert!(c.take_cues().is_empty());
    }

    #[test]
    fn no_timer_is_inert() {
        let settings = TimerSettings {
            mode: TimerMode::NoTimer,
            ..TimerSettings::default()
        };
        let mut c = clock(settings, &["mobility"]);
        assert!(!c.can_start());
        c.start();
        assert_eq!(c.status(), ClockStatus::Idle);
        c.tick(10.0);
        assert_eq!(c.status(), ClockStatus::Idle);
    }

    #[test]
    fn start_rejected_for_invalid_plan() {
        let mut c = clock(interval_settings(0, 30, 15), &["row"]);
        assert!(!c.can_start());
        c.start();
        assert_eq!(c.status(), ClockStatus::Idle);
    }

    #[test]
    fn pause_freezes_and_resume_continues() {
        let mut settings = interval_settings(1, 30, 0);
        settings.prepare_secs = 0;
        let mut c = clock(settings, &["bike"]);
        c.start();
        c.tick(10.0);
        c.pause();
        assert_eq!(c.status(), ClockStatus::Paused);
        let frozen = c.state().current_time;
        c.tick(100.0);
        assert_eq!(c.state().current_time, frozen);
        c.resume();
        assert_eq!(c.status(), ClockStatus::Running);
        c.tick(5.0);
        assert!((c.state().current_time - 15.0).abs() < 1e-6);
    }

    #[test]
    fn reset_returns_to_idle_and_zeroes_counters() {
        let mut c = clock(interval_settings(3, 30, 15), &["row"]);
        c.start();
        c.tick(40.0);
        c.reset();
        let state = c.state();
        assert_eq!(state.status, ClockStatus::Idle);
        assert_eq!(state.total_elapsed, 0.0);
        assert_eq!(state.current_round, 0);
        assert!(c.can_start());
    }

    #[test]
    fn finish_cue_fires_exactly_once() {
        let mut settings = interval_settings(1, 5, 0);
        settings.prepare_secs = 0;
        let mut c = clock(settings, &["row"]);
        c.start();
        c.tick(5.0);
        c.tick(1.0);
        c.stop();
        let finishes = c
            .take_cues()
            .into_iter()
            .filter(|cue| *cue == Cue::Finish)
            .count();
        assert_eq!(finishes, 1);
    }

    #[test]
    fn countdown_cues_cover_the_last_three_seconds() {
        let mut settings = interval_settings(1, 10, 0);
        settings.prepare_secs = 0;
        let mut c = clock(settings, &["row"]);
        c.start();
        c.take_cues();
        for _ in 0..10 {
            c.tick(1.0);
        }
        let ticks: Vec<u32> = c
            .take_cues()
            .into_iter()
            .filter_map(|cue| match cue {
                Cue::CountdownTick(s) => Some(s),
                _ => None,
            })
            .collect();
        assert_eq!(ticks, vec![3, 2, 1]);
    }

    #[test]
    fn countdown_cues_survive_coarse_ticks() {
        let mut settings = interval_settings(1, 10, 0);
        settings.prepare_secs = 0;
        let mut c = clock(settings, &["row"]);
        c.start();
        c.take_cues();
        c.tick(10.0);
        let ticks: Vec<u32> = c
            .take_cues()
            .into_iter()
            .filter_map(|cue| match cue {
                Cue::CountdownTick(s) => Some(s),
                _ => None,
            })
            .collect();
        assert_eq!(ticks, vec![3, 2, 1]);
    }
}

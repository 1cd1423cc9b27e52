use crate::celebration::FinishCelebration;
use crate::clock::{ClockStatus, Cue, IntervalClock};
use crate::finish::FinishCoordinator;
use crate::race::RaceScheduler;
use crate::results::{ResultsDb, WorkoutResult};
use crate::workout::WorkoutPlan;

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Workout,
    Results,
}

/// Race-specific state: the scheduler plus the one-shot completion latch.
#[derive(Debug)]
pub struct RaceState {
    pub scheduler: RaceScheduler,
    pub coordinator: FinishCoordinator,
    pub complete: bool,
}

impl RaceState {
    pub fn new(groups: Vec<(String, Vec<String>)>, start_interval_secs: u32) -> Self {
        Self {
            scheduler: RaceScheduler::new(groups, start_interval_secs),
            coordinator: FinishCoordinator::unarmed(),
            complete: false,
        }
    }
}

/// Top-level application state, advanced one event at a time by the runner.
pub struct App {
    pub clock: IntervalClock,
    pub race: Option<RaceState>,
    pub celebration: FinishCelebration,
    pub results_db: Option<ResultsDb>,
    pub state: AppState,
    /// Blocking message for a rejected action; cleared by the next key.
    pub notice: Option<String>,
    pub selected_participant: usize,
    pub recent: Vec<WorkoutResult>,
    result_recorded: bool,
}

impl App {
    pub fn new(
        plan: WorkoutPlan,
        race: Option<RaceState>,
        results_db: Option<ResultsDb>,
    ) -> Self {
        Self {
            clock: IntervalClock::new(plan),
            race,
            celebration: FinishCelebration::new(),
            results_db,
            state: AppState::Workout,
            notice: None,
            selected_participant: 0,
            recent: Vec::new(),
            result_recorded: false,
        }
    }

    pub fn is_race(&self) -> bool {
        self.race.is_some()
    }

    /// Advances the whole app by one tick. Returns the cues to sound.
    pub fn on_tick(&mut self, dt: f64, terminal_width: u16, terminal_height: u16) -> Vec<Cue> {
        self.clock.tick(dt);
        let mut cues = self.clock.take_cues();

        let mut race_just_completed = false;
        if let Some(race) = &mut self.race {
            race.scheduler.observe(self.clock.state().total_elapsed);
            if race.coordinator.evaluate(race.scheduler.finished_flags()) {
                race.complete = true;
                race_just_completed = true;
            }
        } else if self.clock.status() == ClockStatus::Finished {
            self.finish_workout();
        }

        if race_just_completed {
            self.clock.stop();
            cues.extend(self.clock.take_cues());
            self.celebration.start(terminal_width, terminal_height);
            self.persist_race();
            self.notice = Some("race complete".to_string());
        }

        self.celebration.update(dt);
        cues
    }

    /// Space bar: start, pause, or resume depending on where the clock is.
    pub fn toggle_start_pause(&mut self) {
        match self.clock.status() {
            ClockStatus::Idle => {
                if self.clock.can_start() {
                    self.clock.start();
                } else if let Err(e) = self.clock.plan().validate() {
                    self.notice = Some(e.to_string());
                }
            }
            ClockStatus::Paused => self.clock.resume(),
            ClockStatus::Finished => {}
            _ => self.clock.pause(),
        }
    }

    pub fn stop(&mut self) {
        self.clock.stop();
        if self.race.is_none() {
            self.finish_workout();
        }
    }

    /// Full reset: clock to Idle, race offsets and finishes cleared, latch
    /// rearmed for the next run.
    pub fn reset(&mut self) {
        self.clock.reset();
        if let Some(race) = &mut self.race {
            race.scheduler.reset();
            race.coordinator = FinishCoordinator::unarmed();
            race.complete = false;
        }
        self.celebration = FinishCelebration::new();
        self.state = AppState::Workout;
        self.notice = None;
        self.selected_participant = 0;
        self.result_recorded = false;
    }

    pub fn select_next_participant(&mut self) {
        if let Some(race) = &self.race {
            let count = race.scheduler.participant_count();
            if count > 0 {
                self.selected_participant = (self.selected_participant + 1) % count;
            }
        }
    }

    pub fn select_prev_participant(&mut self) {
        if let Some(race) = &self.race {
            let count = race.scheduler.participant_count();
            if count > 0 {
                self.selected_participant = (self.selected_participant + count - 1) % count;
            }
        }
    }

    fn selected_name(&self) -> Option<String> {
        let race = self.race.as_ref()?;
        race.scheduler
            .participants()
            .nth(self.selected_participant)
            .map(|(_, name)| name.to_string())
    }

    /// Marks the selected participant finished at the current race time.
    /// Rejections surface as a notice, never as a crash.
    pub fn mark_selected_finished(&mut self) {
        let Some(name) = self.selected_name() else {
            return;
        };
        let elapsed = self.clock.state().total_elapsed;
        if self.clock.status() == ClockStatus::Idle {
            self.notice = Some("race has not started".to_string());
            return;
        }
        if let Some(race) = &mut self.race {
            if let Err(e) = race.scheduler.mark_finished(&name, elapsed) {
                self.notice = Some(e.to_string());
            }
        }
    }

    /// No-op when the selected participant is not marked finished.
    pub fn undo_selected_finish(&mut self) {
        let Some(name) = self.selected_name() else {
            return;
        };
        if let Some(race) = &mut self.race {
            race.scheduler.undo_finish(&name);
        }
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    // One result row per completed run, guarded against re-entry from
    // repeated ticks in the Finished state.
    fn finish_workout(&mut self) {
        if self.result_recorded || self.clock.status() != ClockStatus::Finished {
            return;
        }
        self.result_recorded = true;
        let result = WorkoutResult::from_run(
            &self.clock.plan().settings,
            self.clock.state().total_elapsed,
        );
        if let Some(db) = &self.results_db {
            if db.record_workout(&result).is_err() {
                self.notice = Some("could not save result".to_string());
            }
            self.recent = db.recent_workouts(10).unwrap_or_default();
        }
        self.state = AppState::Results;
    }

    fn persist_race(&mut self) {
        let Some(race) = &self.race else { return };
        if let Some(db) = &mut self.results_db {
            let group_names: Vec<String> = race
                .scheduler
                .groups()
                .iter()
                .map(|g| g.name.clone())
                .collect();
            if db
                .record_race(&group_names, race.scheduler.finishes())
                .is_err()
            {
                self.notice = Some("could not save race results".to_string());
            }
        }
    }
}
